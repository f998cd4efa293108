//! Property-based invariant tests for locale tables.
//!
//! 1. A counted template is accepted iff it carries exactly one `%s`.
//! 2. Rendering replaces the marker with the count and nothing else.
//! 3. Counts up to one select the singular form, larger counts the plural.
//! 4. Tables of any length other than eight are rejected.

use proptest::prelude::*;
use reltime_i18n::{Bucket, BucketTemplate, I18nError, LocaleContext, LocaleTable, TableDefect};

fn words() -> impl Strategy<Value = String> {
    "[a-zA-Z ]{0,12}"
}

fn table_with(bucket: Bucket, template: BucketTemplate) -> Vec<BucketTemplate> {
    let mut templates: Vec<BucketTemplate> = vec![
        "now".into(),
        "%s s".into(),
        "%s m".into(),
        "%s h".into(),
        "%s d".into(),
        "%s w".into(),
        "%s mo".into(),
        "%s y".into(),
    ];
    templates[bucket.index()] = template;
    templates
}

fn counted_bucket() -> impl Strategy<Value = Bucket> {
    (1usize..8).prop_map(|i| Bucket::ALL[i])
}

proptest! {
    #[test]
    fn placeholder_count_decides_validity(
        bucket in counted_bucket(),
        parts in proptest::collection::vec(words(), 1..4),
    ) {
        let template = parts.join("%s");
        let markers = parts.len() - 1;
        let result = LocaleTable::new(table_with(bucket, BucketTemplate::single(template)));
        match markers {
            1 => prop_assert!(result.is_ok()),
            0 => prop_assert_eq!(
                result.unwrap_err(),
                I18nError::from(TableDefect::MissingPlaceholder(bucket))
            ),
            _ => prop_assert_eq!(
                result.unwrap_err(),
                I18nError::from(TableDefect::ExtraPlaceholder(bucket))
            ),
        }
    }

    #[test]
    fn render_substitutes_count(
        prefix in words(),
        suffix in words(),
        count in 0i64..1_000_000,
    ) {
        let t = BucketTemplate::single(format!("{prefix}%s{suffix}"));
        prop_assert_eq!(t.render(count), format!("{prefix}{count}{suffix}"));
    }

    #[test]
    fn singular_plural_boundary(count in -5i64..1000) {
        let t = BucketTemplate::pair("one %s", "many %s");
        let expected = if count <= 1 { "one" } else { "many" };
        prop_assert!(t.render(count).starts_with(expected));
    }

    #[test]
    fn wrong_length_rejected(len in 0usize..20) {
        prop_assume!(len != 8);
        let templates: Vec<BucketTemplate> = (0..len).map(|_| "%s".into()).collect();
        let mut ctx = LocaleContext::new();
        let err = ctx.register("xx", templates).unwrap_err();
        prop_assert_eq!(
            err,
            I18nError::InvalidTable {
                locale: Some("xx".into()),
                defect: TableDefect::WrongBucketCount(len),
            }
        );
        prop_assert!(!ctx.contains("xx"));
    }
}
