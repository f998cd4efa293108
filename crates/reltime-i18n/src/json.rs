//! JSON locale documents.
//!
//! A document is an object mapping locale ids to eight-entry arrays. Each
//! entry is either a string or a `[singular, plural]` pair:
//!
//! ```json
//! { "en_US": ["just now", ["%s second ago", "%s seconds ago"], ...] }
//! ```
//!
//! Shape errors are reported at load time with the offending locale id.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::context::LocaleContext;
use crate::table::{Bucket, BucketTemplate, I18nError, LocaleTable, TableDefect};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTemplate {
    Single(String),
    Forms(Vec<String>),
}

impl RawTemplate {
    fn into_template(self, bucket: Bucket) -> Result<BucketTemplate, TableDefect> {
        match self {
            Self::Single(s) => Ok(BucketTemplate::Single(s)),
            Self::Forms(forms) => {
                let found = forms.len();
                let [singular, plural]: [String; 2] = forms
                    .try_into()
                    .map_err(|_| TableDefect::WrongArity { bucket, found })?;
                Ok(BucketTemplate::Pair { singular, plural })
            }
        }
    }
}

fn build_table(raw: Vec<RawTemplate>) -> Result<LocaleTable, I18nError> {
    if raw.len() != Bucket::ALL.len() {
        return Err(TableDefect::WrongBucketCount(raw.len()).into());
    }
    let templates = Bucket::ALL
        .into_iter()
        .zip(raw)
        .map(|(bucket, t)| t.into_template(bucket))
        .collect::<Result<Vec<_>, _>>()?;
    LocaleTable::new(templates)
}

/// Parse every table in a JSON document, sorted by locale id.
pub fn tables_from_json(json: &str) -> Result<Vec<(String, LocaleTable)>, I18nError> {
    let doc: BTreeMap<String, Vec<RawTemplate>> =
        serde_json::from_str(json).map_err(|e| I18nError::Parse(e.to_string()))?;
    doc.into_iter()
        .map(|(id, raw)| {
            let table = build_table(raw).map_err(|e| e.for_locale(&id))?;
            Ok((id, table))
        })
        .collect()
}

impl LocaleContext {
    /// Register every table in a JSON document.
    ///
    /// The document is validated as a whole before anything is registered.
    pub fn extend_from_json(&mut self, json: &str) -> Result<usize, I18nError> {
        let tables = tables_from_json(json)?;
        let n = tables.len();
        for (id, table) in tables {
            self.add_locale(id, table);
        }
        Ok(n)
    }

    /// Build a context from a JSON document alone (no built-in table).
    pub fn from_json(json: &str, current: impl Into<String>) -> Result<Self, I18nError> {
        Self::with_locales(tables_from_json(json)?, current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "en_US": [
            "just now",
            ["%s second ago", "%s seconds ago"],
            ["%s minute ago", "%s minutes ago"],
            ["%s hour ago", "%s hours ago"],
            ["%s day ago", "%s days ago"],
            ["%s week ago", "%s weeks ago"],
            ["%s month ago", "%s months ago"],
            ["%s year ago", "%s years ago"]
        ],
        "ja_JP": [
            "たった今",
            "%s 秒前",
            "%s 分前",
            "%s 時間前",
            "%s 日前",
            "%s 週間前",
            "%s ヶ月前",
            "%s 年前"
        ]
    }"#;

    #[test]
    fn parses_mixed_entries() {
        let tables = tables_from_json(DOC).unwrap();
        let ids: Vec<&str> = tables.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["en_US", "ja_JP"]);
        assert_eq!(tables[1].1.render(Bucket::Hours, 2), "2 時間前");
    }

    #[test]
    fn from_json_selects_current() {
        let ctx = LocaleContext::from_json(DOC, "ja_JP").unwrap();
        assert_eq!(ctx.current_table().unwrap().just_now(), "たった今");
    }

    #[test]
    fn empty_document_rejected() {
        assert_eq!(
            LocaleContext::from_json("{}", "en_US").unwrap_err(),
            I18nError::EmptyRegistry
        );
    }

    #[test]
    fn triple_forms_rejected() {
        let doc = r#"{ "xx": ["now", ["%s", "%s", "%s"], "%s", "%s", "%s", "%s", "%s", "%s"] }"#;
        assert_eq!(
            tables_from_json(doc).unwrap_err(),
            I18nError::InvalidTable {
                locale: Some("xx".into()),
                defect: TableDefect::WrongArity {
                    bucket: Bucket::Seconds,
                    found: 3,
                },
            }
        );
    }

    #[test]
    fn single_form_list_rejected() {
        let doc = r#"{ "xx": ["now", "%s s", ["%s m"], "%s h", "%s d", "%s w", "%s mo", "%s y"] }"#;
        assert_eq!(
            tables_from_json(doc).unwrap_err(),
            I18nError::InvalidTable {
                locale: Some("xx".into()),
                defect: TableDefect::WrongArity {
                    bucket: Bucket::Minutes,
                    found: 1,
                },
            }
        );
    }

    #[test]
    fn plural_just_now_rejected() {
        let doc = r#"{ "xx": [["now", "now"], "%s s", "%s m", "%s h", "%s d", "%s w", "%s mo", "%s y"] }"#;
        assert_eq!(
            tables_from_json(doc).unwrap_err(),
            I18nError::InvalidTable {
                locale: Some("xx".into()),
                defect: TableDefect::PluralJustNow,
            }
        );
    }

    #[test]
    fn short_document_rejected() {
        let doc = r#"{ "xx": ["now", "%s s"] }"#;
        assert_eq!(
            tables_from_json(doc).unwrap_err(),
            I18nError::InvalidTable {
                locale: Some("xx".into()),
                defect: TableDefect::WrongBucketCount(2),
            }
        );
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            tables_from_json("[1, 2"),
            Err(I18nError::Parse(_))
        ));
    }

    #[test]
    fn extend_keeps_builtin() {
        let mut ctx = LocaleContext::new();
        assert_eq!(ctx.extend_from_json(DOC).unwrap(), 2);
        assert!(ctx.contains("ja_JP"));
        assert_eq!(ctx.current_locale(), "en_US");
    }
}
