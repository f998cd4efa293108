//! Built-in English table, registered by [`LocaleContext::new`](crate::LocaleContext::new).

use crate::table::{BucketTemplate, LocaleTable};

/// Id under which the built-in table is registered.
pub const DEFAULT_LOCALE: &str = "en_US";

/// The built-in English table.
#[must_use]
pub fn english() -> LocaleTable {
    LocaleTable {
        buckets: [
            BucketTemplate::single("just now"),
            BucketTemplate::pair("%s second ago", "%s seconds ago"),
            BucketTemplate::pair("%s minute ago", "%s minutes ago"),
            BucketTemplate::pair("%s hour ago", "%s hours ago"),
            BucketTemplate::pair("%s day ago", "%s days ago"),
            BucketTemplate::pair("%s week ago", "%s weeks ago"),
            BucketTemplate::pair("%s month ago", "%s months ago"),
            BucketTemplate::pair("%s year ago", "%s years ago"),
        ],
    }
}
