//! Registered locale tables plus the current locale selection.
//!
//! A [`LocaleContext`] is passed explicitly to whoever formats phrases;
//! there is no process-wide registry.
//!
//! # Invariants
//!
//! 1. **Whole-table publication**: [`LocaleContext::add_locale`] inserts a
//!    fully validated table in a single map insert. A reader never observes
//!    a partially registered locale.
//!
//! 2. **No silent defaulting**: looking up an id that was never registered
//!    is an error, even if the built-in table would have matched the
//!    language.
//!
//! 3. **Explicit mutation only**: the current id changes only through
//!    [`LocaleContext::set_current_locale`] and is never reset implicitly.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::builtin::{self, DEFAULT_LOCALE};
use crate::table::{BucketTemplate, I18nError, LocaleTable};

/// Locale registry with a current selection.
///
/// # Example
///
/// ```
/// use reltime_i18n::{Bucket, LocaleContext};
///
/// let mut ctx = LocaleContext::new();
/// ctx.register("fr_FR", vec![
///     "à l'instant".into(),
///     ("il y a %s seconde", "il y a %s secondes").into(),
///     ("il y a %s minute", "il y a %s minutes").into(),
///     ("il y a %s heure", "il y a %s heures").into(),
///     ("il y a %s jour", "il y a %s jours").into(),
///     ("il y a %s semaine", "il y a %s semaines").into(),
///     "il y a %s mois".into(),
///     ("il y a %s an", "il y a %s ans").into(),
/// ])
/// .unwrap();
/// ctx.set_current_locale("fr_FR");
///
/// let table = ctx.current_table().unwrap();
/// assert_eq!(table.render(Bucket::Months, 3), "il y a 3 mois");
/// ```
#[derive(Debug, Clone)]
pub struct LocaleContext {
    current: String,
    locales: HashMap<String, Arc<LocaleTable>>,
}

impl Default for LocaleContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LocaleContext {
    /// A context holding only the built-in English table, selected.
    #[must_use]
    pub fn new() -> Self {
        let mut locales = HashMap::new();
        locales.insert(DEFAULT_LOCALE.to_string(), Arc::new(builtin::english()));
        Self {
            current: DEFAULT_LOCALE.to_string(),
            locales,
        }
    }

    /// Build a context from caller-supplied tables.
    ///
    /// Fails with [`I18nError::EmptyRegistry`] if `tables` is empty and with
    /// [`I18nError::UnknownLocale`] if `current` is not among them.
    pub fn with_locales<I, S>(tables: I, current: impl Into<String>) -> Result<Self, I18nError>
    where
        I: IntoIterator<Item = (S, LocaleTable)>,
        S: Into<String>,
    {
        let locales: HashMap<String, Arc<LocaleTable>> = tables
            .into_iter()
            .map(|(id, table)| (id.into(), Arc::new(table)))
            .collect();
        if locales.is_empty() {
            return Err(I18nError::EmptyRegistry);
        }
        let current = current.into();
        if !locales.contains_key(&current) {
            return Err(I18nError::UnknownLocale(current));
        }
        Ok(Self { current, locales })
    }

    /// Select the locale used when a caller does not name one.
    ///
    /// The id is not checked here; an unregistered id surfaces as
    /// [`I18nError::UnknownLocale`] on the next lookup.
    pub fn set_current_locale(&mut self, id: impl Into<String>) {
        let id = id.into();
        debug!(locale = %id, registered = self.locales.contains_key(&id), "set current locale");
        self.current = id;
    }

    /// Currently selected locale id.
    #[must_use]
    pub fn current_locale(&self) -> &str {
        &self.current
    }

    /// Register (or replace) a validated table.
    pub fn add_locale(&mut self, id: impl Into<String>, table: LocaleTable) {
        let id = id.into();
        debug!(locale = %id, "add locale");
        self.locales.insert(id, Arc::new(table));
    }

    /// Validate raw templates and register them under `id`.
    ///
    /// Nothing is registered when validation fails.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        templates: Vec<BucketTemplate>,
    ) -> Result<(), I18nError> {
        let id = id.into();
        let table = LocaleTable::new(templates).map_err(|e| e.for_locale(&id))?;
        self.add_locale(id, table);
        Ok(())
    }

    /// Look up a registered table.
    pub fn table(&self, id: &str) -> Result<&Arc<LocaleTable>, I18nError> {
        self.locales
            .get(id)
            .ok_or_else(|| I18nError::UnknownLocale(id.to_string()))
    }

    /// Table for the current locale.
    pub fn current_table(&self) -> Result<&Arc<LocaleTable>, I18nError> {
        self.table(&self.current)
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.locales.contains_key(id)
    }

    /// All registered ids, sorted.
    #[must_use]
    pub fn locales(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.locales.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Bucket, TableDefect};

    fn german() -> Vec<BucketTemplate> {
        vec![
            "gerade eben".into(),
            ("vor %s Sekunde", "vor %s Sekunden").into(),
            ("vor %s Minute", "vor %s Minuten").into(),
            ("vor %s Stunde", "vor %s Stunden").into(),
            ("vor %s Tag", "vor %s Tagen").into(),
            ("vor %s Woche", "vor %s Wochen").into(),
            ("vor %s Monat", "vor %s Monaten").into(),
            ("vor %s Jahr", "vor %s Jahren").into(),
        ]
    }

    #[test]
    fn new_selects_builtin() {
        let ctx = LocaleContext::new();
        assert_eq!(ctx.current_locale(), DEFAULT_LOCALE);
        assert_eq!(ctx.current_table().unwrap().just_now(), "just now");
        assert_eq!(ctx.locales(), vec![DEFAULT_LOCALE]);
    }

    #[test]
    fn register_then_select() {
        let mut ctx = LocaleContext::new();
        ctx.register("de_DE", german()).unwrap();
        ctx.set_current_locale("de_DE");
        let table = ctx.current_table().unwrap();
        assert_eq!(table.render(Bucket::Days, 3), "vor 3 Tagen");
    }

    #[test]
    fn unknown_current_locale_errors() {
        let mut ctx = LocaleContext::new();
        ctx.set_current_locale("xx_XX");
        assert_eq!(
            ctx.current_table().unwrap_err(),
            I18nError::UnknownLocale("xx_XX".into())
        );
    }

    #[test]
    fn failed_register_leaves_registry_untouched() {
        let mut ctx = LocaleContext::new();
        let mut bad = german();
        bad.truncate(3);
        let err = ctx.register("de_DE", bad).unwrap_err();
        assert_eq!(
            err,
            I18nError::InvalidTable {
                locale: Some("de_DE".into()),
                defect: TableDefect::WrongBucketCount(3),
            }
        );
        assert!(!ctx.contains("de_DE"));
    }

    #[test]
    fn add_locale_replaces_existing() {
        let mut ctx = LocaleContext::new();
        let table = LocaleTable::new(german()).unwrap();
        ctx.add_locale(DEFAULT_LOCALE, table);
        assert_eq!(ctx.current_table().unwrap().just_now(), "gerade eben");
    }

    #[test]
    fn previously_resolved_table_survives_replacement() {
        let mut ctx = LocaleContext::new();
        let before = Arc::clone(ctx.current_table().unwrap());
        ctx.add_locale(DEFAULT_LOCALE, LocaleTable::new(german()).unwrap());
        assert_eq!(before.just_now(), "just now");
    }

    #[test]
    fn with_locales_rejects_empty() {
        let tables: Vec<(String, LocaleTable)> = Vec::new();
        assert_eq!(
            LocaleContext::with_locales(tables, "en_US").unwrap_err(),
            I18nError::EmptyRegistry
        );
    }

    #[test]
    fn with_locales_rejects_unknown_current() {
        let tables = vec![("de_DE", LocaleTable::new(german()).unwrap())];
        assert_eq!(
            LocaleContext::with_locales(tables, "en_US").unwrap_err(),
            I18nError::UnknownLocale("en_US".into())
        );
    }

    #[test]
    fn with_locales_has_no_builtin() {
        let tables = vec![("de_DE", LocaleTable::new(german()).unwrap())];
        let ctx = LocaleContext::with_locales(tables, "de_DE").unwrap();
        assert!(!ctx.contains(DEFAULT_LOCALE));
        assert!(ctx.table(DEFAULT_LOCALE).is_err());
    }
}
