//! Generic field access with translation routing.
//!
//! Reads and writes by field name go through here instead of touching the
//! record directly. Three forms of key are recognised:
//!
//! - a translatable field (`title`): resolved in the current locale
//! - a locale-suffixed field (`title_dv`): resolved in the suffix locale
//! - anything else: the stored column value

use crate::error::Result;
use crate::i18n::LocaleContext;
use crate::record::{Attributes, Record, LANG_COLUMN};
use crate::suffix::split_locale_suffix;
use crate::translatable::TranslationStore;
use serde_json::Value;
use tracing::debug;

/// Read `key` from `record`, translating where the key asks for it.
///
/// # Arguments
/// * `store` - Store owning the record's entity type
/// * `ctx` - Locale context supplying the current locale
/// * `record` - Record to read
/// * `key` - Plain column, translatable field, or `field_<locale>`
///
/// # Returns
/// The resolved value, or `None` when nothing is stored. Suffixed reads fall
/// back to the default value only when the store's suffix fallback is on.
pub fn read_attribute<S>(store: &S, ctx: &LocaleContext, record: &Record, key: &str) -> Result<Option<Value>>
where
    S: TranslationStore + ?Sized,
{
    if store.is_translatable(key) {
        let translated = store.translate(ctx, record, key, Some(ctx.current_locale_code()), true)?;
        return Ok(translated.or_else(|| plain(record, key)));
    }

    if let Some((field, locale)) = split_locale_suffix(key) {
        if store.is_translatable(field) && ctx.has(locale)? {
            return store.translate(ctx, record, field, Some(locale), store.lang_suffix_should_fallback());
        }
    }

    Ok(plain(record, key))
}

fn plain(record: &Record, key: &str) -> Option<Value> {
    record.raw(key).filter(|v| !v.is_null())
}

/// Write access to records of one store.
///
/// ```ignore
/// let mut attrs = AttributeInterceptor::new(&mut store, &ctx);
/// attrs.set(&mut record, "title_dv", json!("T-dv"))?;
/// ```
pub struct AttributeInterceptor<'a, S: TranslationStore> {
    store: &'a mut S,
    ctx: &'a LocaleContext,
}

impl<'a, S: TranslationStore> AttributeInterceptor<'a, S> {
    pub fn new(store: &'a mut S, ctx: &'a LocaleContext) -> Self {
        Self { store, ctx }
    }

    pub fn get(&self, record: &Record, key: &str) -> Result<Option<Value>> {
        read_attribute(&*self.store, self.ctx, record, key)
    }

    /// Write `value` to `key`.
    ///
    /// Suffixed keys of a translatable field become a translation for the
    /// suffix locale. A translatable field written while the current locale
    /// differs from the record's `lang` becomes a translation for the current
    /// locale. Everything else is a plain, unsaved column write. Records
    /// without a `lang` get the current locale first.
    ///
    /// # Errors
    /// Translation writes fail as [`TranslationStore::add_translation`] does.
    pub fn set(&mut self, record: &mut Record, key: &str, value: Value) -> Result<()> {
        let ctx = self.ctx;
        if let Some((field, locale)) = split_locale_suffix(key) {
            if self.store.is_translatable(field) && self.store.is_allowed_translation_locale(ctx, locale)? {
                self.store.add_translation(ctx, record, locale, field, value)?;
                return Ok(());
            }
        }

        let current = ctx.current_locale_code();
        if record.lang().is_none() {
            record.set_raw(LANG_COLUMN, Value::String(current.to_string()));
        }

        if record.lang() != Some(current) && self.store.is_translatable(key) {
            debug!("Routing '{}' write to {} translation", key, current);
            self.store.add_translation(ctx, record, current, key, value)?;
            return Ok(());
        }

        record.set_raw(key, value);
        Ok(())
    }

    /// Write straight to the column, bypassing translation routing.
    pub fn set_internal(&mut self, record: &mut Record, key: &str, value: Value) {
        record.set_raw(key, value);
    }

    /// [`set`](Self::set) every pair in order.
    pub fn fill(&mut self, record: &mut Record, attributes: Attributes) -> Result<()> {
        for (key, value) in attributes {
            self.set(record, &key, value)?;
        }
        Ok(())
    }
}

/// A (record, field) pair that can be rendered or translated later.
#[derive(Debug, Clone, Copy)]
pub struct ModelAttribute<'r> {
    record: &'r Record,
    field: &'r str,
}

impl<'r> ModelAttribute<'r> {
    pub fn new(record: &'r Record, field: &'r str) -> Self {
        Self { record, field }
    }

    pub fn record(&self) -> &Record {
        self.record
    }

    pub fn field(&self) -> &str {
        self.field
    }

    pub fn translate<S>(&self, store: &S, ctx: &LocaleContext, locale: Option<&str>, fallback: bool) -> Result<Option<Value>>
    where
        S: TranslationStore + ?Sized,
    {
        store.translate(ctx, self.record, self.field, locale, fallback)
    }

    /// Text of the field as read through [`read_attribute`].
    ///
    /// Strings are returned without quotes and missing values as "".
    pub fn display<S>(&self, store: &S, ctx: &LocaleContext) -> Result<String>
    where
        S: TranslationStore + ?Sized,
    {
        Ok(match read_attribute(store, ctx, self.record, self.field)? {
            None => String::new(),
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::embedded_store::EmbeddedStore;
    use crate::error::TranslationError;
    use crate::i18n::{LocaleRegistry, StaticLocales};
    use crate::row_store::RowStore;
    use crate::schema::{EntitySchema, StrategyKind};
    use serde_json::json;
    use std::sync::Arc;

    fn context_with(config: &Config) -> LocaleContext {
        let source = Arc::new(StaticLocales::from_config(config));
        LocaleContext::new(Arc::new(LocaleRegistry::from_config(source, config)))
    }

    fn schema(kind: StrategyKind) -> EntitySchema {
        EntitySchema::new("articles", kind, ["title", "slug", "body"]).translatables(["title", "body"])
    }

    fn embedded_article(config: &Config, ctx: &LocaleContext) -> (EmbeddedStore, Record) {
        let mut store = EmbeddedStore::new(schema(StrategyKind::Embedded), config);
        let mut record = Record::from_attributes([("title", json!("T-en")), ("slug", json!("S-en"))]);
        store.save(ctx, &mut record).expect("Should save");
        store
            .add_translation(ctx, &mut record, "dv", "title", json!("T-dv"))
            .expect("Should add dv");
        (store, record)
    }

    // ==================== Read Tests ====================

    #[test]
    fn test_read_translatable_uses_current_locale() {
        let config = Config::default();
        let mut ctx = context_with(&config);
        let (store, record) = embedded_article(&config, &ctx);

        assert_eq!(read_attribute(&store, &ctx, &record, "title").unwrap(), Some(json!("T-en")));
        ctx.set_current_locale("dv", true);
        assert_eq!(read_attribute(&store, &ctx, &record, "title").unwrap(), Some(json!("T-dv")));
        ctx.set_current_locale("jp", true);
        assert_eq!(read_attribute(&store, &ctx, &record, "title").unwrap(), Some(json!("T-en")));
    }

    #[test]
    fn test_read_suffixed_key() {
        let config = Config::default();
        let ctx = context_with(&config);
        let (store, record) = embedded_article(&config, &ctx);

        assert_eq!(read_attribute(&store, &ctx, &record, "title_dv").unwrap(), Some(json!("T-dv")));
        assert_eq!(read_attribute(&store, &ctx, &record, "title_en").unwrap(), Some(json!("T-en")));
    }

    #[test]
    fn test_read_suffixed_key_without_fallback() {
        let config = Config::default();
        let ctx = context_with(&config);
        let (store, record) = embedded_article(&config, &ctx);

        assert_eq!(read_attribute(&store, &ctx, &record, "title_jp").unwrap(), None);
    }

    #[test]
    fn test_read_suffixed_key_with_configured_fallback() {
        let config = Config {
            lang_suffix_should_fallback: true,
            ..Config::default()
        };
        let ctx = context_with(&config);
        let (store, record) = embedded_article(&config, &ctx);

        assert_eq!(read_attribute(&store, &ctx, &record, "title_jp").unwrap(), Some(json!("T-en")));
    }

    #[test]
    fn test_read_unknown_suffix_is_plain() {
        let config = Config::default();
        let ctx = context_with(&config);
        let (store, record) = embedded_article(&config, &ctx);

        assert_eq!(read_attribute(&store, &ctx, &record, "title_fr").unwrap(), None);
        assert_eq!(read_attribute(&store, &ctx, &record, "slug_dv").unwrap(), None);
        assert_eq!(read_attribute(&store, &ctx, &record, "slug").unwrap(), Some(json!("S-en")));
        assert_eq!(read_attribute(&store, &ctx, &record, "lang").unwrap(), Some(json!("en")));
    }

    // ==================== Write Tests ====================

    #[test]
    fn test_set_suffixed_key_adds_translation() {
        let config = Config::default();
        let ctx = context_with(&config);
        let (mut store, mut record) = embedded_article(&config, &ctx);

        AttributeInterceptor::new(&mut store, &ctx)
            .set(&mut record, "body_jp", json!("B-jp"))
            .expect("Should set");

        assert_eq!(record.translations().unwrap()["jp"]["body"], json!("B-jp"));
    }

    #[test]
    fn test_set_in_other_locale_adds_translation() {
        let config = Config::default();
        let mut ctx = context_with(&config);
        let (mut store, mut record) = embedded_article(&config, &ctx);
        ctx.set_current_locale("jp", true);

        let mut attrs = AttributeInterceptor::new(&mut store, &ctx);
        attrs.set(&mut record, "title", json!("T-jp")).unwrap();
        attrs.set(&mut record, "slug", json!("S-jp")).unwrap();

        assert_eq!(record.raw("title"), Some(json!("T-en")));
        assert_eq!(record.raw("slug"), Some(json!("S-jp")));
        assert_eq!(attrs.get(&record, "title").unwrap(), Some(json!("T-jp")));
    }

    #[test]
    fn test_set_initializes_lang() {
        let config = Config::default();
        let mut ctx = context_with(&config);
        ctx.set_current_locale("dv", true);
        let mut store = EmbeddedStore::new(schema(StrategyKind::Embedded), &config);
        let mut record = Record::new();

        AttributeInterceptor::new(&mut store, &ctx)
            .set(&mut record, "title", json!("T-dv"))
            .unwrap();

        assert_eq!(record.lang(), Some("dv"));
        assert_eq!(record.raw("title"), Some(json!("T-dv")));
        assert!(!record.exists());
    }

    #[test]
    fn test_set_internal_bypasses_routing() {
        let config = Config::default();
        let ctx = context_with(&config);
        let (mut store, mut record) = embedded_article(&config, &ctx);

        AttributeInterceptor::new(&mut store, &ctx).set_internal(&mut record, "title_dv", json!("raw"));
        assert_eq!(record.raw("title_dv"), Some(json!("raw")));
        assert_eq!(record.translations().unwrap()["dv"]["title"], json!("T-dv"));
    }

    #[test]
    fn test_set_in_unregistered_locale_fails() {
        let config = Config::default();
        let mut ctx = context_with(&config);
        let mut store = RowStore::new(schema(StrategyKind::Row), &config);
        let mut record = Record::from_attributes([("lang", json!("en")), ("slug", json!("S"))]);
        store.save(&ctx, &mut record).unwrap();
        ctx.set_current_locale("fr", false);

        let err = AttributeInterceptor::new(&mut store, &ctx)
            .set(&mut record, "title", json!("T-fr"))
            .unwrap_err();
        assert!(matches!(err, TranslationError::LanguageNotAllowed { .. }));
    }

    #[test]
    fn test_fill_with_row_store() {
        let config = Config::default();
        let ctx = context_with(&config);
        let mut store = RowStore::new(schema(StrategyKind::Row), &config);
        let mut record = Record::from_attributes([("title", json!("T-en"))]);
        store.save(&ctx, &mut record).unwrap();

        let mut input = Attributes::new();
        input.insert("title_dv".to_string(), json!("T-dv"));
        input.insert("slug".to_string(), json!("S-en"));
        AttributeInterceptor::new(&mut store, &ctx).fill(&mut record, input).unwrap();

        assert_eq!(record.raw("slug"), Some(json!("S-en")));
        assert_eq!(store.translations(&record).len(), 1);
        assert_eq!(read_attribute(&store, &ctx, &record, "title_dv").unwrap(), Some(json!("T-dv")));
    }

    // ==================== ModelAttribute Tests ====================

    #[test]
    fn test_model_attribute() {
        let config = Config::default();
        let mut ctx = context_with(&config);
        let (store, record) = embedded_article(&config, &ctx);
        let title = ModelAttribute::new(&record, "title");

        assert_eq!(title.field(), "title");
        assert_eq!(title.translate(&store, &ctx, Some("dv"), false).unwrap(), Some(json!("T-dv")));
        assert_eq!(title.display(&store, &ctx).unwrap(), "T-en");

        ctx.set_current_locale("dv", true);
        assert_eq!(title.display(&store, &ctx).unwrap(), "T-dv");
        assert_eq!(ModelAttribute::new(&record, "body").display(&store, &ctx).unwrap(), "");
    }
}
