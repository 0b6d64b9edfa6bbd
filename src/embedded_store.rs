//! Embedded strategy: non-default locales live in a translation map on the
//! record itself.
//!
//! The record's own columns hold the values of its `lang`; every other locale
//! is a `translations[locale][field]` entry. A stored empty value (see
//! [`is_blank`]) counts as untranslated when reading with fallback.

use crate::attributes::AttributeInterceptor;
use crate::config::Config;
use crate::error::{Result, TranslationError};
use crate::i18n::LocaleContext;
use crate::record::{is_blank, Attributes, Record, RecordId, RecordTable, LANG_COLUMN};
use crate::schema::{EntitySchema, FieldClassifier};
use crate::suffix::suffixed;
use crate::translatable::{persist, TranslationStore};
use serde_json::Value;
use tracing::debug;

pub struct EmbeddedStore {
    classifier: FieldClassifier,
    table: RecordTable,
    suffix_fallback: bool,
}

impl EmbeddedStore {
    pub fn new(schema: EntitySchema, config: &Config) -> Self {
        Self {
            classifier: FieldClassifier::new(schema, &config.fields_ignored_for_translation),
            table: RecordTable::new(),
            suffix_fallback: config.lang_suffix_should_fallback,
        }
    }

    pub fn table(&self) -> &RecordTable {
        &self.table
    }

    /// Load a live record by key.
    pub fn find(&self, id: RecordId) -> Option<Record> {
        self.table.find(id).cloned()
    }

    /// Suffixed input names accepted by [`fill`](Self::fill): one
    /// `field_<code>` per fillable translatable field and active locale.
    pub fn fillable_translatables(&self, ctx: &LocaleContext) -> Result<Vec<String>> {
        let codes = self.allowed_translation_locales(ctx)?;
        let fillable = self.classifier.schema().fillable_fields();

        Ok(self
            .classifier
            .translatables()
            .iter()
            .filter(|field| fillable.contains(field))
            .flat_map(|field| codes.iter().map(move |code| suffixed(field, code)))
            .collect())
    }

    /// Bulk assign form input.
    ///
    /// Suffixed translatable keys are written as translations first, then the
    /// plain fillable keys go through the attribute interceptor. Other keys
    /// are ignored.
    pub fn fill(&mut self, ctx: &LocaleContext, record: &mut Record, attributes: Attributes) -> Result<()> {
        let suffixed_keys = self.fillable_translatables(ctx)?;
        let fillable = self.classifier.schema().fillable_fields().to_vec();

        let (translations, plain): (Vec<_>, Vec<_>) = attributes
            .into_iter()
            .partition(|(key, _)| suffixed_keys.contains(key));

        let mut interceptor = AttributeInterceptor::new(self, ctx);
        for (key, value) in translations {
            interceptor.set(record, &key, value)?;
        }
        for (key, value) in plain.into_iter().filter(|(key, _)| fillable.contains(key)) {
            interceptor.set(record, &key, value)?;
        }
        Ok(())
    }
}

impl TranslationStore for EmbeddedStore {
    fn classifier(&self) -> &FieldClassifier {
        &self.classifier
    }

    fn lang_suffix_should_fallback(&self) -> bool {
        self.suffix_fallback
    }

    fn default_translation_locale(&self, ctx: &LocaleContext, record: &Record) -> Result<String> {
        Ok(record
            .lang()
            .unwrap_or(ctx.current_locale_code())
            .to_string())
    }

    fn default_value(&self, record: &Record, field: &str) -> Result<Option<Value>> {
        Ok(record.raw(field))
    }

    fn stored_translation(
        &self,
        _ctx: &LocaleContext,
        record: &Record,
        locale: &str,
        field: &str,
    ) -> Result<Option<Value>> {
        Ok(record
            .translations()
            .and_then(|t| t.get(locale))
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    fn blank_is_untranslated(&self) -> bool {
        true
    }

    fn has_translation(&self, ctx: &LocaleContext, record: &Record, locale: Option<&str>) -> Result<bool> {
        let locale = locale.unwrap_or(ctx.current_locale_code());
        if record.lang() == Some(locale) {
            return Ok(true);
        }
        Ok(record
            .translations()
            .is_some_and(|t| t.contains_key(locale)))
    }

    fn add_translation(
        &mut self,
        ctx: &LocaleContext,
        record: &mut Record,
        locale: &str,
        field: &str,
        value: Value,
    ) -> Result<Record> {
        self.ensure_writable(ctx, locale, field)?;

        if self.is_default_translation_locale(ctx, record, locale)? {
            record.set_raw(field, value);
            record.set_raw(LANG_COLUMN, Value::String(locale.to_string()));
        } else {
            // A first save without a default value takes the translated one
            let seed_default = !record.exists() && is_blank(record.raw(field).as_ref());

            record.set_translation_value(locale, field, value.clone());
            record.set_translation_value(locale, LANG_COLUMN, Value::String(locale.to_string()));
            if seed_default {
                record.set_raw(field, value);
            }
        }

        self.save(ctx, record)?;
        Ok(record.clone())
    }

    fn clear_translations(&mut self, ctx: &LocaleContext, record: &mut Record, locale: Option<&str>) -> Result<()> {
        match locale {
            None => *record.translations_mut() = None,
            Some(locale) => {
                let removed = record
                    .translations_mut()
                    .as_mut()
                    .and_then(|t| t.remove(locale))
                    .is_some();
                if !removed {
                    return Ok(());
                }
            }
        }
        debug!("Cleared {} translations", locale.unwrap_or("all"));
        self.save(ctx, record)?;
        Ok(())
    }

    fn delete_translation(&mut self, ctx: &LocaleContext, record: &mut Record, locale: &str) -> Result<()> {
        if record.lang() == Some(locale) || self.is_default_translation_locale(ctx, record, locale)? {
            return Err(TranslationError::cannot_delete_primary(locale));
        }

        let removed = record
            .translations_mut()
            .as_mut()
            .and_then(|t| t.remove(locale))
            .is_some();
        if removed && record.exists() {
            self.table.update(record)?;
        }
        Ok(())
    }

    fn delete_translations(&mut self, _ctx: &LocaleContext, record: &mut Record) -> Result<()> {
        *record.translations_mut() = Some(Default::default());
        if record.exists() {
            self.table.update(record)?;
        }
        Ok(())
    }

    fn save(&mut self, ctx: &LocaleContext, record: &mut Record) -> Result<RecordId> {
        persist(&mut self.table, ctx, record)
    }
}
