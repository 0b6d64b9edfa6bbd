//! The translatable contract shared by both storage strategies.
//!
//! [`TranslationStore`] is implemented by [`RowStore`](crate::RowStore) and
//! [`EmbeddedStore`](crate::EmbeddedStore). Stores supply the primitive
//! lookups and writes; the read path ([`TranslationStore::translate`]) and the
//! validation rules are provided here once for both.

use crate::error::{Result, TranslationError};
use crate::i18n::{Direction, LocaleContext};
use crate::record::{is_blank, Attributes, Record, RecordId, RecordTable};
use crate::schema::FieldClassifier;
use serde_json::Value;
use tracing::debug;

pub trait TranslationStore {
    /// Field policy of the entity type this store holds.
    fn classifier(&self) -> &FieldClassifier;

    /// Whether locale-suffixed reads fall back to the default value.
    fn lang_suffix_should_fallback(&self) -> bool;

    /// Locale under which the record's default variant is stored.
    fn default_translation_locale(&self, ctx: &LocaleContext, record: &Record) -> Result<String>;

    /// Value of `field` in the record's default variant.
    fn default_value(&self, record: &Record, field: &str) -> Result<Option<Value>>;

    /// Stored value of `field` for a non-default `locale`.
    ///
    /// `None` means no translation was found. `Some(Value::Null)` means one
    /// was found and holds null.
    fn stored_translation(
        &self,
        ctx: &LocaleContext,
        record: &Record,
        locale: &str,
        field: &str,
    ) -> Result<Option<Value>>;

    /// Whether a stored but empty value counts as untranslated.
    fn blank_is_untranslated(&self) -> bool {
        false
    }

    /// Check if the record has a variant for `locale` (or the current locale).
    fn has_translation(&self, ctx: &LocaleContext, record: &Record, locale: Option<&str>) -> Result<bool>;

    /// Write `value` to `field` for `locale` and persist it.
    ///
    /// Returns the stored row that now holds the value. `record` is updated
    /// in place whenever that row is the record itself.
    ///
    /// # Errors
    /// `LanguageNotAllowed` or `FieldNotAllowed` before any write.
    fn add_translation(
        &mut self,
        ctx: &LocaleContext,
        record: &mut Record,
        locale: &str,
        field: &str,
        value: Value,
    ) -> Result<Record>;

    /// Remove every variant (`None`) or the variant for one locale.
    fn clear_translations(&mut self, ctx: &LocaleContext, record: &mut Record, locale: Option<&str>) -> Result<()>;

    /// Remove the variant for `locale`.
    ///
    /// # Errors
    /// `CannotDeletePrimaryTranslation` when `locale` is the default variant.
    fn delete_translation(&mut self, ctx: &LocaleContext, record: &mut Record, locale: &str) -> Result<()>;

    /// Remove every non-default variant.
    fn delete_translations(&mut self, ctx: &LocaleContext, record: &mut Record) -> Result<()>;

    /// Persist the record, running the creation hook for new records.
    fn save(&mut self, ctx: &LocaleContext, record: &mut Record) -> Result<RecordId>;

    /// Translate `field` into `locale` (the current locale when `None`).
    ///
    /// Without a usable translation the result is the record's own value when
    /// `fallback` is set, and `None` otherwise. Reads never fail on a
    /// missing locale or field.
    ///
    /// # Arguments
    /// * `ctx` - Locale context supplying the current locale
    /// * `record` - Record to read
    /// * `field` - Field name
    /// * `locale` - Target locale, defaults to the current locale
    /// * `fallback` - Substitute the record's own value for missing translations
    ///
    /// # Returns
    /// The resolved value; JSON null is reported as `None`.
    fn translate(
        &self,
        ctx: &LocaleContext,
        record: &Record,
        field: &str,
        locale: Option<&str>,
        fallback: bool,
    ) -> Result<Option<Value>> {
        let locale = locale.unwrap_or(ctx.current_locale_code());
        let own = || if fallback { record.raw(field) } else { None };

        let value = if self.is_default_translation_locale(ctx, record, locale)? {
            self.default_value(record, field)?
        } else if !self.is_allowed_translation_locale(ctx, locale)? || !self.is_translatable(field) {
            own()
        } else {
            match self.stored_translation(ctx, record, locale, field)? {
                Some(value) if fallback && self.blank_is_untranslated() && is_blank(Some(&value)) => {
                    record.raw(field)
                }
                Some(value) => Some(value),
                None => own(),
            }
        };

        Ok(value.filter(|v| !v.is_null()))
    }

    /// Write several fields for one locale.
    ///
    /// The locale and every field are validated before anything is written.
    fn add_translations(
        &mut self,
        ctx: &LocaleContext,
        record: &mut Record,
        locale: &str,
        fields: Attributes,
    ) -> Result<()> {
        for field in fields.keys() {
            self.ensure_writable(ctx, locale, field)?;
        }
        debug!("Adding {} {} translation(s)", fields.len(), locale);
        for (field, value) in fields {
            self.add_translation(ctx, record, locale, &field, value)?;
        }
        Ok(())
    }

    fn is_translatable(&self, field: &str) -> bool {
        self.classifier().is_translatable(field)
    }

    fn is_non_translatable_pivot(&self, relation: &str) -> bool {
        self.classifier().is_pivot(relation)
    }

    /// Codes of every locale a translation may be written for.
    fn allowed_translation_locales(&self, ctx: &LocaleContext) -> Result<Vec<String>> {
        ctx.registry().codes()
    }

    fn is_allowed_translation_locale(&self, ctx: &LocaleContext, locale: &str) -> Result<bool> {
        ctx.has(locale)
    }

    fn is_default_translation_locale(&self, ctx: &LocaleContext, record: &Record, locale: &str) -> Result<bool> {
        Ok(self.default_translation_locale(ctx, record)? == locale)
    }

    /// Text direction of the record's own language.
    fn locale_direction(&self, ctx: &LocaleContext, record: &Record) -> Result<Direction> {
        ctx.direction(record.lang())
    }

    /// Reject writes to a locale outside the registry or a non-translatable field.
    fn ensure_writable(&self, ctx: &LocaleContext, locale: &str, field: &str) -> Result<()> {
        if !self.is_allowed_translation_locale(ctx, locale)? {
            return Err(TranslationError::language_not_allowed(locale));
        }
        if !self.is_translatable(field) {
            return Err(TranslationError::field_not_allowed(field, locale));
        }
        Ok(())
    }

    /// Whether a form input for `field` should be read-only.
    ///
    /// Editing a record in a locale other than its own only unlocks the
    /// translatable fields.
    fn is_form_field_disabled(&self, ctx: &LocaleContext, record: &Record, field: &str) -> bool {
        if record.lang() == Some(ctx.current_locale_code()) {
            return false;
        }
        !self.is_translatable(field)
    }

    /// Expand translatable entries of `fields` with their suffixed names.
    fn suffix_translatables(&self, ctx: &LocaleContext, fields: &[&str]) -> Result<Vec<String>> {
        let codes = self.allowed_translation_locales(ctx)?;
        Ok(self.classifier().suffix_translatables(fields, &codes))
    }
}

/// Insert or update `record` in `table`.
///
/// New records without a `lang` are stamped with the current locale.
pub(crate) fn persist(table: &mut RecordTable, ctx: &LocaleContext, record: &mut Record) -> Result<RecordId> {
    if let Some(id) = record.id() {
        table.update(record)?;
        return Ok(id);
    }
    if record.lang().is_none() {
        record.set_lang(ctx.current_locale_code());
    }
    *record = table.insert(std::mem::take(record));
    let id = record.id().ok_or(TranslationError::RecordNotFound(0))?;
    debug!("Created record {} ({})", id, ctx.current_locale_code());
    Ok(id)
}
