//! Row strategy: every locale is a full row.
//!
//! A root row (no parent reference) holds the default variant under its own
//! `lang`. Each other locale is a sibling row whose parent reference is the
//! root's key. At most one live row exists per (root, locale).

use crate::config::Config;
use crate::error::{Result, TranslationError};
use crate::i18n::LocaleContext;
use crate::record::{Record, RecordId, RecordTable, DELETED_AT_COLUMN, ID_COLUMN};
use crate::schema::{EntitySchema, FieldClassifier};
use crate::translatable::{persist, TranslationStore};
use serde_json::Value;
use tracing::debug;

pub struct RowStore {
    classifier: FieldClassifier,
    table: RecordTable,
    suffix_fallback: bool,
}

impl RowStore {
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

    /// Load a live row by key.
    pub fn find(&self, id: RecordId) -> Option<Record> {
        self.table.find(id).cloned()
    }

    pub fn is_root_translation(&self, record: &Record) -> bool {
        record.is_root()
    }

    /// Every live root row.
    pub fn root_translations(&self) -> Vec<Record> {
        self.table.scan(Record::is_root).cloned().collect()
    }

    /// The root row of `record` (the record itself when it is a root).
    ///
    /// # Errors
    /// `RecordNotFound` when the parent reference points at a missing row.
    pub fn default_translation(&self, record: &Record) -> Result<Record> {
        match record.parent_id() {
            None => Ok(record.clone()),
            Some(parent) => self
                .table
                .find(parent)
                .cloned()
                .ok_or(TranslationError::RecordNotFound(parent)),
        }
    }

    /// Other rows of the same translation group.
    ///
    /// For a root these are its variants. For a variant these are the root
    /// and the other variants.
    pub fn translations(&self, record: &Record) -> Vec<Record> {
        match (record.parent_id(), record.id()) {
            (None, Some(id)) => self
                .table
                .scan(move |r| r.parent_id() == Some(id))
                .cloned()
                .collect(),
            (None, None) => Vec::new(),
            (Some(parent), own) => self
                .table
                .scan(move |r| {
                    (r.id() == Some(parent) || r.parent_id() == Some(parent)) && r.id() != own
                })
                .cloned()
                .collect(),
        }
    }

    /// The row holding `locale` (the current locale when `None`).
    ///
    /// Returns `None` when the group has no row for that locale.
    pub fn get_translation(&self, ctx: &LocaleContext, record: &Record, locale: Option<&str>) -> Option<Record> {
        let locale = locale.unwrap_or(ctx.current_locale_code());
        let root = self.root_of(record)?;
        if root.lang() == Some(locale) {
            return Some(root);
        }
        self.translations(&root)
            .into_iter()
            .find(|r| r.lang() == Some(locale))
    }

    /// Whether the record may be attached to another translation group.
    ///
    /// Variants always may. A root may only when it has a row for the
    /// current locale.
    pub fn can_update_translatable_parent(&self, ctx: &LocaleContext, record: &Record) -> Result<bool> {
        Ok(!record.is_root() || self.has_translation(ctx, record, None)?)
    }

    /// Live stored copy of the row with key `id`.
    fn stored(&self, id: Option<RecordId>) -> Result<Record> {
        let id = id.ok_or(TranslationError::RecordNotFound(0))?;
        self.find(id).ok_or(TranslationError::RecordNotFound(id))
    }

    fn root_of(&self, record: &Record) -> Option<Record> {
        match record.parent_id() {
            None => Some(record.clone()),
            Some(parent) => self.table.find(parent).cloned(),
        }
    }

    /// A new unsaved variant of `root` for `locale` with every column copied.
    fn materialize(&self, root: &Record, locale: &str) -> Record {
        let mut variant = Record::new();
        for column in self.classifier.all_attributes() {
            if column == ID_COLUMN {
                continue;
            }
            if let Some(value) = root.raw(column) {
                variant.set_raw(column, value);
            }
        }
        variant.set_parent_id(root.id());
        variant.set_lang(locale);
        debug!("Materializing {} variant of record {:?}", locale, root.id());
        variant
    }

    fn trash(&mut self, record: &mut Record, id: RecordId) {
        if self.table.soft_delete(id) {
            debug!("Soft deleted record {}", id);
        }
        if record.id() == Some(id) {
            sync_deleted_at(&self.table, record);
        }
    }
}

fn sync_deleted_at(table: &RecordTable, record: &mut Record) {
    if let Some(stored) = record.id().and_then(|id| table.find_with_trashed(id)) {
        let deleted_at = stored.raw(DELETED_AT_COLUMN).unwrap_or(Value::Null);
        record.set_raw(DELETED_AT_COLUMN, deleted_at);
    }
}

impl TranslationStore for RowStore {
    fn classifier(&self) -> &FieldClassifier {
        &self.classifier
    }

    fn lang_suffix_should_fallback(&self) -> bool {
        self.suffix_fallback
    }

    fn default_translation_locale(&self, ctx: &LocaleContext, record: &Record) -> Result<String> {
        let root = self.root_of(record);
        let lang = root
            .as_ref()
            .and_then(Record::lang)
            .or(record.lang())
            .unwrap_or(ctx.current_locale_code());
        Ok(lang.to_string())
    }

    fn default_value(&self, record: &Record, field: &str) -> Result<Option<Value>> {
        if record.is_root() {
            return Ok(record.raw(field));
        }
        Ok(self
            .root_of(record)
            .map_or_else(|| record.raw(field), |root| root.raw(field)))
    }

    fn stored_translation(
        &self,
        ctx: &LocaleContext,
        record: &Record,
        locale: &str,
        field: &str,
    ) -> Result<Option<Value>> {
        // Prefer the in-memory copy when the variant is the record itself
        Ok(self.get_translation(ctx, record, Some(locale)).map(|row| {
            let source = if row.id() == record.id() { record } else { &row };
            source.raw(field).unwrap_or(Value::Null)
        }))
    }

    fn has_translation(&self, ctx: &LocaleContext, record: &Record, locale: Option<&str>) -> Result<bool> {
        let locale = locale.unwrap_or(ctx.current_locale_code());
        if record.lang() == Some(locale) {
            return Ok(true);
        }
        let found = match (record.parent_id(), record.id()) {
            (None, Some(id)) => self
                .table
                .scan(move |r| r.parent_id() == Some(id) && r.lang() == Some(locale))
                .next()
                .is_some(),
            (None, None) => false,
            (Some(parent), _) => self
                .table
                .scan(move |r| {
                    (r.parent_id() == Some(parent) || r.id() == Some(parent))
                        && r.lang() == Some(locale)
                })
                .next()
                .is_some(),
        };
        Ok(found)
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

        // Writes apply to the stored rows, not to the caller's copy
        let mut root = if record.is_root() {
            if !record.exists() {
                self.save(ctx, record)?;
            }
            self.stored(record.id())?
        } else {
            self.default_translation(record)?
        };

        if root.lang() == Some(locale) {
            root.set_raw(field, value);
            self.table.update(&mut root)?;
            if root.id() == record.id() {
                *record = root.clone();
            }
            return Ok(root);
        }

        let existing = self
            .translations(&root)
            .into_iter()
            .find(|r| r.lang() == Some(locale));
        let mut variant = match existing {
            Some(row) => row,
            None => self.materialize(&root, locale),
        };

        variant.set_raw(field, value);
        self.save(ctx, &mut variant)?;
        if variant.id() == record.id() {
            *record = variant.clone();
        }
        Ok(variant)
    }

    fn clear_translations(&mut self, _ctx: &LocaleContext, record: &mut Record, locale: Option<&str>) -> Result<()> {
        let Some(locale) = locale else {
            let Some(root_id) = record.parent_id().or(record.id()) else {
                return Ok(());
            };
            let ids: Vec<RecordId> = self
                .table
                .scan_with_trashed(move |r| r.parent_id() == Some(root_id))
                .filter_map(Record::id)
                .collect();
            for id in &ids {
                self.table.force_delete(*id);
            }
            debug!("Force deleted {} variant(s) of record {}", ids.len(), root_id);
            return Ok(());
        };

        if record.lang() == Some(locale) {
            if let Some(id) = record.id() {
                self.trash(record, id);
            }
            return Ok(());
        }

        let Some(root) = self.root_of(record) else {
            return Ok(());
        };
        let mut ids: Vec<RecordId> = Vec::new();
        if root.lang() == Some(locale) {
            ids.extend(root.id());
        }
        ids.extend(
            self.translations(&root)
                .iter()
                .filter(|r| r.lang() == Some(locale))
                .filter_map(Record::id),
        );
        for id in ids {
            self.trash(record, id);
        }
        Ok(())
    }

    fn delete_translation(&mut self, _ctx: &LocaleContext, record: &mut Record, locale: &str) -> Result<()> {
        let root = self.default_translation(record)?;
        if root.lang() == Some(locale) {
            return Err(TranslationError::cannot_delete_primary(locale));
        }

        let target = self
            .translations(&root)
            .into_iter()
            .find(|r| r.lang() == Some(locale))
            .and_then(|r| r.id());
        match target {
            Some(id) => self.trash(record, id),
            None => debug!("No {} variant to delete", locale),
        }
        Ok(())
    }

    fn delete_translations(&mut self, _ctx: &LocaleContext, record: &mut Record) -> Result<()> {
        let root = self.default_translation(record)?;
        let ids: Vec<RecordId> = self
            .translations(&root)
            .iter()
            .filter_map(Record::id)
            .collect();
        for id in ids {
            self.trash(record, id);
        }
        Ok(())
    }

    fn save(&mut self, ctx: &LocaleContext, record: &mut Record) -> Result<RecordId> {
        persist(&mut self.table, ctx, record)
    }
}
