//! Translatable records and the keyed table that stores them.
//!
//! A [`Record`] is one in-memory entity instance: typed slots for the
//! columns the translation machinery owns (`id`, `lang`, parent reference,
//! translation map, timestamps) plus a free-form attribute map for the
//! entity's own columns. [`Record::raw`] and [`Record::set_raw`] dispatch on
//! the column name so callers can treat every column uniformly.

use crate::error::{Result, TranslationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type RecordId = u64;

/// Entity columns other than the translation bookkeeping columns.
pub type Attributes = BTreeMap<String, Value>;

/// Embedded translations: locale code -> field -> value.
pub type TranslationMap = BTreeMap<String, BTreeMap<String, Value>>;

pub const ID_COLUMN: &str = "id";
pub const LANG_COLUMN: &str = "lang";
pub const PARENT_COLUMN: &str = "translatable_parent_id";
pub const TRANSLATIONS_COLUMN: &str = "translations";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";
pub const DELETED_AT_COLUMN: &str = "deleted_at";

/// Check whether a value counts as empty.
///
/// Null, `false`, zero, `""`, `"0"` and empty arrays/objects are empty.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty() || s == "0",
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: Option<RecordId>,
    lang: Option<String>,
    parent_id: Option<RecordId>,
    translations: Option<TranslationMap>,
    attributes: Attributes,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unsaved record, routing each pair through [`Record::set_raw`].
    pub fn from_attributes<K, I>(attributes: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut record = Self::new();
        for (key, value) in attributes {
            record.set_raw(key.as_ref(), value);
        }
        record
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Whether the record has been saved.
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref().filter(|l| !l.is_empty())
    }

    pub fn parent_id(&self) -> Option<RecordId> {
        self.parent_id
    }

    /// A record is a root iff it has no parent reference.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn translations(&self) -> Option<&TranslationMap> {
        self.translations.as_ref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Read a stored column without any translation.
    pub fn raw(&self, key: &str) -> Option<Value> {
        match key {
            ID_COLUMN => self.id.map(Value::from),
            LANG_COLUMN => self.lang.clone().map(Value::String),
            PARENT_COLUMN => self.parent_id.map(Value::from),
            TRANSLATIONS_COLUMN => self
                .translations
                .as_ref()
                .and_then(|t| serde_json::to_value(t).ok()),
            CREATED_AT_COLUMN => self.created_at.map(timestamp),
            UPDATED_AT_COLUMN => self.updated_at.map(timestamp),
            DELETED_AT_COLUMN => self.deleted_at.map(timestamp),
            _ => self.attributes.get(key).cloned(),
        }
    }

    /// Write a stored column without any translation.
    ///
    /// Values of the wrong shape for a bookkeeping column clear it.
    pub fn set_raw(&mut self, key: &str, value: Value) {
        match key {
            ID_COLUMN => self.id = value.as_u64(),
            LANG_COLUMN => {
                self.lang = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s),
                    other => Some(other.to_string()),
                }
            }
            PARENT_COLUMN => self.parent_id = value.as_u64(),
            TRANSLATIONS_COLUMN => self.translations = serde_json::from_value(value).ok(),
            CREATED_AT_COLUMN => self.created_at = parse_timestamp(&value),
            UPDATED_AT_COLUMN => self.updated_at = parse_timestamp(&value),
            DELETED_AT_COLUMN => self.deleted_at = parse_timestamp(&value),
            _ => {
                self.attributes.insert(key.to_string(), value);
            }
        }
    }

    pub(crate) fn set_lang(&mut self, lang: &str) {
        self.lang = Some(lang.to_string());
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: Option<RecordId>) {
        self.parent_id = parent_id;
    }

    /// Store one embedded translation value for `locale`.
    pub fn set_translation_value(&mut self, locale: &str, field: &str, value: Value) {
        self.translations
            .get_or_insert_with(TranslationMap::new)
            .entry(locale.to_string())
            .or_default()
            .insert(field.to_string(), value);
    }

    pub(crate) fn translations_mut(&mut self) -> &mut Option<TranslationMap> {
        &mut self.translations
    }
}

fn timestamp(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339())
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|at| at.with_timezone(&Utc))
}

/// Keyed record storage for one entity type.
///
/// Parent/child links between rows are plain `RecordId` references. Soft
/// deleted rows stay in the table and are skipped by the default scans.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    rows: BTreeMap<RecordId, Record>,
    last_id: RecordId,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new row, assigning its key and timestamps.
    pub fn insert(&mut self, mut record: Record) -> Record {
        self.last_id += 1;
        let now = Utc::now();
        record.id = Some(self.last_id);
        record.created_at = Some(now);
        record.updated_at = Some(now);
        record.deleted_at = None;
        self.rows.insert(self.last_id, record.clone());
        record
    }

    /// Overwrite a live row and refresh `updated_at` on both copies.
    ///
    /// Trashed rows are not found; bring them back with [`restore`](Self::restore).
    pub fn update(&mut self, record: &mut Record) -> Result<()> {
        let id = record.id.ok_or(TranslationError::RecordNotFound(0))?;
        let row = self
            .rows
            .get_mut(&id)
            .filter(|row| !row.is_trashed())
            .ok_or(TranslationError::RecordNotFound(id))?;
        record.updated_at = Some(Utc::now());
        *row = record.clone();
        Ok(())
    }

    pub fn find(&self, id: RecordId) -> Option<&Record> {
        self.rows.get(&id).filter(|r| !r.is_trashed())
    }

    pub fn find_with_trashed(&self, id: RecordId) -> Option<&Record> {
        self.rows.get(&id)
    }

    /// Live rows matching `predicate`, in key order.
    pub fn scan<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Record> + 'a
    where
        P: Fn(&Record) -> bool + 'a,
    {
        self.rows
            .values()
            .filter(move |r| !r.is_trashed() && predicate(r))
    }

    /// All rows matching `predicate`, trashed ones included.
    pub fn scan_with_trashed<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Record> + 'a
    where
        P: Fn(&Record) -> bool + 'a,
    {
        self.rows.values().filter(move |r| predicate(r))
    }

    /// Mark a live row deleted. Returns `false` if there was none.
    pub fn soft_delete(&mut self, id: RecordId) -> bool {
        match self.rows.get_mut(&id) {
            Some(row) if !row.is_trashed() => {
                row.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    /// Clear the deleted mark of a trashed row.
    pub fn restore(&mut self, id: RecordId) -> bool {
        match self.rows.get_mut(&id) {
            Some(row) if row.is_trashed() => {
                row.deleted_at = None;
                true
            }
            _ => false,
        }
    }

    /// Remove a row for good.
    pub fn force_delete(&mut self, id: RecordId) -> bool {
        self.rows.remove(&id).is_some()
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.rows.values().filter(|r| !r.is_trashed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
