//! Entity schemas and the per-entity field classification policy.

use crate::record::{ID_COLUMN, LANG_COLUMN, PARENT_COLUMN, TRANSLATIONS_COLUMN};
use crate::suffix::suffixed;
use serde::{Deserialize, Serialize};

/// How an entity type persists its non-default locale variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// One sibling row per locale, linked to a root row.
    Row,
    /// A translation map embedded in the root row.
    Embedded,
}

impl StrategyKind {
    /// Columns an entity must have to adopt this strategy.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            StrategyKind::Row => &[PARENT_COLUMN, LANG_COLUMN],
            StrategyKind::Embedded => &[TRANSLATIONS_COLUMN, LANG_COLUMN],
        }
    }

    /// Fields this strategy never translates, before configuration is merged in.
    pub fn base_ignored_fields(&self) -> &'static [&'static str] {
        match self {
            StrategyKind::Row => &[ID_COLUMN, PARENT_COLUMN, LANG_COLUMN],
            StrategyKind::Embedded => &[ID_COLUMN, TRANSLATIONS_COLUMN, LANG_COLUMN],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Row => "row",
            StrategyKind::Embedded => "embedded",
        }
    }
}

/// Static description of one translatable entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    table: String,
    kind: StrategyKind,
    columns: Vec<String>,
    translatables: Vec<String>,
    pivots: Vec<String>,
    fillable: Vec<String>,
}

impl EntitySchema {
    /// Describe an entity table. Missing `id` and strategy columns are appended.
    pub fn new<I, S>(table: impl Into<String>, kind: StrategyKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if !columns.iter().any(|c| c == ID_COLUMN) {
            columns.insert(0, ID_COLUMN.to_string());
        }
        for required in kind.required_columns() {
            if !columns.iter().any(|c| c == required) {
                columns.push(required.to_string());
            }
        }

        Self {
            table: table.into(),
            kind,
            columns,
            translatables: Vec::new(),
            pivots: Vec::new(),
            fillable: Vec::new(),
        }
    }

    /// Declare the translatable fields.
    pub fn translatables<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translatables = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Declare relation fields that are never translated.
    pub fn pivots<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pivots = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the fields accepted by bulk fill.
    pub fn fillable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillable = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn fillable_fields(&self) -> &[String] {
        &self.fillable
    }
}

/// Answers which fields of an entity may carry per-locale values.
#[derive(Debug, Clone)]
pub struct FieldClassifier {
    schema: EntitySchema,
    ignored: Vec<String>,
}

impl FieldClassifier {
    /// Combine an entity schema with the configured ignore list.
    pub fn new(schema: EntitySchema, config_ignored: &[String]) -> Self {
        let mut ignored: Vec<String> = Vec::new();
        let base = schema.kind().base_ignored_fields().iter().map(|s| s.to_string());
        for field in base.chain(config_ignored.iter().cloned()) {
            if !ignored.contains(&field) {
                ignored.push(field);
            }
        }
        Self { schema, ignored }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn translatables(&self) -> &[String] {
        &self.schema.translatables
    }

    pub fn ignored_for_translation(&self) -> &[String] {
        &self.ignored
    }

    pub fn non_translatable_pivots(&self) -> &[String] {
        &self.schema.pivots
    }

    pub fn is_translatable(&self, field: &str) -> bool {
        self.schema.translatables.iter().any(|f| f == field)
    }

    pub fn is_pivot(&self, field: &str) -> bool {
        self.schema.pivots.iter().any(|f| f == field)
    }

    /// Every column of the entity table.
    pub fn all_attributes(&self) -> &[String] {
        &self.schema.columns
    }

    /// Columns that are neither translatable, ignored, nor pivots.
    pub fn non_translatables(&self) -> Vec<String> {
        self.schema
            .columns
            .iter()
            .filter(|c| {
                !self.is_translatable(c) && !self.ignored.contains(c) && !self.is_pivot(c)
            })
            .cloned()
            .collect()
    }

    /// Non-translatables followed by the ignored fields and the pivots.
    pub fn all_non_translatables(&self) -> Vec<String> {
        let mut all = self.non_translatables();
        all.extend(self.ignored.iter().cloned());
        all.extend(self.schema.pivots.iter().cloned());
        all
    }

    /// Expand each translatable entry of `fields` with one `field_<code>`
    /// entry per locale code, right after the field itself.
    pub fn suffix_translatables<S: AsRef<str>>(&self, fields: &[S], codes: &[String]) -> Vec<String> {
        let mut expanded = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref();
            expanded.push(field.to_string());
            if self.is_translatable(field) {
                expanded.extend(codes.iter().map(|code| suffixed(field, code)));
            }
        }
        expanded
    }
}
