use crate::record::RecordId;
use thiserror::Error;

/// Result alias used by every translation operation.
pub type Result<T> = std::result::Result<T, TranslationError>;

/// Errors raised by the translation write paths and the locale registry.
///
/// Read paths never produce the three validation variants; a missing
/// translation resolves through fallback instead.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The locale is not in the active, registered set.
    #[error("{locale} language not allowed")]
    LanguageNotAllowed { locale: String },

    /// The field is not declared translatable for the entity.
    #[error("{field} field not allowed for locale {locale}")]
    FieldNotAllowed { field: String, locale: String },

    /// The locale holds the default (primary) representation of the record.
    #[error("Cannot delete {locale} as it is the primary language for this translation.")]
    CannotDeletePrimaryTranslation { locale: String },

    /// A record referenced by key does not exist (or is trashed).
    #[error("record {0} not found")]
    RecordNotFound(RecordId),

    /// Failure of the locale backing store or cache.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl TranslationError {
    pub fn language_not_allowed(locale: &str) -> Self {
        Self::LanguageNotAllowed {
            locale: locale.to_string(),
        }
    }

    pub fn field_not_allowed(field: &str, locale: &str) -> Self {
        Self::FieldNotAllowed {
            field: field.to_string(),
            locale: locale.to_string(),
        }
    }

    pub fn cannot_delete_primary(locale: &str) -> Self {
        Self::CannotDeletePrimaryTranslation {
            locale: locale.to_string(),
        }
    }
}
