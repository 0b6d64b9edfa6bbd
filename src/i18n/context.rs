//! Per-operation locale context.
//!
//! Carries the current locale of one request or call chain together with a
//! handle to the shared [`LocaleRegistry`]. Every translation operation
//! takes a context instead of reading a process-wide locale.

use crate::error::Result;
use crate::i18n::locale::{Direction, Locale};
use crate::i18n::registry::{LocaleFilter, LocaleRegistry};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct LocaleContext {
    registry: Arc<LocaleRegistry>,
    current: String,
    ambient: String,
}

impl LocaleContext {
    /// Create a context positioned on the registry's default locale.
    pub fn new(registry: Arc<LocaleRegistry>) -> Self {
        let default = registry.default_locale_code().to_string();
        Self::with_locale(registry, default)
    }

    /// Create a context positioned on `code`.
    pub fn with_locale(registry: Arc<LocaleRegistry>, code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            registry,
            ambient: code.clone(),
            current: code,
        }
    }

    pub fn registry(&self) -> &LocaleRegistry {
        &self.registry
    }

    /// Locale used when an operation does not name one.
    pub fn current_locale_code(&self) -> &str {
        &self.current
    }

    /// Alias of [`current_locale_code`](Self::current_locale_code).
    pub fn current_language_code(&self) -> &str {
        self.current_locale_code()
    }

    /// Locale exposed to outer collaborators (views, formatting).
    pub fn ambient_locale_code(&self) -> &str {
        &self.ambient
    }

    /// Switch the current locale.
    ///
    /// With `also_set_ambient` false only the tracked translation locale
    /// moves; the ambient locale seen by collaborators stays put.
    pub fn set_current_locale(&mut self, code: &str, also_set_ambient: bool) {
        debug!(
            "Current locale {} -> {} (ambient: {})",
            self.current, code, also_set_ambient
        );
        self.current = code.to_string();
        if also_set_ambient {
            self.ambient = code.to_string();
        }
    }

    /// Switch both locales to the default translation locale.
    pub fn set_to_translation_locale(&mut self) {
        let code = self.registry.default_locale_code().to_string();
        self.set_current_locale(&code, true);
    }

    /// Switch both locales to the application fallback locale.
    pub fn set_to_app_locale(&mut self) {
        let code = self.registry.default_app_locale().to_string();
        self.set_current_locale(&code, true);
    }

    pub fn default_locale_code(&self) -> &str {
        self.registry.default_locale_code()
    }

    pub fn languages(&self, filter: &LocaleFilter) -> Result<Vec<Locale>> {
        self.registry.get_locales(filter)
    }

    /// All active locales except the current one.
    pub fn all_except_current(&self) -> Result<Vec<Locale>> {
        Ok(self
            .registry
            .all()?
            .into_iter()
            .filter(|l| l.code != self.current)
            .collect())
    }

    /// Get a locale by code, or the current locale when `code` is `None`.
    ///
    /// Unknown codes give `None`, never the default locale.
    pub fn get_locale(&self, code: Option<&str>) -> Result<Option<Locale>> {
        self.registry.find(code.unwrap_or(self.current.as_str()))
    }

    /// Check if a code is a registered, active locale.
    pub fn has(&self, code: &str) -> Result<bool> {
        self.registry.is_valid(code)
    }

    pub fn is_current(&self, code: &str) -> bool {
        code == self.current
    }

    /// Check if `code` (or the current locale) is the default locale.
    pub fn is_default(&self, code: Option<&str>) -> bool {
        code.unwrap_or(self.current.as_str()) == self.registry.default_locale_code()
    }

    /// Text direction of `code` (or the current locale).
    pub fn direction(&self, code: Option<&str>) -> Result<Direction> {
        self.registry.direction(code.unwrap_or(self.current.as_str()))
    }
}
