//! Locale type: metadata for one allowed language.
//!
//! A `Locale` is what the registry hands out. It carries the code used as the
//! translation key, display metadata, text direction, and whether it is
//! currently active.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Suffix appended to a flag name when building its asset URL.
pub const FLAG_URL_SUFFIX: &str = ".svg";

static LOCALE_CODE: OnceLock<Regex> = OnceLock::new();

/// Check that a locale code is well formed.
///
/// Codes are lowercase language tags such as `en`, `dv` or `pt-br`. The
/// field/locale separator `_` is never allowed, so `title_pt-br` always splits
/// into `title` and `pt-br`.
pub fn is_valid_locale_code(code: &str) -> bool {
    LOCALE_CODE
        .get_or_init(|| {
            Regex::new(r"^[a-z]{2,3}(-[a-z0-9]{2,8})*$").expect("locale code pattern compiles")
        })
        .is_match(code)
}

/// Text direction of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered language.
///
/// Built with [`Locale::new`] and the `with_*` helpers; stored in the
/// `languages` table and cached by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    /// Unique code used as the translation key (e.g., "en", "dv")
    pub code: String,

    /// Locale used when displaying content in this language
    pub locale: String,

    /// English name of the language (e.g., "Dhivehi")
    pub name: String,

    /// Name of the language in the language itself
    pub local_name: Option<String>,

    /// Flag asset name (e.g., "mv")
    pub flag: String,

    /// Whether text in this language runs right to left
    pub is_rtl: bool,

    /// Whether the language is offered for translation
    pub active: bool,
}

impl Locale {
    /// Create an active, left-to-right locale whose display locale and flag
    /// default to its code.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            locale: code.clone(),
            flag: code.clone(),
            code,
            name: name.into(),
            local_name: None,
            is_rtl: false,
            active: true,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = flag.into();
        self
    }

    pub fn rtl(mut self) -> Self {
        self.is_rtl = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Text direction of this locale.
    pub fn direction(&self) -> Direction {
        if self.is_rtl {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }

    /// Build the flag asset URL under the given prefix.
    ///
    /// # Example
    /// ```ignore
    /// let url = Locale::new("dv", "Dhivehi").with_flag("mv").flag_url("/vendors/flags");
    /// assert_eq!(url, "/vendors/flags/mv.svg");
    /// ```
    pub fn flag_url(&self, prefix: &str) -> String {
        format!(
            "{}/{}{}",
            prefix.trim_end_matches('/'),
            self.flag,
            FLAG_URL_SUFFIX
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Code Validation Tests ====================

    #[test]
    fn test_valid_locale_codes() {
        assert!(is_valid_locale_code("en"));
        assert!(is_valid_locale_code("dv"));
        assert!(is_valid_locale_code("fil"));
        assert!(is_valid_locale_code("pt-br"));
    }

    #[test]
    fn test_invalid_locale_codes() {
        assert!(!is_valid_locale_code(""));
        assert!(!is_valid_locale_code("e"));
        assert!(!is_valid_locale_code("EN"));
        assert!(!is_valid_locale_code("pt_br"));
        assert!(!is_valid_locale_code("english"));
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_defaults() {
        let locale = Locale::new("en", "English");
        assert_eq!(locale.code, "en");
        assert_eq!(locale.locale, "en");
        assert_eq!(locale.flag, "en");
        assert!(locale.local_name.is_none());
        assert!(!locale.is_rtl);
        assert!(locale.active);
    }

    #[test]
    fn test_builder_helpers() {
        let locale = Locale::new("dv", "Dhivehi")
            .with_locale("dv-mv")
            .with_local_name("ދިވެހި")
            .with_flag("mv")
            .rtl()
            .inactive();

        assert_eq!(locale.locale, "dv-mv");
        assert_eq!(locale.local_name.as_deref(), Some("ދިވެހި"));
        assert_eq!(locale.flag, "mv");
        assert!(locale.is_rtl);
        assert!(!locale.active);
    }

    // ==================== Direction Tests ====================

    #[test]
    fn test_direction() {
        assert_eq!(Locale::new("en", "English").direction(), Direction::Ltr);
        assert_eq!(Locale::new("dv", "Dhivehi").rtl().direction(), Direction::Rtl);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Ltr.to_string(), "ltr");
        assert_eq!(Direction::Rtl.to_string(), "rtl");
    }

    #[test]
    fn test_flag_url() {
        let locale = Locale::new("dv", "Dhivehi").with_flag("mv");
        assert_eq!(locale.flag_url("/vendors/flags/"), "/vendors/flags/mv.svg");
        assert_eq!(locale.flag_url("/vendors/flags"), "/vendors/flags/mv.svg");
    }

    #[test]
    fn test_locale_serde_roundtrip() {
        let locale = Locale::new("jp", "Japanese").with_local_name("日本語");
        let json = serde_json::to_value(&locale).expect("serialize");
        assert_eq!(json["code"], "jp");
        let restored: Locale = serde_json::from_value(json).expect("deserialize");
        assert_eq!(restored, locale);
    }
}
