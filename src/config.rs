use crate::i18n::Locale;
use anyhow::{bail, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Locales
    pub default_locale: String,
    pub fallback_app_locale: String,
    pub allowed_translation_locales: Vec<Locale>,

    // Field classification
    pub fields_ignored_for_translation: Vec<String>,

    // Attribute access
    pub lang_suffix_should_fallback: bool,

    // Locale cache
    pub cache_key: String,
    pub cache_expiration: Duration,
    pub cache_driver: String,

    // Swallow locale store failures (tests, first boot)
    pub ephemeral: bool,

    // Database
    pub database_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            fallback_app_locale: "en".to_string(),
            allowed_translation_locales: vec![
                Locale::new("en", "English").with_flag("gb"),
                Locale::new("dv", "Dhivehi").with_flag("mv").rtl(),
                Locale::new("jp", "Japanese"),
            ],
            fields_ignored_for_translation: ["id", "lang", "created_at", "updated_at", "deleted_at"]
                .into_iter()
                .map(String::from)
                .collect(),
            lang_suffix_should_fallback: false,
            cache_key: "languages_cache".to_string(),
            cache_expiration: Duration::from_secs(24 * 60 * 60),
            cache_driver: "default".to_string(),
            ephemeral: false,
            database_path: "translatable.db".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            // Locales
            default_locale: std::env::var("TRANSLATABLE_DEFAULT_LOCALE")
                .unwrap_or(defaults.default_locale),
            fallback_app_locale: std::env::var("APP_FALLBACK_LOCALE")
                .unwrap_or(defaults.fallback_app_locale),
            allowed_translation_locales: match std::env::var("TRANSLATABLE_LOCALES") {
                Ok(value) => parse_locales(&value).context("Invalid TRANSLATABLE_LOCALES")?,
                Err(_) => defaults.allowed_translation_locales,
            },

            // Field classification
            fields_ignored_for_translation: std::env::var("TRANSLATABLE_IGNORED_FIELDS")
                .map(|value| parse_list(&value))
                .unwrap_or(defaults.fields_ignored_for_translation),

            // Attribute access
            lang_suffix_should_fallback: match std::env::var("TRANSLATABLE_SUFFIX_FALLBACK") {
                Ok(value) => parse_bool(&value).context("Invalid TRANSLATABLE_SUFFIX_FALLBACK")?,
                Err(_) => defaults.lang_suffix_should_fallback,
            },

            // Locale cache
            cache_key: std::env::var("TRANSLATABLE_CACHE_KEY").unwrap_or(defaults.cache_key),
            cache_expiration: match std::env::var("TRANSLATABLE_CACHE_TTL_SECS") {
                Ok(value) => Duration::from_secs(
                    value
                        .trim()
                        .parse()
                        .context("Invalid TRANSLATABLE_CACHE_TTL_SECS")?,
                ),
                Err(_) => defaults.cache_expiration,
            },
            cache_driver: std::env::var("TRANSLATABLE_CACHE_DRIVER")
                .unwrap_or(defaults.cache_driver),

            ephemeral: match std::env::var("TRANSLATABLE_EPHEMERAL") {
                Ok(value) => parse_bool(&value).context("Invalid TRANSLATABLE_EPHEMERAL")?,
                Err(_) => defaults.ephemeral,
            },

            // Database
            database_path: std::env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
        })
    }
}

/// Split a comma separated list, dropping blank entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("Expected a boolean, got '{}'", other),
    }
}

/// Parse `code=Name[:rtl]` entries, e.g. `en=English,dv=Dhivehi:rtl`.
fn parse_locales(value: &str) -> Result<Vec<Locale>> {
    parse_list(value)
        .iter()
        .map(|entry| {
            let (code, rest) = entry
                .split_once('=')
                .with_context(|| format!("Expected code=Name, got '{}'", entry))?;
            let (name, rtl) = match rest.rsplit_once(':') {
                Some((name, "rtl")) => (name, true),
                _ => (rest, false),
            };
            let code = code.trim();
            if !crate::i18n::is_valid_locale_code(code) {
                bail!("Invalid locale code '{}'", code);
            }
            let locale = Locale::new(code, name.trim());
            Ok(if rtl { locale.rtl() } else { locale })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 10] = [
        "TRANSLATABLE_DEFAULT_LOCALE",
        "APP_FALLBACK_LOCALE",
        "TRANSLATABLE_LOCALES",
        "TRANSLATABLE_IGNORED_FIELDS",
        "TRANSLATABLE_SUFFIX_FALLBACK",
        "TRANSLATABLE_CACHE_KEY",
        "TRANSLATABLE_CACHE_TTL_SECS",
        "TRANSLATABLE_CACHE_DRIVER",
        "TRANSLATABLE_EPHEMERAL",
        "DATABASE_PATH",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    // ==================== Default Tests ====================

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.default_locale, "en");
        assert_eq!(
            config.fields_ignored_for_translation,
            vec!["id", "lang", "created_at", "updated_at", "deleted_at"]
        );
        assert!(!config.lang_suffix_should_fallback);
        assert_eq!(config.cache_key, "languages_cache");
        assert_eq!(config.cache_expiration, Duration::from_secs(86_400));
        assert!(!config.ephemeral);

        let codes: Vec<_> = config
            .allowed_translation_locales
            .iter()
            .map(|l| l.code.as_str())
            .collect();
        assert_eq!(codes, vec!["en", "dv", "jp"]);
        assert!(config.allowed_translation_locales[1].is_rtl);
    }

    // ==================== from_env Tests ====================

    #[test]
    #[serial]
    fn test_from_env_uses_defaults_when_unset() {
        clear_env();
        let config = Config::from_env().expect("Should load config");

        assert_eq!(config.default_locale, "en");
        assert_eq!(config.database_path, "translatable.db");
        assert_eq!(config.cache_driver, "default");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        clear_env();
        std::env::set_var("TRANSLATABLE_DEFAULT_LOCALE", "dv");
        std::env::set_var("TRANSLATABLE_LOCALES", "dv=Dhivehi:rtl, en=English");
        std::env::set_var("TRANSLATABLE_IGNORED_FIELDS", "id, lang ,,published_at");
        std::env::set_var("TRANSLATABLE_SUFFIX_FALLBACK", "true");
        std::env::set_var("TRANSLATABLE_CACHE_TTL_SECS", "60");
        std::env::set_var("TRANSLATABLE_EPHEMERAL", "1");

        let config = Config::from_env().expect("Should load config");
        clear_env();

        assert_eq!(config.default_locale, "dv");
        assert_eq!(config.allowed_translation_locales.len(), 2);
        assert!(config.allowed_translation_locales[0].is_rtl);
        assert_eq!(config.allowed_translation_locales[1].name, "English");
        assert_eq!(
            config.fields_ignored_for_translation,
            vec!["id", "lang", "published_at"]
        );
        assert!(config.lang_suffix_should_fallback);
        assert_eq!(config.cache_expiration, Duration::from_secs(60));
        assert!(config.ephemeral);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_ttl() {
        clear_env();
        std::env::set_var("TRANSLATABLE_CACHE_TTL_SECS", "forever");
        let result = Config::from_env();
        clear_env();

        let err = result.expect_err("Should reject non-numeric ttl");
        assert!(err.to_string().contains("TRANSLATABLE_CACHE_TTL_SECS"));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_locale_code() {
        clear_env();
        std::env::set_var("TRANSLATABLE_LOCALES", "pt_br=Portuguese");
        let result = Config::from_env();
        clear_env();

        assert!(result.is_err());
    }

    // ==================== Parser Tests ====================

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(parse_bool(" yes ").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn test_parse_locales_requires_name() {
        assert!(parse_locales("en").is_err());
    }
}
