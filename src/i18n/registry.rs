//! Locale registry: single source of truth for the allowed locales.
//!
//! The registry loads the active locales from a [`LocaleSource`], keeps the
//! snapshot in memory and in a [`CacheStore`] under a configurable key, and
//! answers "is this locale allowed" and "what is the default locale".
//!
//! The registry is an explicitly constructed, shareable value (wrap it in an
//! `Arc`). Writes to the backing store must be followed by
//! [`LocaleRegistry::forget_cached_locales`], otherwise the old snapshot is
//! served until it expires. The in-memory snapshot expires on the same
//! `cache_expiration` as the cache entry.

use crate::config::Config;
use crate::error::{Result, TranslationError};
use crate::i18n::cache::{cache_store_for_driver, CacheStore};
use crate::i18n::locale::{Direction, Locale};
use crate::i18n::metrics::RegistryMetrics;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Backing store for the registry's locale list.
pub trait LocaleSource: Send + Sync {
    /// All active, non-deleted locales, in display order.
    fn active_locales(&self) -> anyhow::Result<Vec<Locale>>;
}

/// A fixed locale list, usually built from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticLocales {
    locales: Vec<Locale>,
}

impl StaticLocales {
    pub fn new(locales: Vec<Locale>) -> Self {
        Self { locales }
    }

    /// Locales listed in `allowed_translation_locales`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.allowed_translation_locales.clone())
    }
}

impl LocaleSource for StaticLocales {
    fn active_locales(&self) -> anyhow::Result<Vec<Locale>> {
        Ok(self.locales.iter().filter(|l| l.active).cloned().collect())
    }
}

/// Exact-match filter applied to the cached locale list.
///
/// # Example
/// ```ignore
/// let rtl = registry.get_locales(&LocaleFilter::default().rtl(true))?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleFilter {
    code: Option<String>,
    locale: Option<String>,
    is_rtl: Option<bool>,
}

impl LocaleFilter {
    /// Filter on the locale code.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Filter on the display locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Filter on text direction.
    pub fn rtl(mut self, is_rtl: bool) -> Self {
        self.is_rtl = Some(is_rtl);
        self
    }

    /// Check whether a locale passes every set criterion.
    pub fn matches(&self, locale: &Locale) -> bool {
        self.code.as_ref().map_or(true, |c| *c == locale.code)
            && self.locale.as_ref().map_or(true, |l| *l == locale.locale)
            && self.is_rtl.map_or(true, |rtl| rtl == locale.is_rtl)
    }
}

/// In-memory copy of the locale list.
struct Snapshot {
    locales: Vec<Locale>,
    // None when the expiration is too large to represent
    expires_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn new(locales: Vec<Locale>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        Self { locales, expires_at }
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.locales.is_empty() || self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Cached directory of valid locales.
pub struct LocaleRegistry {
    source: Arc<dyn LocaleSource>,
    cache: Arc<dyn CacheStore>,
    cache_key: String,
    cache_expiration: Duration,
    ephemeral: bool,
    default_locale: String,
    fallback_app_locale: String,
    snapshot: Mutex<Option<Snapshot>>,
    metrics: RegistryMetrics,
}

impl LocaleRegistry {
    /// Create a registry with an explicit cache store.
    pub fn new(source: Arc<dyn LocaleSource>, cache: Arc<dyn CacheStore>, config: &Config) -> Self {
        Self {
            source,
            cache,
            cache_key: config.cache_key.clone(),
            cache_expiration: config.cache_expiration,
            ephemeral: config.ephemeral,
            default_locale: config.default_locale.clone(),
            fallback_app_locale: config.fallback_app_locale.clone(),
            snapshot: Mutex::new(None),
            metrics: RegistryMetrics::new(),
        }
    }

    /// Create a registry whose cache store is picked by `config.cache_driver`.
    pub fn from_config(source: Arc<dyn LocaleSource>, config: &Config) -> Self {
        Self::new(source, cache_store_for_driver(&config.cache_driver), config)
    }

    /// Get the active locales matching `filter`, in source order.
    ///
    /// The first call loads the snapshot (from cache, else from the source).
    /// An empty snapshot is never trusted: it is invalidated and refetched on
    /// the next call.
    ///
    /// # Errors
    /// Propagates source failures unless the registry runs in ephemeral mode,
    /// where the failure is logged and an empty list is returned.
    pub fn get_locales(&self, filter: &LocaleFilter) -> Result<Vec<Locale>> {
        let locales = self.load()?;
        Ok(locales.into_iter().filter(|l| filter.matches(l)).collect())
    }

    /// All active locales.
    pub fn all(&self) -> Result<Vec<Locale>> {
        self.get_locales(&LocaleFilter::default())
    }

    /// Codes of all active locales.
    pub fn codes(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_iter().map(|l| l.code).collect())
    }

    /// Find an active locale by code.
    ///
    /// # Returns
    /// * `Ok(Some(Locale))` if the code is registered and active
    /// * `Ok(None)` otherwise. Callers must not substitute the default locale.
    pub fn find(&self, code: &str) -> Result<Option<Locale>> {
        Ok(self
            .get_locales(&LocaleFilter::default().code(code))?
            .into_iter()
            .next())
    }

    /// Check if a locale code is registered and active.
    pub fn is_valid(&self, code: &str) -> Result<bool> {
        Ok(self.load()?.iter().any(|l| l.code == code))
    }

    /// Configured default translation locale.
    pub fn default_locale_code(&self) -> &str {
        &self.default_locale
    }

    /// Configured application fallback locale.
    pub fn default_app_locale(&self) -> &str {
        &self.fallback_app_locale
    }

    /// Text direction of a locale. Unknown codes read left to right.
    pub fn direction(&self, code: &str) -> Result<Direction> {
        Ok(self
            .find(code)?
            .map(|l| l.direction())
            .unwrap_or(Direction::Ltr))
    }

    /// Drop the in-memory snapshot and the cache entry.
    pub fn forget_cached_locales(&self) {
        let mut slot = self.slot();
        self.forget(&mut slot);
    }

    pub fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }

    fn slot(&self) -> MutexGuard<'_, Option<Snapshot>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn forget(&self, slot: &mut Option<Snapshot>) {
        *slot = None;
        self.cache.forget(&self.cache_key);
        self.metrics.record_invalidation();
        debug!("Forgot cached locales under '{}'", self.cache_key);
    }

    fn load(&self) -> Result<Vec<Locale>> {
        let mut slot = self.slot();

        if let Some(snapshot) = slot.as_ref() {
            if !snapshot.is_stale(Utc::now()) {
                return Ok(snapshot.locales.clone());
            }
        }

        // An empty snapshot is never trusted
        if slot.as_ref().is_some_and(|s| s.locales.is_empty()) {
            self.forget(&mut slot);
        } else if slot.take().is_some() {
            debug!("Locale snapshot expired");
        }

        let locales = match self.cached() {
            Some(locales) => {
                self.metrics.record_cache_hit();
                locales
            }
            None => {
                self.metrics.record_cache_miss();
                let fetched = self.fetch()?;
                if !fetched.is_empty() {
                    let value = serde_json::to_value(&fetched)
                        .context("Failed to serialize locale snapshot")?;
                    self.cache.put(&self.cache_key, value, self.cache_expiration);
                }
                fetched
            }
        };

        *slot = Some(Snapshot::new(locales.clone(), self.cache_expiration));
        Ok(locales)
    }

    fn cached(&self) -> Option<Vec<Locale>> {
        let value = self.cache.get(&self.cache_key)?;
        match serde_json::from_value(value) {
            Ok(locales) => Some(locales),
            Err(e) => {
                warn!("Discarding unreadable locale cache entry: {}", e);
                self.cache.forget(&self.cache_key);
                None
            }
        }
    }

    fn fetch(&self) -> Result<Vec<Locale>> {
        self.metrics.record_fetch();
        match self.source.active_locales() {
            Ok(locales) => {
                debug!("Loaded {} active locales", locales.len());
                Ok(locales)
            }
            Err(e) => {
                self.metrics.record_fetch_failure();
                if self.ephemeral {
                    error!("LanguageRegistrarError: {:#}", e);
                    return Ok(Vec::new());
                }
                Err(TranslationError::Storage(
                    e.context("Failed to load active locales"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::cache::{MemoryCache, NullCache};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Source whose contents and health can change between calls.
    #[derive(Default)]
    struct FlakySource {
        locales: Mutex<Vec<Locale>>,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    impl FlakySource {
        fn with(locales: Vec<Locale>) -> Arc<Self> {
            Arc::new(Self {
                locales: Mutex::new(locales),
                ..Default::default()
            })
        }

        fn set(&self, locales: Vec<Locale>) {
            *self.locales.lock().unwrap() = locales;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LocaleSource for FlakySource {
        fn active_locales(&self) -> anyhow::Result<Vec<Locale>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                anyhow::bail!("no such table: languages");
            }
            Ok(self.locales.lock().unwrap().clone())
        }
    }

    fn default_locales() -> Vec<Locale> {
        Config::default().allowed_translation_locales
    }

    fn registry_with(source: Arc<FlakySource>, config: &Config) -> LocaleRegistry {
        LocaleRegistry::new(source, Arc::new(MemoryCache::new()), config)
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_all_returns_active_locales_in_order() {
        let registry = registry_with(FlakySource::with(default_locales()), &Config::default());
        let codes = registry.codes().expect("Should load");
        assert_eq!(codes, vec!["en", "dv", "jp"]);
    }

    #[test]
    fn test_find_existing_locale() {
        let registry = registry_with(FlakySource::with(default_locales()), &Config::default());
        let dv = registry.find("dv").expect("Should load").expect("dv exists");
        assert_eq!(dv.name, "Dhivehi");
        assert!(dv.is_rtl);
    }

    #[test]
    fn test_find_unknown_locale_is_none() {
        let registry = registry_with(FlakySource::with(default_locales()), &Config::default());
        assert!(registry.find("fr").expect("Should load").is_none());
    }

    #[test]
    fn test_is_valid() {
        let registry = registry_with(FlakySource::with(default_locales()), &Config::default());
        assert!(registry.is_valid("en").unwrap());
        assert!(registry.is_valid("jp").unwrap());
        assert!(!registry.is_valid("fr").unwrap());
    }

    #[test]
    fn test_filter_by_direction() {
        let registry = registry_with(FlakySource::with(default_locales()), &Config::default());
        let rtl = registry
            .get_locales(&LocaleFilter::default().rtl(true))
            .unwrap();
        assert_eq!(rtl.len(), 1);
        assert_eq!(rtl[0].code, "dv");
    }

    #[test]
    fn test_direction() {
        let registry = registry_with(FlakySource::with(default_locales()), &Config::default());
        assert_eq!(registry.direction("dv").unwrap(), Direction::Rtl);
        assert_eq!(registry.direction("en").unwrap(), Direction::Ltr);
        assert_eq!(registry.direction("fr").unwrap(), Direction::Ltr);
    }

    #[test]
    fn test_default_locale_is_configured_value() {
        let config = Config {
            default_locale: "dv".to_string(),
            ..Config::default()
        };
        let registry = registry_with(FlakySource::with(default_locales()), &config);
        assert_eq!(registry.default_locale_code(), "dv");
        assert_eq!(registry.default_app_locale(), "en");
    }

    #[test]
    fn test_static_locales_skip_inactive() {
        let source = StaticLocales::new(vec![
            Locale::new("en", "English"),
            Locale::new("fr", "French").inactive(),
        ]);
        let codes: Vec<_> = source
            .active_locales()
            .unwrap()
            .into_iter()
            .map(|l| l.code)
            .collect();
        assert_eq!(codes, vec!["en"]);
    }

    // ==================== Caching Tests ====================

    #[test]
    fn test_snapshot_is_reused() {
        let source = FlakySource::with(default_locales());
        let registry = registry_with(source.clone(), &Config::default());

        registry.all().unwrap();
        registry.all().unwrap();
        registry.find("dv").unwrap();

        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_stale_until_forgotten() {
        let source = FlakySource::with(default_locales());
        let registry = registry_with(source.clone(), &Config::default());
        assert!(!registry.is_valid("fr").unwrap());

        source.set(vec![Locale::new("fr", "French")]);
        assert!(!registry.is_valid("fr").unwrap(), "served from snapshot");

        registry.forget_cached_locales();
        assert!(registry.is_valid("fr").unwrap());
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn test_snapshot_expires_with_cache_expiration() {
        let source = FlakySource::with(default_locales());
        let config = Config {
            cache_expiration: Duration::from_millis(50),
            ..Config::default()
        };
        let registry = registry_with(source.clone(), &config);
        assert!(!registry.is_valid("fr").unwrap());

        source.set(vec![Locale::new("fr", "French")]);
        assert!(!registry.is_valid("fr").unwrap(), "served until expiry");

        std::thread::sleep(Duration::from_millis(200));
        assert!(registry.is_valid("fr").expect("Should reload after expiry"));
        assert_eq!(source.calls(), 2);
        assert_eq!(registry.metrics().invalidations(), 0);
    }

    #[test]
    fn test_shared_cache_serves_second_registry() {
        let source = FlakySource::with(default_locales());
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let first = LocaleRegistry::new(source.clone(), cache.clone(), &Config::default());
        let second = LocaleRegistry::new(source.clone(), cache, &Config::default());

        first.all().unwrap();
        second.all().unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(second.metrics().cache_hits(), 1);
        assert_eq!(first.metrics().cache_misses(), 1);
    }

    #[test]
    fn test_empty_result_is_refetched() {
        let source = FlakySource::with(Vec::new());
        let registry = registry_with(source.clone(), &Config::default());

        assert!(registry.all().unwrap().is_empty());
        source.set(default_locales());

        assert_eq!(registry.all().unwrap().len(), 3);
        assert_eq!(source.calls(), 2);
        assert_eq!(registry.metrics().invalidations(), 1);
    }

    #[test]
    fn test_null_cache_still_keeps_snapshot() {
        let source = FlakySource::with(default_locales());
        let registry = LocaleRegistry::new(source.clone(), Arc::new(NullCache), &Config::default());

        registry.all().unwrap();
        registry.all().unwrap();
        assert_eq!(source.calls(), 1);
    }

    // ==================== Failure Tests ====================

    #[test]
    fn test_source_failure_propagates() {
        let source = FlakySource::with(default_locales());
        source.failing.store(true, Ordering::SeqCst);
        let registry = registry_with(source, &Config::default());

        let err = registry.all().expect_err("Should fail");
        assert!(matches!(err, TranslationError::Storage(_)));
        assert_eq!(registry.metrics().fetch_failures(), 1);
    }

    #[test]
    fn test_source_failure_swallowed_when_ephemeral() {
        let source = FlakySource::with(default_locales());
        source.failing.store(true, Ordering::SeqCst);
        let config = Config {
            ephemeral: true,
            ..Config::default()
        };
        let registry = registry_with(source.clone(), &config);

        assert!(registry.all().expect("Should swallow").is_empty());

        // Recovers once the store is provisioned
        source.failing.store(false, Ordering::SeqCst);
        assert_eq!(registry.all().unwrap().len(), 3);
    }
}
