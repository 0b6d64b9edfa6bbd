//! Locale support: the registry of allowed locales and the per-operation
//! locale context.
//!
//! # Architecture
//!
//! - `locale`: `Locale` metadata, text direction, code validation
//! - `registry`: cached directory of active locales behind a `LocaleSource`
//! - `cache`: cache stores used by the registry
//! - `metrics`: registry cache/fetch counters
//! - `context`: current locale plus registry handle, passed to every operation
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use translatable::i18n::{LocaleContext, LocaleRegistry, StaticLocales};
//!
//! let config = Config::default();
//! let source = Arc::new(StaticLocales::from_config(&config));
//! let registry = Arc::new(LocaleRegistry::from_config(source, &config));
//!
//! let mut ctx = LocaleContext::new(registry);
//! ctx.set_current_locale("dv", true);
//! assert!(ctx.has("dv")?);
//! ```

mod cache;
mod context;
mod locale;
mod metrics;
mod registry;

pub use cache::{cache_store_for_driver, CacheStore, MemoryCache, NullCache};
pub use context::LocaleContext;
pub use locale::{is_valid_locale_code, Direction, Locale, FLAG_URL_SUFFIX};
pub use metrics::{MetricsReport, RegistryMetrics};
pub use registry::{LocaleFilter, LocaleRegistry, LocaleSource, StaticLocales};
