//! Per-locale field translations for records.
//!
//! An entity type declares which of its fields are translatable and picks a
//! storage strategy: [`RowStore`] keeps one sibling row per locale,
//! [`EmbeddedStore`] keeps a translation map on the record. Both implement
//! [`TranslationStore`], which resolves reads with fallback to the default
//! variant and validates writes against the [`LocaleRegistry`].
//!
//! ```rust,ignore
//! let config = Config::default();
//! let registry = Arc::new(LocaleRegistry::from_config(
//!     Arc::new(StaticLocales::from_config(&config)),
//!     &config,
//! ));
//! let ctx = LocaleContext::new(registry);
//!
//! let schema = EntitySchema::new("articles", StrategyKind::Embedded, ["title", "slug"])
//!     .translatables(["title"]);
//! let mut store = EmbeddedStore::new(schema, &config);
//!
//! let mut article = Record::from_attributes([("title", json!("Hello"))]);
//! store.save(&ctx, &mut article)?;
//! store.add_translation(&ctx, &mut article, "dv", "title", json!("ހެލޯ"))?;
//! assert_eq!(read_attribute(&store, &ctx, &article, "title_dv")?, Some(json!("ހެލޯ")));
//! ```

pub mod attributes;
pub mod config;
pub mod db;
pub mod embedded_store;
pub mod error;
pub mod i18n;
pub mod record;
pub mod row_store;
pub mod schema;
pub mod suffix;
pub mod translatable;

pub use attributes::{read_attribute, AttributeInterceptor, ModelAttribute};
pub use config::Config;
pub use embedded_store::EmbeddedStore;
pub use error::{Result, TranslationError};
pub use i18n::{Locale, LocaleContext, LocaleFilter, LocaleRegistry, LocaleSource, StaticLocales};
pub use record::{Attributes, Record, RecordId, RecordTable, TranslationMap};
pub use row_store::RowStore;
pub use schema::{EntitySchema, FieldClassifier, StrategyKind};
pub use translatable::TranslationStore;
