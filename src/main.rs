use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use translatable::config::Config;
use translatable::db::Database;
use translatable::i18n::{LocaleContext, LocaleRegistry};

fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translatable=info".parse()?),
        )
        .init();

    info!("Provisioning translatable languages");

    let config = Config::from_env()?;
    let db = Database::new(&config.database_path)?;

    // Seed configured locales missing from the languages table
    let mut seeded = 0;
    for locale in &config.allowed_translation_locales {
        match db.find_language(&locale.code)? {
            Some(existing) if existing.is_deleted() => {
                warn!("Language {} was removed, not reseeding", locale.code)
            }
            Some(_) => {}
            None => {
                db.add_language(locale)?;
                seeded += 1;
            }
        }
    }
    info!(
        "Seeded {} language(s), {} in database",
        seeded,
        db.language_count()?
    );

    let registry = Arc::new(LocaleRegistry::from_config(Arc::new(db), &config));
    let ctx = LocaleContext::new(registry.clone());

    for locale in registry.all()? {
        info!(
            "{} ({}) {} [{}]",
            locale.code,
            locale.locale,
            locale.name,
            locale.direction()
        );
    }
    info!(
        "Default locale: {} (current: {})",
        ctx.default_locale_code(),
        ctx.current_language_code()
    );
    if !ctx.has(ctx.default_locale_code())? {
        warn!(
            "Default locale {} is not an active language",
            ctx.default_locale_code()
        );
    }

    let report = registry.metrics().report();
    info!("Registry metrics: {}", serde_json::to_string(&report)?);

    Ok(())
}
