use crate::i18n::{is_valid_locale_code, Locale, LocaleSource};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A `languages` row, including soft-deleted ones.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLanguage {
    pub id: i64,
    pub locale: Locale,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl StoredLanguage {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

const LANGUAGE_COLUMNS: &str =
    "id, code, locale, name, local_name, flag, is_rtl, active, created_at, updated_at, deleted_at";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)
            .context(format!("Failed to open database at {}", database_path))?;
        Self::init(conn)
    }

    /// Throwaway database, mostly for demos and tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS languages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                locale TEXT NOT NULL,
                name TEXT NOT NULL,
                local_name TEXT,
                flag TEXT NOT NULL,
                is_rtl INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                deleted_at TEXT
            )",
            [],
        )
        .context("Failed to create languages table")?;

        // One live row per code; soft-deleted rows may repeat it
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS languages_live_code
             ON languages (code) WHERE deleted_at IS NULL",
            [],
        )
        .context("Failed to create languages code index")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new language and return its row id.
    ///
    /// Fails if the code is malformed or a live language already uses it.
    pub fn add_language(&self, locale: &Locale) -> Result<i64> {
        if !is_valid_locale_code(&locale.code) {
            bail!("Invalid locale code '{}'", locale.code);
        }

        let conn = self.conn();
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) FROM languages WHERE code = ?1 AND deleted_at IS NULL",
            params![locale.code],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )?;
        if exists {
            bail!("Language '{}' already exists", locale.code);
        }

        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO languages (code, locale, name, local_name, flag, is_rtl, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                locale.code,
                locale.locale,
                locale.name,
                locale.local_name,
                locale.flag,
                locale.is_rtl,
                locale.active,
                now
            ],
        )
        .context(format!("Failed to add language {}", locale.code))?;

        Ok(conn.last_insert_rowid())
    }

    /// Overwrite the metadata of the live language with the same code
    pub fn update_language(&self, locale: &Locale) -> Result<bool> {
        let conn = self.conn();
        let rows_affected = conn
            .execute(
                "UPDATE languages
                 SET locale = ?1, name = ?2, local_name = ?3, flag = ?4, is_rtl = ?5, active = ?6, updated_at = ?7
                 WHERE code = ?8 AND deleted_at IS NULL",
                params![
                    locale.locale,
                    locale.name,
                    locale.local_name,
                    locale.flag,
                    locale.is_rtl,
                    locale.active,
                    Utc::now().to_rfc3339(),
                    locale.code
                ],
            )
            .context("Failed to update language")?;

        Ok(rows_affected > 0)
    }

    pub fn set_active(&self, code: &str, active: bool) -> Result<bool> {
        let conn = self.conn();
        let rows_affected = conn
            .execute(
                "UPDATE languages SET active = ?1, updated_at = ?2
                 WHERE code = ?3 AND deleted_at IS NULL AND active != ?1",
                params![active, Utc::now().to_rfc3339(), code],
            )
            .context("Failed to change language status")?;

        Ok(rows_affected > 0)
    }

    /// Remove a language (soft delete - sets deleted_at)
    pub fn remove_language(&self, code: &str) -> Result<bool> {
        let conn = self.conn();
        let rows_affected = conn
            .execute(
                "UPDATE languages SET deleted_at = ?1 WHERE code = ?2 AND deleted_at IS NULL",
                params![Utc::now().to_rfc3339(), code],
            )
            .context("Failed to remove language")?;

        Ok(rows_affected > 0)
    }

    /// Bring back the most recently deleted row for a code
    pub fn restore_language(&self, code: &str) -> Result<bool> {
        let conn = self.conn();
        let rows_affected = conn
            .execute(
                "UPDATE languages SET deleted_at = NULL, updated_at = ?1
                 WHERE id = (
                    SELECT id FROM languages
                    WHERE code = ?2 AND deleted_at IS NOT NULL
                    ORDER BY deleted_at DESC, id DESC LIMIT 1
                 )",
                params![Utc::now().to_rfc3339(), code],
            )
            .context(format!("Failed to restore language {}", code))?;

        Ok(rows_affected > 0)
    }

    /// Latest row for a code, deleted or not
    pub fn find_language(&self, code: &str) -> Result<Option<StoredLanguage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM languages WHERE code = ?1
             ORDER BY deleted_at IS NULL DESC, id DESC LIMIT 1",
            LANGUAGE_COLUMNS
        ))?;

        let language = stmt
            .query_row(params![code], stored_language_from_row)
            .optional()?;

        Ok(language)
    }

    /// Active, non-deleted languages in insertion order
    pub fn list_active_languages(&self) -> Result<Vec<Locale>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM languages
             WHERE active = 1 AND deleted_at IS NULL
             ORDER BY id ASC",
            LANGUAGE_COLUMNS
        ))?;

        let languages = stmt
            .query_map([], stored_language_from_row)?
            .map(|row| row.map(|language| language.locale))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(languages)
    }

    /// Count of non-deleted languages, active or not
    pub fn language_count(&self) -> Result<usize> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM languages WHERE deleted_at IS NULL")?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn stored_language_from_row(row: &Row<'_>) -> rusqlite::Result<StoredLanguage> {
    Ok(StoredLanguage {
        id: row.get(0)?,
        locale: Locale {
            code: row.get(1)?,
            locale: row.get(2)?,
            name: row.get(3)?,
            local_name: row.get(4)?,
            flag: row.get(5)?,
            is_rtl: row.get::<_, i64>(6)? != 0,
            active: row.get::<_, i64>(7)? != 0,
        },
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        deleted_at: row.get(10)?,
    })
}

impl LocaleSource for Database {
    fn active_locales(&self) -> Result<Vec<Locale>> {
        self.list_active_languages()
            .context("Failed to list active languages")
    }
}
