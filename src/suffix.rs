//! Locale-suffixed field names: `title_dv` addresses `title` in `dv`.

pub const LOCALE_SEPARATOR: char = '_';

/// Split `key` at its last separator into `(field, locale)`.
///
/// Returns `None` when there is no separator or either side is empty.
/// The locale part is not checked against the registry here.
pub fn split_locale_suffix(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once(LOCALE_SEPARATOR)
        .filter(|(field, locale)| !field.is_empty() && !locale.is_empty())
}

/// Build the suffixed name of `field` for `locale`.
pub fn suffixed(field: &str, locale: &str) -> String {
    format!("{}{}{}", field, LOCALE_SEPARATOR, locale)
}
