use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Localized name used when the name table has no row for a record.
pub const UNKNOWN_NAME: &str = "名前不明";
/// Localized type used when the type table has no row for a category.
pub const UNKNOWN_TYPE: &str = "タイプ不明";

static NAMES_JSON: &str = include_str!("../data/names.json");
static TYPES_JSON: &str = include_str!("../data/types.json");

static EMBEDDED: Lazy<TranslationTables> = Lazy::new(|| {
    TranslationTables::from_json(NAMES_JSON, TYPES_JSON).expect("embedded translation tables")
});

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid translation table: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localized {
    pub name: String,
    pub kind: String,
}

/// Read-only lookup from canonical English identifiers to localized strings.
pub trait TranslationLookup: Send + Sync {
    fn localized_name(&self, name: &str) -> Option<&str>;

    fn localized_type(&self, kind: &str) -> Option<&str>;

    /// Resolves both fields, substituting the unknown sentinels on a miss.
    fn localize(&self, name: &str, kind: &str) -> Localized {
        Localized {
            name: self.localized_name(name).unwrap_or(UNKNOWN_NAME).to_string(),
            kind: self.localized_type(kind).unwrap_or(UNKNOWN_TYPE).to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamePair {
    pub en: String,
    pub ja: String,
}

/// Name table keyed by lowercased English name plus an exact-match type
/// table. Loaded once and never updated.
#[derive(Debug, Clone, Default)]
pub struct TranslationTables {
    names: HashMap<String, String>,
    types: HashMap<String, String>,
}

impl TranslationTables {
    pub fn new<I>(pairs: I, types: HashMap<String, String>) -> Self
    where
        I: IntoIterator<Item = NamePair>,
    {
        let mut names = HashMap::new();
        for pair in pairs {
            // first row wins for case-colliding names
            names.entry(pair.en.to_lowercase()).or_insert(pair.ja);
        }
        Self { names, types }
    }

    pub fn from_json(names_json: &str, types_json: &str) -> Result<Self, TranslationError> {
        let pairs: Vec<NamePair> = serde_json::from_str(names_json)?;
        let types: HashMap<String, String> = serde_json::from_str(types_json)?;
        Ok(Self::new(pairs, types))
    }

    pub fn from_paths(names: &Path, types: &Path) -> Result<Self, TranslationError> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|source| TranslationError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        Self::from_json(&read(names)?, &read(types)?)
    }

    /// Tables compiled into the binary.
    pub fn embedded() -> &'static TranslationTables {
        &EMBEDDED
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

impl TranslationLookup for TranslationTables {
    fn localized_name(&self, name: &str) -> Option<&str> {
        self.names.get(&name.to_lowercase()).map(String::as_str)
    }

    fn localized_type(&self, kind: &str) -> Option<&str> {
        self.types.get(kind).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tables() -> TranslationTables {
        TranslationTables::from_json(
            r#"[{"en": "Bulbasaur", "ja": "フシギダネ"}, {"en": "BULBASAUR", "ja": "重複"}]"#,
            r#"{"grass": "くさ"}"#,
        )
        .unwrap()
    }

    #[test]
    fn names_match_case_insensitively() {
        let tables = small_tables();
        assert_eq!(tables.localized_name("bulbasaur"), Some("フシギダネ"));
        assert_eq!(tables.localized_name("BulbaSaur"), Some("フシギダネ"));
        assert_eq!(tables.name_count(), 1);
    }

    #[test]
    fn types_match_exactly() {
        let tables = small_tables();
        assert_eq!(tables.localized_type("grass"), Some("くさ"));
        assert_eq!(tables.localized_type("Grass"), None);
    }

    #[test]
    fn misses_resolve_to_sentinels() {
        let localized = small_tables().localize("missingno", "bird");
        assert_eq!(localized.name, UNKNOWN_NAME);
        assert_eq!(localized.kind, UNKNOWN_TYPE);
    }

    #[test]
    fn embedded_tables_cover_first_generation() {
        let tables = TranslationTables::embedded();
        assert_eq!(tables.name_count(), 151);
        assert_eq!(tables.type_count(), 18);
        let localized = tables.localize("charmander", "fire");
        assert_eq!(localized.name, "ヒトカゲ");
        assert_eq!(localized.kind, "ほのお");
        assert_eq!(tables.localized_name("mr-mime"), Some("バリヤード"));
    }

    #[test]
    fn malformed_table_is_an_error() {
        let err = TranslationTables::from_json("{}", "{}").unwrap_err();
        assert!(matches!(err, TranslationError::Parse(_)));
    }

    #[test]
    fn unreadable_path_names_the_file() {
        let err = TranslationTables::from_paths(
            Path::new("/nonexistent/names.json"),
            Path::new("/nonexistent/types.json"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/names.json"));
    }
}
