//! Session cookie loading
//!
//! Each game reads its cookies from `cookies/<id>_cookie.json`. Two file
//! shapes are accepted: a flat `{"name": "value"}` map, and the
//! browser-export shape `{"cookies": [{"name": .., "value": ..}]}`.
//!
//! A credential is owned by the session client for the duration of one call
//! and never persisted by the core. Completeness is re-checked per attempt:
//! an incomplete credential becomes a terminal per-account failure, not a
//! startup abort, so the remaining games still run.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::warn;

use crate::error::{Error, Result};
use crate::games::GameId;

/// Cookie fields the check-in endpoints require
pub const REQUIRED_COOKIES: [&str; 4] = ["ltuid_v2", "ltoken_v2", "account_id_v2", "cookie_token_v2"];

/// Session cookies and language tag for one account
#[derive(Debug, Clone)]
pub struct AccountCredential {
    pub game: GameId,
    pub lang: String,
    cookies: BTreeMap<String, String>,
}

/// Browser-export cookie entry
#[derive(Debug, Deserialize)]
struct ExportedCookie {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CookieFile {
    Export { cookies: Vec<ExportedCookie> },
    Flat(BTreeMap<String, serde_json::Value>),
}

impl AccountCredential {
    /// Create from an already-parsed cookie map
    pub fn new(game: GameId, cookies: BTreeMap<String, String>, lang: impl Into<String>) -> Self {
        Self {
            game,
            lang: lang.into(),
            cookies,
        }
    }

    /// Load from a cookie JSON file
    pub fn from_file(game: GameId, path: &Path, lang: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::credential(format!("failed to read {}: {e}", path.display()))
        })?;

        let file: CookieFile = serde_json::from_str(&content).map_err(|e| {
            Error::credential(format!("invalid JSON in {}: {e}", path.display()))
        })?;

        let cookies = match file {
            CookieFile::Export { cookies } => cookies
                .into_iter()
                .map(|c| (c.name, c.value))
                .collect(),
            CookieFile::Flat(map) => map
                .into_iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
                .collect(),
        };

        Ok(Self::new(game, cookies, lang))
    }

    /// Get a cookie value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Required fields that are absent or empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_COOKIES
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none())
            .collect()
    }

    /// True when every required field is present
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Render the `Cookie` header value
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Per-game credentials for the configured accounts
#[derive(Debug, Default)]
pub struct CredentialStore {
    entries: HashMap<GameId, AccountCredential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the credential for a game
    pub fn insert(&mut self, credential: AccountCredential) {
        self.entries.insert(credential.game, credential);
    }

    /// Look up the credential for a game
    pub fn get(&self, game: GameId) -> Option<&AccountCredential> {
        self.entries.get(&game)
    }

    /// Load `<dir>/<id>_cookie.json` for each requested game
    ///
    /// An unreadable or malformed file is logged and skipped; the game then
    /// surfaces as an auth failure in the run summary instead of aborting
    /// the other games.
    pub fn load_dir(dir: &Path, games: &[GameId], lang: &str) -> Self {
        let mut store = Self::new();
        for &game in games {
            let path = dir.join(format!("{game}_cookie.json"));
            match AccountCredential::from_file(game, &path, lang) {
                Ok(credential) => {
                    if !credential.is_complete() {
                        warn!(
                            game = %game,
                            missing = ?credential.missing_fields(),
                            "cookie file is missing required fields"
                        );
                    }
                    store.insert(credential);
                }
                Err(e) => {
                    warn!(game = %game, error = %e, "skipping unreadable cookie file");
                }
            }
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete() -> AccountCredential {
        AccountCredential::new(
            GameId::Hsr,
            flat_map(&[
                ("ltuid_v2", "100000001"),
                ("ltoken_v2", "v2_abc"),
                ("account_id_v2", "100000001"),
                ("cookie_token_v2", "v2_def"),
            ]),
            "en-us",
        )
    }

    #[test]
    fn test_complete_credential() {
        let cred = complete();
        assert!(cred.is_complete());
        assert!(cred.missing_fields().is_empty());
    }

    #[test]
    fn test_missing_and_empty_fields() {
        let cred = AccountCredential::new(
            GameId::Gi,
            flat_map(&[("ltuid_v2", "1"), ("ltoken_v2", ""), ("account_id_v2", "1")]),
            "en-us",
        );
        assert!(!cred.is_complete());
        assert_eq!(cred.missing_fields(), vec!["ltoken_v2", "cookie_token_v2"]);
    }

    #[test]
    fn test_cookie_header_rendering() {
        let header = complete().cookie_header();
        assert!(header.contains("ltuid_v2=100000001"));
        assert!(header.contains("; "));
        assert!(!header.ends_with("; "));
    }

    #[test]
    fn test_from_file_flat_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hsr_cookie.json");
        std::fs::write(
            &path,
            r#"{"ltuid_v2": "1", "ltoken_v2": "t", "account_id_v2": "1", "cookie_token_v2": "c", "mi18nLang": "en-us"}"#,
        )
        .unwrap();

        let cred = AccountCredential::from_file(GameId::Hsr, &path, "en-us").unwrap();
        assert!(cred.is_complete());
        assert_eq!(cred.get("mi18nLang"), Some("en-us"));
    }

    #[test]
    fn test_from_file_export_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gi_cookie.json");
        std::fs::write(
            &path,
            r#"{"cookies": [
                {"name": "ltuid_v2", "value": "1"},
                {"name": "ltoken_v2", "value": "t"},
                {"name": "account_id_v2", "value": "1"},
                {"name": "cookie_token_v2", "value": "c"}
            ]}"#,
        )
        .unwrap();

        let cred = AccountCredential::from_file(GameId::Gi, &path, "en-us").unwrap();
        assert!(cred.is_complete());
    }

    #[test]
    fn test_from_file_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zzz_cookie.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(AccountCredential::from_file(GameId::Zzz, &path, "en-us").is_err());
    }

    #[test]
    fn test_load_dir_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("hsr_cookie.json"),
            r#"{"ltuid_v2": "1", "ltoken_v2": "t", "account_id_v2": "1", "cookie_token_v2": "c"}"#,
        )
        .unwrap();

        let store = CredentialStore::load_dir(dir.path(), &[GameId::Hsr, GameId::Gi], "en-us");
        assert!(store.get(GameId::Hsr).is_some());
        assert!(store.get(GameId::Gi).is_none());
    }
}
