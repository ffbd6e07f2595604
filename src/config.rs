//! Runtime configuration.
//!
//! Everything comes from the environment, read once at startup into a plain
//! struct. Defaults live in the constants below and nowhere else. The
//! deployment target mounts a persistent disk at `/var/data`; locally you
//! override `DATA_DIR` (or `DB_FILE` directly) to point somewhere writable.

use std::path::PathBuf;

use crate::error::Error;

const DEFAULT_DATA_DIR: &str = "/var/data";
const DEFAULT_DB_FILE: &str = "db.json";
const DEFAULT_CORS_ORIGIN: &str = "*";
const DEFAULT_PORT: u16 = 3001;

/// The bundled seed document, resolved relative to the working directory of
/// the deployed process (the repository checkout).
const SEED_FILE: &str = "db.json";

/// Startup configuration, fully resolved.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the document (`DATA_DIR`).
    pub data_dir: PathBuf,
    /// Full document path (`DB_FILE`); defaults to `{data_dir}/db.json` but
    /// is taken verbatim when set, wherever it points.
    pub db_file: PathBuf,
    /// Template copied in on first run, if present.
    pub seed_file: PathBuf,
    /// Value of the `access-control-allow-origin` header (`CORS_ORIGIN`).
    pub cors_origin: String,
    /// TCP port to listen on (`PORT`).
    pub port: u16,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Config::from_env), with the variable lookup
    /// injected. Tests use this to avoid mutating process-global state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let data_dir = PathBuf::from(
            lookup("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_owned()),
        );
        let db_file = match lookup("DB_FILE") {
            Some(path) => PathBuf::from(path),
            None => data_dir.join(DEFAULT_DB_FILE),
        };
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port number: `{raw}`")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            data_dir,
            db_file,
            seed_file: PathBuf::from(SEED_FILE),
            cors_origin: lookup("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_owned()),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned())
        }
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(env(&[])).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/data"));
        assert_eq!(config.db_file, PathBuf::from("/var/data/db.json"));
        assert_eq!(config.cors_origin, "*");
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn db_file_follows_data_dir() {
        let config = Config::from_lookup(env(&[("DATA_DIR", "/tmp/t1")])).unwrap();

        assert_eq!(config.db_file, PathBuf::from("/tmp/t1/db.json"));
    }

    #[test]
    fn explicit_db_file_is_taken_verbatim() {
        let config = Config::from_lookup(env(&[
            ("DATA_DIR", "/tmp/t1"),
            ("DB_FILE", "/elsewhere/state.json"),
        ]))
        .unwrap();

        assert_eq!(config.db_file, PathBuf::from("/elsewhere/state.json"));
    }

    #[test]
    fn invalid_port_is_a_config_error() {
        let err = Config::from_lookup(env(&[("PORT", "not-a-port")])).unwrap_err();

        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn origin_and_port_overrides() {
        let config = Config::from_lookup(env(&[
            ("CORS_ORIGIN", "https://app.example"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.cors_origin, "https://app.example");
        assert_eq!(config.port, 8080);
    }
}
