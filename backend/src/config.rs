//! Runtime settings from the environment (and `.env`, loaded by `main`).
//!
//! | Variable                      | Default               |
//! |-------------------------------|-----------------------|
//! | `BALANCETE_DELIMITER`         | `;`                   |
//! | `BALANCETE_PRIMARY_ENCODING`  | `utf-8`               |
//! | `BALANCETE_FALLBACK_ENCODING` | `latin1`              |
//! | `BALANCETE_DATA_DIR`          | `.balancete/imports`  |
//! | `BALANCETE_COMPANIES_FILE`    | unset (no registry)   |
//! | `BALANCETE_PORT`              | `3000`                |

use encoding_rs::Encoding;
use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::parser::LoaderConfig;
use crate::store::DEFAULT_DATA_DIR;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub loader: LoaderConfig,
    pub data_dir: PathBuf,
    pub companies_file: Option<PathBuf>,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            companies_file: None,
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(value) = get("BALANCETE_DELIMITER") {
            settings.loader.delimiter = parse_delimiter(&value)?;
        }
        if let Some(label) = get("BALANCETE_PRIMARY_ENCODING") {
            settings.loader.primary = encoding("BALANCETE_PRIMARY_ENCODING", &label)?;
        }
        if let Some(label) = get("BALANCETE_FALLBACK_ENCODING") {
            settings.loader.fallback = encoding("BALANCETE_FALLBACK_ENCODING", &label)?;
        }
        if let Some(dir) = get("BALANCETE_DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        settings.companies_file = get("BALANCETE_COMPANIES_FILE").map(PathBuf::from);
        if let Some(port) = get("BALANCETE_PORT") {
            settings.port = port.parse().map_err(|e| ConfigError::InvalidValue {
                var: "BALANCETE_PORT",
                message: format!("{}", e),
            })?;
        }

        Ok(settings)
    }
}

fn encoding(var: &'static str, label: &str) -> Result<&'static Encoding, ConfigError> {
    Encoding::for_label(label.as_bytes()).ok_or_else(|| ConfigError::UnknownEncoding {
        var,
        label: label.to_string(),
    })
}

fn parse_delimiter(value: &str) -> Result<u8, ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidValue {
        var: "BALANCETE_DELIMITER",
        message: message.to_string(),
    };
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        v if v.len() == 1 && v.is_ascii() => Ok(v.as_bytes()[0]),
        _ => Err(invalid("expected a single ASCII character")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.loader.delimiter, b';');
        assert_eq!(s.loader.primary.name(), "UTF-8");
        assert_eq!(s.loader.fallback.name(), "windows-1252");
        assert_eq!(s.port, 3000);
        assert!(s.companies_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("BALANCETE_DELIMITER", "tab"),
            ("BALANCETE_FALLBACK_ENCODING", "iso-8859-15"),
            ("BALANCETE_DATA_DIR", "/var/lib/balancete"),
            ("BALANCETE_COMPANIES_FILE", "companies.json"),
            ("BALANCETE_PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(s.loader.delimiter, b'\t');
        assert_eq!(s.loader.fallback.name(), "ISO-8859-15");
        assert_eq!(s.data_dir, PathBuf::from("/var/lib/balancete"));
        assert_eq!(s.companies_file, Some(PathBuf::from("companies.json")));
        assert_eq!(s.port, 8080);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            settings(&[("BALANCETE_PRIMARY_ENCODING", "klingon")]),
            Err(ConfigError::UnknownEncoding { .. })
        ));
        assert!(settings(&[("BALANCETE_DELIMITER", ";;")]).is_err());
        assert!(settings(&[("BALANCETE_PORT", "http")]).is_err());
    }
}
