//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::HostConfig;

/// Error type for configuration loading. Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not open config file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {} is a directory", path.display())]
    IsDirectory { path: PathBuf },

    #[error("could not read config in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read config in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid listen address {address:?}: {source}")]
    ListenAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Load the host → backend mapping from a file.
///
/// Files ending in `.toml` are parsed as TOML, anything else as JSON.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let metadata = fs::metadata(path).map_err(|source| ConfigError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.is_dir() {
        return Err(ConfigError::IsDirectory {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config: HostConfig = if is_toml {
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?
    };

    tracing::debug!(path = %path.display(), hosts = config.len(), "Configuration parsed");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendSpec;

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vhost-proxy-{}-{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_json_config() {
        let path = scratch_file(
            "loads.json",
            r#"{
                "www.example.com": {"TargetURL": "http://localhost:8080/example"},
                "www2.example.com": {"TargetURL": "http://localhost:8081/", "GZ": true}
            }"#,
        );

        let config = load_config(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.len(), 2);
        assert_eq!(
            config["www.example.com"],
            BackendSpec::new("http://localhost:8080/example")
        );
        assert!(config["www2.example.com"].gzip);
    }

    #[test]
    fn loads_toml_config() {
        let path = scratch_file(
            "loads.toml",
            r#"
            ["a.test"]
            TargetURL = "http://127.0.0.1:9001/"
            GZ = true
            "#,
        );

        let config = load_config(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(
            config["a.test"],
            BackendSpec::new("http://127.0.0.1:9001/").with_gzip(true)
        );
    }

    #[test]
    fn missing_file_is_open_error() {
        let path = std::env::temp_dir().join("vhost-proxy-does-not-exist.json");
        let err = load_config(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Open { .. }));
        assert!(err.to_string().starts_with("could not open config file"));
    }

    #[test]
    fn directory_is_rejected() {
        let err = load_config(&std::env::temp_dir()).unwrap_err();
        assert!(matches!(err, ConfigError::IsDirectory { .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let path = scratch_file("malformed.json", r#"{"a.test": {"TargetURL": 12}"#);
        let err = load_config(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn malformed_toml_is_rejected_with_same_message() {
        let path = scratch_file("malformed.toml", "[\"a.test\"\nTargetURL = ");
        let err = load_config(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert!(matches!(err, ConfigError::Toml { .. }));
        assert!(err.to_string().starts_with("could not read config in"));
    }
}
