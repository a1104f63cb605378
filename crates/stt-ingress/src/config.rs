//! Ingress process configuration: the HTTP listen address and the scratch
//! directory uploads are written into before a job is submitted.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level ingress process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressConfig {
    /// Interface to bind the HTTP listener on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the HTTP listener on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory uploaded audio is written into before a job starts.
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_max_upload_bytes() -> u64 {
    500 * 1024 * 1024
}

impl IngressConfig {
    /// Load configuration from an optional `ingress.toml`/`config.toml`
    /// layered under `STT_INGRESS_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file contains invalid syntax or a
    /// present field fails to parse.
    pub fn load() -> stt_core::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("ingress").required(false))
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("STT_INGRESS").separator("_"))
            .build()
            .map_err(|e| stt_core::Error::Configuration {
                message: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| stt_core::Error::Configuration {
            message: e.to_string(),
        })
    }

    /// The socket address to bind, as a string suitable for parsing.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for IngressConfig {
    fn default() -> Self {
        let upload_dir = directories::UserDirs::new().map_or_else(
            || std::env::temp_dir().join("stt-ingress").join("uploads"),
            |dirs| dirs.home_dir().join(".stt-ingress").join("uploads"),
        );

        Self {
            host: default_host(),
            port: default_port(),
            upload_dir,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_has_documented_defaults() {
        let config = IngressConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, 500 * 1024 * 1024);
    }

    #[test]
    fn bind_address_combines_host_and_port() {
        let config = IngressConfig {
            host: "127.0.0.1".to_string(),
            port: 9090,
            ..IngressConfig::default()
        };
        assert_eq!(config.bind_address(), "127.0.0.1:9090");
    }
}
