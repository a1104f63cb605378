//! Process-level configuration: broker/store connection details and the
//! service identity the orchestrator advertises under.

use serde::{Deserialize, Serialize};

/// Top-level process configuration, loaded from an optional config file
/// layered under environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name this service advertises itself under to the broker and in
    /// persisted results. Defaults to `stt`.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Broker connection string (e.g. an AMQP URL).
    #[serde(default = "default_services_broker")]
    pub services_broker: String,

    /// Broker password, kept separate so it can be supplied purely via
    /// environment and never committed to a config file.
    #[serde(default)]
    pub broker_pass: Option<String>,

    /// MongoDB host.
    #[serde(default = "default_mongo_host")]
    pub mongo_host: String,

    /// MongoDB port.
    #[serde(default = "default_mongo_port")]
    pub mongo_port: u16,

    /// Default language hint passed through to transcription workers.
    #[serde(default = "default_language")]
    pub language: String,

    /// Process-level worker pool size.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_service_name() -> String {
    "stt".to_string()
}

fn default_services_broker() -> String {
    "amqp://localhost:5672".to_string()
}

fn default_mongo_host() -> String {
    "localhost".to_string()
}

const fn default_mongo_port() -> u16 {
    27017
}

fn default_language() -> String {
    "en".to_string()
}

fn default_concurrency() -> usize {
    num_cpus::get()
}

impl Config {
    /// Load configuration from an optional `config.toml` layered under
    /// `STT_`-prefixed environment variables, falling back to the bare,
    /// original env var names the external-interfaces contract names
    /// (`SERVICE_NAME`, `SERVICES_BROKER`, `BROKER_PASS`, `MONGO_HOST`,
    /// `MONGO_PORT`, `LANGUAGE`, `CONCURRENCY`).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is malformed or a present field
    /// fails to parse into its target type.
    pub fn load() -> crate::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("STT").separator("_"))
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        let mut loaded: Self = config
            .try_deserialize()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        loaded.apply_bare_env_fallbacks();
        Ok(loaded)
    }

    /// Overlay the bare, unprefixed environment variable names from the
    /// external-interfaces contract on top of whatever the layered loader
    /// already produced.
    fn apply_bare_env_fallbacks(&mut self) {
        if let Ok(v) = std::env::var("SERVICE_NAME") {
            self.service_name = v;
        }
        if let Ok(v) = std::env::var("SERVICES_BROKER") {
            self.services_broker = v;
        }
        if let Ok(v) = std::env::var("BROKER_PASS") {
            self.broker_pass = Some(v);
        }
        if let Ok(v) = std::env::var("MONGO_HOST") {
            self.mongo_host = v;
        }
        if let Ok(v) = std::env::var("MONGO_PORT") {
            if let Ok(port) = v.parse() {
                self.mongo_port = port;
            }
        }
        if let Ok(v) = std::env::var("LANGUAGE") {
            self.language = v;
        }
        if let Ok(v) = std::env::var("CONCURRENCY") {
            if let Ok(n) = v.parse() {
                self.concurrency = n;
            }
        }
    }

    /// The MongoDB connection string built from `mongo_host`/`mongo_port`.
    #[must_use]
    pub fn mongo_uri(&self) -> String {
        format!("mongodb://{}:{}", self.mongo_host, self.mongo_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            services_broker: default_services_broker(),
            broker_pass: None,
            mongo_host: default_mongo_host(),
            mongo_port: default_mongo_port(),
            language: default_language(),
            concurrency: default_concurrency(),
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
        let config = Config::default();
        assert_eq!(config.service_name, "stt");
        assert_eq!(config.mongo_host, "localhost");
        assert_eq!(config.mongo_port, 27017);
        assert_eq!(config.language, "en");
        assert!(config.concurrency >= 1);
    }

    #[test]
    fn mongo_uri_combines_host_and_port() {
        let config = Config {
            mongo_host: "db.internal".to_string(),
            mongo_port: 27018,
            ..Config::default()
        };
        assert_eq!(config.mongo_uri(), "mongodb://db.internal:27018");
    }
}
