use serde::Deserialize;

use kronos_api::Zone;

use crate::error::EngineError;
use crate::pattern::Pattern;

/// Zone conversion settings: the `[kronos]` table of the server config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KronosConfig {
    /// Master switch. When off, the boundary passes values through.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Zone all stored/processed values are expressed in.
    #[serde(default = "default_backend_zone_id")]
    pub backend_zone_id: String,

    /// Zone assumed for callers that do not send one.
    #[serde(default = "default_client_zone_id")]
    pub default_client_zone_id: String,

    /// Request header carrying the caller's zone identifier.
    #[serde(default = "default_client_zone_id_header")]
    pub client_zone_id_header: String,

    /// Pattern for textual date-times without a field-level override.
    #[serde(default = "default_date_time_format")]
    pub default_date_time_format: String,

    /// Convert marked arguments client → backend.
    #[serde(default = "default_true")]
    pub handle_request: bool,

    /// Convert results backend → client.
    #[serde(default = "default_true")]
    pub handle_response: bool,
}

fn default_true() -> bool {
    true
}

fn default_backend_zone_id() -> String {
    "UTC".to_string()
}

fn default_client_zone_id() -> String {
    "Asia/Shanghai".to_string()
}

fn default_client_zone_id_header() -> String {
    "X-Time-Zone".to_string()
}

fn default_date_time_format() -> String {
    "yyyy-MM-dd HH:mm:ss".to_string()
}

impl Default for KronosConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            backend_zone_id: default_backend_zone_id(),
            default_client_zone_id: default_client_zone_id(),
            client_zone_id_header: default_client_zone_id_header(),
            default_date_time_format: default_date_time_format(),
            handle_request: default_true(),
            handle_response: default_true(),
        }
    }
}

impl KronosConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn backend_zone(&self) -> Result<Zone, EngineError> {
        Zone::parse(&self.backend_zone_id)
            .map_err(|e| EngineError::from(e).with_context("backend_zone_id"))
    }

    pub fn default_client_zone(&self) -> Result<Zone, EngineError> {
        Zone::parse(&self.default_client_zone_id)
            .map_err(|e| EngineError::from(e).with_context("default_client_zone_id"))
    }

    /// Check every value that can only fail at runtime otherwise.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.backend_zone()?;
        self.default_client_zone()?;
        if self.client_zone_id_header.trim().is_empty() {
            return Err(EngineError::Config("client_zone_id_header must not be empty".into()));
        }
        Pattern::compile(&self.default_date_time_format)
            .map_err(|e| EngineError::from(e).with_context("default_date_time_format"))?;
        Ok(())
    }
}
