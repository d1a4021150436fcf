use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;

const DEFAULT_MAX_BROWSE_QUANTITY: u32 = 99;
const DEFAULT_QUANTITY: u32 = 1;

/// Engine settings, read from a TOML file such as:
///
/// ```toml
/// max_browse_quantity = 99
/// default_quantity = 1
/// end_session_on_catalog_reload = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub max_browse_quantity: u32,
    pub default_quantity: u32,
    pub end_session_on_catalog_reload: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_browse_quantity: DEFAULT_MAX_BROWSE_QUANTITY,
            default_quantity: DEFAULT_QUANTITY,
            end_session_on_catalog_reload: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(raw).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.default_quantity == 0 {
            return Err(EngineError::Config("default_quantity must be at least 1".into()));
        }
        if self.default_quantity > self.max_browse_quantity {
            return Err(EngineError::Config(format!(
                "default_quantity {} exceeds max_browse_quantity {}",
                self.default_quantity, self.max_browse_quantity
            )));
        }
        Ok(())
    }
}
