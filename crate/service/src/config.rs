use std::{fmt::Display, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{
        ServiceError,
        result::{ServiceResult, ServiceResultHelper},
    },
    key_store::MAX_KEY_BYTES,
    operation::MAX_OPERATION_CAPACITY,
    service_ensure,
};

const DEFAULT_OPERATION_CAPACITY: usize = 8;
const DEFAULT_KEY_SLOT_CAPACITY: usize = 32;

/// Static sizing of the service, fixed for the lifetime of a `CryptoService`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Number of operation contexts that may be live at the same time.
    pub operation_capacity: usize,

    /// Number of key slots.
    pub key_slot_capacity: usize,

    /// Largest key accepted by import, in bytes.
    pub max_key_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            operation_capacity: DEFAULT_OPERATION_CAPACITY,
            key_slot_capacity: DEFAULT_KEY_SLOT_CAPACITY,
            max_key_bytes: MAX_KEY_BYTES,
        }
    }
}

impl Display for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "operation capacity: {}, key slots: {}, max key size: {} bytes",
            self.operation_capacity, self.key_slot_capacity, self.max_key_bytes
        )
    }
}

impl ServiceConfig {
    /// Parse and validate a TOML document. Missing fields take their default.
    pub fn from_toml_str(content: &str) -> ServiceResult<Self> {
        let config: Self =
            toml::from_str(content).config_context("invalid service configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_config_context(|| format!("cannot read {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        service_ensure!(
            (1..=MAX_OPERATION_CAPACITY).contains(&self.operation_capacity),
            ServiceError::Config(format!(
                "operation_capacity must be between 1 and {MAX_OPERATION_CAPACITY}, found {}",
                self.operation_capacity
            ))
        );
        service_ensure!(
            self.key_slot_capacity > 0 && u32::try_from(self.key_slot_capacity).is_ok(),
            ServiceError::Config(format!(
                "invalid key_slot_capacity: {}",
                self.key_slot_capacity
            ))
        );
        service_ensure!(
            (1..=MAX_KEY_BYTES).contains(&self.max_key_bytes),
            ServiceError::Config(format!(
                "max_key_bytes must be between 1 and {MAX_KEY_BYTES}, found {}",
                self.max_key_bytes
            ))
        );
        Ok(())
    }
}
