use crypto_service_logger::{debug, warn};

use super::CryptoService;
use crate::{error::result::ServiceResult, key_store::KeyType};

impl CryptoService {
    /// Import key material into the empty slot `key_slot`.
    pub fn import_key(
        &mut self,
        key_slot: u32,
        key_type: KeyType,
        data: &[u8],
    ) -> ServiceResult<()> {
        self.key_store
            .import(key_slot, key_type, data)
            .inspect_err(|e| warn!("import into key slot {key_slot} rejected: {e}"))?;
        debug!("key slot {key_slot}: imported {} bytes of {key_type}", data.len());
        Ok(())
    }

    /// Wipe the key in `key_slot`. Operations already set up keep their own copy.
    pub fn destroy_key(&mut self, key_slot: u32) -> ServiceResult<()> {
        self.key_store.destroy(key_slot)?;
        debug!("key slot {key_slot}: destroyed");
        Ok(())
    }

    /// Key type and size in bits of the key in `key_slot`.
    pub fn get_key_information(&self, key_slot: u32) -> ServiceResult<(KeyType, usize)> {
        self.key_store.get_info(key_slot)
    }

    pub fn export_key(&self, key_slot: u32, out: &mut [u8]) -> ServiceResult<usize> {
        self.key_store.export(key_slot, out)
    }

    pub fn export_public_key(&self, key_slot: u32, out: &mut [u8]) -> ServiceResult<usize> {
        self.key_store.export_public(key_slot, out)
    }
}
