//! Fixed-capacity table of key slots addressed by caller-chosen identifiers.

use strum_macros::{Display, EnumIter};

use crate::{
    algorithms::Algorithm,
    error::{ServiceError, result::ServiceResult},
    service_ensure,
};

mod material;
mod policy;

pub use material::{KeyMaterial, MAX_KEY_BYTES};
pub use policy::{KeyPolicyAttributes, KeyUsage};

/// Key types accepted by `import`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u32)]
pub enum KeyType {
    RawData = 0x5000_0001,
    Hmac = 0x5100_0000,
    Aes = 0x4000_0001,
    RsaPublicKey = 0x6001_0000,
    EccPublicKey = 0x6003_0000,
}

impl KeyType {
    #[must_use]
    pub const fn is_public_key(self) -> bool {
        matches!(self, Self::RsaPublicKey | Self::EccPublicKey)
    }

    fn validate(self, data: &[u8]) -> ServiceResult<()> {
        match self {
            Self::Aes => service_ensure!(
                matches!(data.len(), 16 | 24 | 32),
                ServiceError::InvalidKeyData(format!(
                    "AES keys are 16, 24 or 32 bytes long, found {}",
                    data.len()
                ))
            ),
            Self::RawData | Self::Hmac | Self::RsaPublicKey | Self::EccPublicKey => {}
        }
        Ok(())
    }
}

impl TryFrom<u32> for KeyType {
    type Error = ServiceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0x5000_0001 => Self::RawData,
            0x5100_0000 => Self::Hmac,
            0x4000_0001 => Self::Aes,
            0x6001_0000 => Self::RsaPublicKey,
            0x6003_0000 => Self::EccPublicKey,
            other => {
                return Err(ServiceError::InvalidKeyType(format!(
                    "unknown key type: {other:#010x}"
                )))
            }
        })
    }
}

#[derive(Default)]
struct KeySlot {
    key_type: Option<KeyType>,
    material: KeyMaterial,
    policy: Option<KeyPolicyAttributes>,
}

impl KeySlot {
    fn effective_policy(&self) -> KeyPolicyAttributes {
        self.policy.unwrap_or_else(KeyPolicyAttributes::unrestricted)
    }

    fn clear(&mut self) {
        self.material.clear();
        self.key_type = None;
        self.policy = None;
    }
}

/// A key resolved for an operation setup.
pub(crate) struct ResolvedKey<'a> {
    pub(crate) key_type: KeyType,
    pub(crate) material: &'a [u8],
}

/// The key slot table. Slot identifiers run from 1 to the capacity.
pub struct KeyStore {
    slots: Box<[KeySlot]>,
    max_key_bytes: usize,
}

impl KeyStore {
    /// Create a store with every slot empty.
    pub fn new(capacity: usize, max_key_bytes: usize) -> ServiceResult<Self> {
        service_ensure!(
            capacity > 0 && u32::try_from(capacity).is_ok(),
            ServiceError::Config(format!("invalid key slot capacity: {capacity}"))
        );
        service_ensure!(
            (1..=MAX_KEY_BYTES).contains(&max_key_bytes),
            ServiceError::Config(format!(
                "the maximum key size must be between 1 and {MAX_KEY_BYTES} bytes, found \
                 {max_key_bytes}"
            ))
        );
        let slots = (0..capacity).map(|_| KeySlot::default()).collect();
        Ok(Self {
            slots,
            max_key_bytes,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots currently holding a key.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.key_type.is_some()).count()
    }

    fn slot(&self, slot_id: u32) -> ServiceResult<&KeySlot> {
        let index = Self::index(slot_id)?;
        self.slots
            .get(index)
            .ok_or(ServiceError::InvalidKeyId(slot_id))
    }

    fn slot_mut(&mut self, slot_id: u32) -> ServiceResult<&mut KeySlot> {
        let index = Self::index(slot_id)?;
        self.slots
            .get_mut(index)
            .ok_or(ServiceError::InvalidKeyId(slot_id))
    }

    fn index(slot_id: u32) -> ServiceResult<usize> {
        slot_id
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .ok_or(ServiceError::InvalidKeyId(slot_id))
    }

    fn occupied_slot(&self, slot_id: u32) -> ServiceResult<(KeyType, &KeySlot)> {
        let slot = self.slot(slot_id)?;
        let key_type = slot.key_type.ok_or(ServiceError::InvalidKeyId(slot_id))?;
        Ok((key_type, slot))
    }

    /// Import key material into an empty slot.
    pub fn import(&mut self, slot_id: u32, key_type: KeyType, data: &[u8]) -> ServiceResult<()> {
        let max_key_bytes = self.max_key_bytes;
        let slot = self.slot_mut(slot_id)?;
        service_ensure!(slot.key_type.is_none(), ServiceError::SlotInUse(slot_id));
        service_ensure!(
            !data.is_empty(),
            ServiceError::InvalidKeyData("empty key material".to_owned())
        );
        service_ensure!(
            data.len() <= max_key_bytes,
            ServiceError::InvalidKeyData(format!(
                "key of {} bytes exceeds the {max_key_bytes} bytes limit",
                data.len()
            ))
        );
        key_type.validate(data)?;
        slot.material.load(data)?;
        slot.key_type = Some(key_type);
        Ok(())
    }

    /// Wipe a slot and make it available again.
    pub fn destroy(&mut self, slot_id: u32) -> ServiceResult<()> {
        let slot = self.slot_mut(slot_id)?;
        service_ensure!(slot.key_type.is_some(), ServiceError::InvalidKeyId(slot_id));
        slot.clear();
        Ok(())
    }

    /// Key type and length in bits of the key held in a slot.
    pub fn get_info(&self, slot_id: u32) -> ServiceResult<(KeyType, usize)> {
        let (key_type, slot) = self.occupied_slot(slot_id)?;
        Ok((key_type, slot.material.len() * 8))
    }

    /// Copy the key material out, if the key policy allows export.
    pub fn export(&self, slot_id: u32, out: &mut [u8]) -> ServiceResult<usize> {
        let (_, slot) = self.occupied_slot(slot_id)?;
        service_ensure!(
            slot.effective_policy().permits(KeyUsage::EXPORT, None),
            ServiceError::NotPermitted(format!("key slot {slot_id} is not exportable"))
        );
        copy_out(slot.material.as_bytes(), out)
    }

    /// Copy out the public part of an asymmetric key.
    ///
    /// Public keys are always exportable; symmetric keys have no public part.
    pub fn export_public(&self, slot_id: u32, out: &mut [u8]) -> ServiceResult<usize> {
        let (key_type, slot) = self.occupied_slot(slot_id)?;
        service_ensure!(
            key_type.is_public_key(),
            ServiceError::InvalidKeyType(format!("{key_type} has no public part"))
        );
        copy_out(slot.material.as_bytes(), out)
    }

    /// Attach a policy to a slot before a key is imported into it.
    pub fn set_policy(&mut self, slot_id: u32, policy: KeyPolicyAttributes) -> ServiceResult<()> {
        let slot = self.slot_mut(slot_id)?;
        service_ensure!(
            slot.key_type.is_none(),
            ServiceError::BadState(format!(
                "the policy of key slot {slot_id} cannot change while it holds a key"
            ))
        );
        slot.policy = Some(policy);
        Ok(())
    }

    /// The policy in force for a slot.
    pub fn policy(&self, slot_id: u32) -> ServiceResult<KeyPolicyAttributes> {
        Ok(self.slot(slot_id)?.effective_policy())
    }

    /// Resolve the key bound by a cipher or MAC setup.
    pub(crate) fn resolve(
        &self,
        slot_id: u32,
        usage: KeyUsage,
        algorithm: Algorithm,
    ) -> ServiceResult<ResolvedKey<'_>> {
        let (key_type, slot) = self.occupied_slot(slot_id)?;
        service_ensure!(
            algorithm.accepts_key_type(key_type),
            ServiceError::InvalidAlgorithm(format!(
                "{algorithm} cannot be used with a key of type {key_type}"
            ))
        );
        service_ensure!(
            slot.effective_policy().permits(usage, Some(algorithm)),
            ServiceError::NotPermitted(format!(
                "the policy of key slot {slot_id} does not allow {usage:?} with {algorithm}"
            ))
        );
        Ok(ResolvedKey {
            key_type,
            material: slot.material.as_bytes(),
        })
    }
}

fn copy_out(material: &[u8], out: &mut [u8]) -> ServiceResult<usize> {
    let provided = out.len();
    out.get_mut(..material.len())
        .ok_or(ServiceError::BufferTooSmall {
            required: material.len(),
            provided,
        })?
        .copy_from_slice(material);
    Ok(material.len())
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::{KeyPolicyAttributes, KeyStore, KeyType, KeyUsage};
    use crate::{algorithms::Algorithm, status::Status};

    fn store() -> KeyStore {
        KeyStore::new(4, 64).unwrap()
    }

    #[test]
    fn test_import_get_info_destroy() {
        let mut store = store();
        store.import(1, KeyType::Aes, &[0x11; 16]).unwrap();
        assert_eq!(store.get_info(1).unwrap(), (KeyType::Aes, 128));
        assert_eq!(store.occupied(), 1);

        let err = store.import(1, KeyType::Aes, &[0x22; 16]).unwrap_err();
        assert_eq!(err.status(), Status::SlotInUse);

        store.destroy(1).unwrap();
        assert_eq!(store.get_info(1).unwrap_err().status(), Status::InvalidKeyId);
        assert_eq!(store.destroy(1).unwrap_err().status(), Status::InvalidKeyId);
        // the slot can be reused after destroy
        store.import(1, KeyType::Hmac, b"secret").unwrap();
    }

    #[test]
    fn test_slot_id_bounds() {
        let mut store = store();
        for slot_id in [0, 5, u32::MAX] {
            let err = store.import(slot_id, KeyType::RawData, b"x").unwrap_err();
            assert_eq!(err.status(), Status::InvalidKeyId);
        }
        store.import(4, KeyType::RawData, b"x").unwrap();
    }

    #[test]
    fn test_invalid_key_data() {
        let mut store = store();
        for (key_type, data) in [
            (KeyType::Aes, &[0_u8; 17][..]),
            (KeyType::RawData, &[][..]),
            (KeyType::Hmac, &[0_u8; 65][..]),
        ] {
            let err = store.import(2, key_type, data).unwrap_err();
            assert_eq!(err.status(), Status::InvalidKeyData);
        }
        assert_eq!(store.occupied(), 0);
    }

    #[test]
    fn test_configured_key_size_limit() {
        let mut store = KeyStore::new(2, 16).unwrap();
        let err = store.import(1, KeyType::Aes, &[0_u8; 32]).unwrap_err();
        assert_eq!(err.status(), Status::InvalidKeyData);
        assert!(KeyStore::new(2, 65).is_err());
        assert!(KeyStore::new(0, 16).is_err());
    }

    #[test]
    fn test_export_rules() {
        let mut store = store();
        store.import(1, KeyType::Aes, &[0x33; 32]).unwrap();
        let mut out = [0_u8; 32];
        assert_eq!(store.export(1, &mut out).unwrap(), 32);
        assert_eq!(out, [0x33; 32]);

        let err = store.export(1, &mut [0_u8; 8]).unwrap_err();
        assert_eq!(err.status(), Status::BufferTooSmall);

        let err = store.export_public(1, &mut out).unwrap_err();
        assert_eq!(err.status(), Status::InvalidKeyType);

        store.import(2, KeyType::EccPublicKey, &[0x04; 64]).unwrap();
        assert_eq!(store.export_public(2, &mut [0_u8; 64]).unwrap(), 64);

        store
            .set_policy(
                3,
                KeyPolicyAttributes {
                    usage: KeyUsage::ENCRYPT,
                    algorithm: None,
                },
            )
            .unwrap();
        store.import(3, KeyType::Aes, &[0x44; 16]).unwrap();
        let err = store.export(3, &mut out).unwrap_err();
        assert_eq!(err.status(), Status::NotPermitted);
    }

    #[test]
    fn test_policy_lifecycle() {
        let mut store = store();
        assert_eq!(store.policy(1).unwrap(), KeyPolicyAttributes::unrestricted());
        let policy = KeyPolicyAttributes {
            usage: KeyUsage::SIGN,
            algorithm: Some(Algorithm::HmacSha256),
        };
        store.set_policy(1, policy).unwrap();
        store.import(1, KeyType::Hmac, b"key").unwrap();
        assert_eq!(store.policy(1).unwrap(), policy);

        let err = store.set_policy(1, KeyPolicyAttributes::default()).unwrap_err();
        assert_eq!(err.status(), Status::BadState);

        // destroying the key also drops its policy
        store.destroy(1).unwrap();
        assert_eq!(store.policy(1).unwrap(), KeyPolicyAttributes::unrestricted());
    }

    #[test]
    fn test_resolve() {
        let mut store = store();
        store.import(1, KeyType::Aes, &[0x55; 16]).unwrap();
        let key = store.resolve(1, KeyUsage::ENCRYPT, Algorithm::Ctr).unwrap();
        assert_eq!(key.key_type, KeyType::Aes);
        assert_eq!(key.material, &[0x55; 16]);

        let err = store
            .resolve(1, KeyUsage::SIGN, Algorithm::HmacSha256)
            .err()
            .unwrap();
        assert_eq!(err.status(), Status::InvalidAlgorithm);
        let err = store
            .resolve(2, KeyUsage::ENCRYPT, Algorithm::Ctr)
            .err()
            .unwrap();
        assert_eq!(err.status(), Status::InvalidKeyId);
    }
}
