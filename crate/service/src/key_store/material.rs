use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ServiceError, result::ServiceResult};

/// Fixed upper bound on the size of any key the service holds, in bytes.
pub const MAX_KEY_BYTES: usize = 64;

/// Key bytes stored in a fixed-size buffer, wiped on drop and on clear.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    bytes: [u8; MAX_KEY_BYTES],
    len: usize,
}

impl Default for KeyMaterial {
    fn default() -> Self {
        Self {
            bytes: [0; MAX_KEY_BYTES],
            len: 0,
        }
    }
}

impl KeyMaterial {
    /// Copy `data` in place, replacing (and wiping) the previous content.
    pub(crate) fn load(&mut self, data: &[u8]) -> ServiceResult<()> {
        let target = self.bytes.get_mut(..data.len()).ok_or_else(|| {
            ServiceError::InvalidKeyData(format!(
                "key of {} bytes exceeds the {MAX_KEY_BYTES} bytes limit",
                data.len()
            ))
        })?;
        target.copy_from_slice(data);
        if let Some(rest) = self.bytes.get_mut(data.len()..) {
            rest.zeroize();
        }
        self.len = data.len();
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.zeroize();
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.get(..self.len).unwrap_or_default()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::{KeyMaterial, MAX_KEY_BYTES};

    #[test]
    fn test_load_and_clear() {
        let mut material = KeyMaterial::default();
        material.load(&[7_u8; 32]).unwrap();
        assert_eq!(material.as_bytes(), &[7_u8; 32]);

        // a shorter key must not leave the tail of the previous one around
        material.load(&[1_u8; 16]).unwrap();
        assert_eq!(material.len(), 16);
        assert!(material.bytes[16..].iter().all(|b| *b == 0));

        material.clear();
        assert!(material.is_empty());
        assert!(material.bytes.iter().all(|b| *b == 0));
    }

    #[test]
    fn test_oversized_key() {
        let mut material = KeyMaterial::default();
        assert!(material.load(&[0_u8; MAX_KEY_BYTES + 1]).is_err());
        assert!(material.is_empty());
    }
}
