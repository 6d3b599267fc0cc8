//! Software backend for the primitives reachable through the entry points.
//!
//! The registry treats these as external collaborators: it only stores their
//! state inside operation contexts and never looks into it.

use strum_macros::{Display, EnumIter};

use crate::{error::ServiceError, key_store::KeyType};

pub(crate) mod cipher;
pub(crate) mod hash;
pub(crate) mod mac;

const HASH_CATEGORY: u32 = 0x0100_0000;
const MAC_CATEGORY: u32 = 0x0280_0000;
const CIPHER_CATEGORY: u32 = 0x0400_0000;

/// Algorithm identifiers accepted at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u32)]
pub enum Algorithm {
    Sha224 = HASH_CATEGORY | 0x08,
    Sha256 = HASH_CATEGORY | 0x09,
    Sha384 = HASH_CATEGORY | 0x0a,
    Sha512 = HASH_CATEGORY | 0x0b,
    HmacSha256 = MAC_CATEGORY | 0x09,
    HmacSha384 = MAC_CATEGORY | 0x0a,
    HmacSha512 = MAC_CATEGORY | 0x0b,
    CbcNoPadding = CIPHER_CATEGORY | 0x0060_0100,
    CbcPkcs7 = CIPHER_CATEGORY | 0x0060_0101,
    Ctr = CIPHER_CATEGORY | 0x00c0_0001,
}

impl Algorithm {
    #[must_use]
    pub const fn is_hash(self) -> bool {
        matches!(
            self,
            Self::Sha224 | Self::Sha256 | Self::Sha384 | Self::Sha512
        )
    }

    #[must_use]
    pub const fn is_mac(self) -> bool {
        matches!(
            self,
            Self::HmacSha256 | Self::HmacSha384 | Self::HmacSha512
        )
    }

    #[must_use]
    pub const fn is_cipher(self) -> bool {
        matches!(self, Self::CbcNoPadding | Self::CbcPkcs7 | Self::Ctr)
    }

    /// Whether a key of `key_type` can drive this algorithm.
    #[must_use]
    pub const fn accepts_key_type(self, key_type: KeyType) -> bool {
        match self {
            Self::CbcNoPadding | Self::CbcPkcs7 | Self::Ctr => matches!(key_type, KeyType::Aes),
            Self::HmacSha256 | Self::HmacSha384 | Self::HmacSha512 => {
                matches!(key_type, KeyType::Hmac)
            }
            Self::Sha224 | Self::Sha256 | Self::Sha384 | Self::Sha512 => false,
        }
    }
}

impl TryFrom<u32> for Algorithm {
    type Error = ServiceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            v if v == Self::Sha224 as u32 => Self::Sha224,
            v if v == Self::Sha256 as u32 => Self::Sha256,
            v if v == Self::Sha384 as u32 => Self::Sha384,
            v if v == Self::Sha512 as u32 => Self::Sha512,
            v if v == Self::HmacSha256 as u32 => Self::HmacSha256,
            v if v == Self::HmacSha384 as u32 => Self::HmacSha384,
            v if v == Self::HmacSha512 as u32 => Self::HmacSha512,
            v if v == Self::CbcNoPadding as u32 => Self::CbcNoPadding,
            v if v == Self::CbcPkcs7 as u32 => Self::CbcPkcs7,
            v if v == Self::Ctr as u32 => Self::Ctr,
            other => {
                return Err(ServiceError::UnsupportedAlgorithm(format!(
                    "unknown algorithm identifier: {other:#010x}"
                )))
            }
        })
    }
}

impl From<Algorithm> for u32 {
    fn from(algorithm: Algorithm) -> Self {
        algorithm as Self
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::Algorithm;
    use crate::{key_store::KeyType, status::Status};

    #[test]
    fn test_algorithm_identifiers_round_trip() {
        for algorithm in Algorithm::iter() {
            assert_eq!(Algorithm::try_from(u32::from(algorithm)).unwrap(), algorithm);
            // every identifier belongs to exactly one category
            let categories = [algorithm.is_hash(), algorithm.is_mac(), algorithm.is_cipher()];
            assert_eq!(categories.iter().filter(|c| **c).count(), 1);
        }
    }

    #[test]
    fn test_unknown_identifier() {
        let err = Algorithm::try_from(0xdead_beef).unwrap_err();
        assert_eq!(err.status(), Status::UnsupportedAlgorithm);
    }

    #[test]
    fn test_key_type_compatibility() {
        assert!(Algorithm::CbcPkcs7.accepts_key_type(KeyType::Aes));
        assert!(!Algorithm::CbcPkcs7.accepts_key_type(KeyType::Hmac));
        assert!(Algorithm::HmacSha256.accepts_key_type(KeyType::Hmac));
        assert!(!Algorithm::Ctr.accepts_key_type(KeyType::RawData));
        assert!(!Algorithm::Sha256.accepts_key_type(KeyType::Aes));
    }
}
