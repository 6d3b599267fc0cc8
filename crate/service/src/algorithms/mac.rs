use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use super::Algorithm;
use crate::error::{ServiceError, result::ServiceResult};

/// Largest tag produced by the supported MAC algorithms.
pub const MAX_MAC_SIZE: usize = 64;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Running state of a MAC operation, keyed at setup.
pub(crate) enum MacState {
    HmacSha256(HmacSha256),
    HmacSha384(HmacSha384),
    HmacSha512(HmacSha512),
}

impl MacState {
    pub(crate) fn new(algorithm: Algorithm, key: &[u8]) -> ServiceResult<Self> {
        Ok(match algorithm {
            Algorithm::HmacSha256 => Self::HmacSha256(HmacSha256::new_from_slice(key)?),
            Algorithm::HmacSha384 => Self::HmacSha384(HmacSha384::new_from_slice(key)?),
            Algorithm::HmacSha512 => Self::HmacSha512(HmacSha512::new_from_slice(key)?),
            other => {
                return Err(ServiceError::UnsupportedAlgorithm(format!(
                    "{other} is not a MAC algorithm"
                )))
            }
        })
    }

    pub(crate) const fn output_size(&self) -> usize {
        match self {
            Self::HmacSha256(_) => 32,
            Self::HmacSha384(_) => 48,
            Self::HmacSha512(_) => 64,
        }
    }

    pub(crate) fn update(&mut self, input: &[u8]) {
        match self {
            Self::HmacSha256(m) => m.update(input),
            Self::HmacSha384(m) => m.update(input),
            Self::HmacSha512(m) => m.update(input),
        }
    }

    /// Write the tag into the first `output_size()` bytes of `out` and reset the state.
    pub(crate) fn finalize_into(&mut self, out: &mut [u8]) -> ServiceResult<usize> {
        let size = self.output_size();
        let provided = out.len();
        let out = out.get_mut(..size).ok_or(ServiceError::BufferTooSmall {
            required: size,
            provided,
        })?;
        match self {
            Self::HmacSha256(m) => out.copy_from_slice(&m.finalize_reset().into_bytes()),
            Self::HmacSha384(m) => out.copy_from_slice(&m.finalize_reset().into_bytes()),
            Self::HmacSha512(m) => out.copy_from_slice(&m.finalize_reset().into_bytes()),
        }
        Ok(size)
    }
}
