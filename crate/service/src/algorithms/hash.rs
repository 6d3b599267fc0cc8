use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use super::Algorithm;
use crate::error::{ServiceError, result::ServiceResult};

/// Largest digest produced by the supported hash algorithms.
pub const MAX_HASH_SIZE: usize = 64;

/// Running digest state of a hash operation.
pub(crate) enum HashState {
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl HashState {
    pub(crate) fn new(algorithm: Algorithm) -> ServiceResult<Self> {
        Ok(match algorithm {
            Algorithm::Sha224 => Self::Sha224(Sha224::new()),
            Algorithm::Sha256 => Self::Sha256(Sha256::new()),
            Algorithm::Sha384 => Self::Sha384(Sha384::new()),
            Algorithm::Sha512 => Self::Sha512(Sha512::new()),
            other => {
                return Err(ServiceError::UnsupportedAlgorithm(format!(
                    "{other} is not a hash algorithm"
                )))
            }
        })
    }

    pub(crate) const fn output_size(&self) -> usize {
        match self {
            Self::Sha224(_) => 28,
            Self::Sha256(_) => 32,
            Self::Sha384(_) => 48,
            Self::Sha512(_) => 64,
        }
    }

    pub(crate) fn update(&mut self, input: &[u8]) {
        match self {
            Self::Sha224(h) => h.update(input),
            Self::Sha256(h) => h.update(input),
            Self::Sha384(h) => h.update(input),
            Self::Sha512(h) => h.update(input),
        }
    }

    /// Write the digest into the first `output_size()` bytes of `out` and reset the state.
    ///
    /// The caller checks the buffer size beforehand.
    pub(crate) fn finalize_into(&mut self, out: &mut [u8]) -> ServiceResult<usize> {
        let size = self.output_size();
        let provided = out.len();
        let out = out.get_mut(..size).ok_or(ServiceError::BufferTooSmall {
            required: size,
            provided,
        })?;
        match self {
            Self::Sha224(h) => out.copy_from_slice(&h.finalize_reset()),
            Self::Sha256(h) => out.copy_from_slice(&h.finalize_reset()),
            Self::Sha384(h) => out.copy_from_slice(&h.finalize_reset()),
            Self::Sha512(h) => out.copy_from_slice(&h.finalize_reset()),
        }
        Ok(size)
    }
}
