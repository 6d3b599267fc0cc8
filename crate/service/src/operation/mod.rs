//! Operation kinds, handle encoding and the per-kind operation contexts.

use strum_macros::{Display, EnumIter};

use crate::error::ServiceError;

mod cipher;
mod context;

pub use cipher::{CipherContext, Direction};
pub use context::{
    HashContext, KeyPolicyContext, MacContext, MacDirection, OperationContext, OperationVariant,
};

/// The value that never identifies an operation context.
pub const INVALID_HANDLE: u32 = 0;

/// Upper bound of the registry capacity, set by the width of the slot index in a handle.
pub const MAX_OPERATION_CAPACITY: usize = 0xFFFF;

const INDEX_MASK: u32 = 0xFFFF;
const GENERATION_SHIFT: u32 = 16;

/// The category of an operation, used as a capability check on every lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter)]
#[repr(u32)]
pub enum OperationKind {
    #[default]
    None = 0,
    Cipher = 1,
    Mac = 2,
    Hash = 3,
    KeyPolicy = 4,
}

impl TryFrom<u32> for OperationKind {
    type Error = ServiceError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Cipher,
            2 => Self::Mac,
            3 => Self::Hash,
            4 => Self::KeyPolicy,
            other => {
                return Err(ServiceError::BadParameters(format!(
                    "unknown operation kind: {other}"
                )))
            }
        })
    }
}

/// Pack a slot index and its generation into a handle.
///
/// The low half holds `index + 1`, so no encoded handle is ever `INVALID_HANDLE`.
pub(crate) fn encode_handle(index: usize, generation: u16) -> u32 {
    debug_assert!(index < MAX_OPERATION_CAPACITY);
    #[allow(clippy::cast_possible_truncation)]
    let index_part = (index as u32 + 1) & INDEX_MASK;
    (u32::from(generation) << GENERATION_SHIFT) | index_part
}

/// Split a handle back into slot index and generation.
pub(crate) const fn decode_handle(handle: u32) -> Option<(usize, u16)> {
    let index_part = handle & INDEX_MASK;
    if index_part == 0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let generation = (handle >> GENERATION_SHIFT) as u16;
    Some(((index_part - 1) as usize, generation))
}
