use super::{CipherContext, OperationKind};
use crate::{
    algorithms::{Algorithm, hash::HashState, mac::MacState},
    key_store::KeyPolicyAttributes,
};

/// State of a multi-part hash operation.
#[derive(Default)]
pub struct HashContext {
    pub(crate) algorithm: Option<Algorithm>,
    pub(crate) state: Option<HashState>,
}

impl HashContext {
    #[must_use]
    pub const fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }
}

/// Whether a MAC operation produces or checks a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacDirection {
    #[default]
    Sign,
    Verify,
}

/// State of a multi-part MAC operation. The keyed state holds its own copy of the key.
#[derive(Default)]
pub struct MacContext {
    pub(crate) key_slot: u32,
    pub(crate) algorithm: Option<Algorithm>,
    pub(crate) direction: MacDirection,
    pub(crate) state: Option<MacState>,
}

impl MacContext {
    #[must_use]
    pub const fn key_slot(&self) -> u32 {
        self.key_slot
    }

    #[must_use]
    pub const fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    #[must_use]
    pub const fn direction(&self) -> MacDirection {
        self.direction
    }
}

/// A key policy being assembled by a client before `set_key_policy`.
#[derive(Default)]
pub struct KeyPolicyContext {
    pub(crate) policy: KeyPolicyAttributes,
}

/// The per-kind payload of an operation slot.
///
/// The all-zero bit pattern is a valid `Empty`; releasing a slot relies on it.
#[derive(Default)]
#[repr(u32)]
pub enum OperationContext {
    #[default]
    Empty = 0,
    Cipher(CipherContext),
    Hash(HashContext),
    Mac(MacContext),
    KeyPolicy(KeyPolicyContext),
}

impl OperationContext {
    /// The zeroed context installed when a slot is allocated for `kind`.
    #[must_use]
    pub fn initial(kind: OperationKind) -> Self {
        match kind {
            OperationKind::None => Self::Empty,
            OperationKind::Cipher => Self::Cipher(CipherContext::default()),
            OperationKind::Hash => Self::Hash(HashContext::default()),
            OperationKind::Mac => Self::Mac(MacContext::default()),
            OperationKind::KeyPolicy => Self::KeyPolicy(KeyPolicyContext::default()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Empty => OperationKind::None,
            Self::Cipher(_) => OperationKind::Cipher,
            Self::Hash(_) => OperationKind::Hash,
            Self::Mac(_) => OperationKind::Mac,
            Self::KeyPolicy(_) => OperationKind::KeyPolicy,
        }
    }
}

/// A concrete context type stored in the registry under a single operation kind.
pub trait OperationVariant: Sized {
    const KIND: OperationKind;

    fn from_context(context: &mut OperationContext) -> Option<&mut Self>;
}

macro_rules! operation_variant {
    ($ty:ty, $variant:ident) => {
        impl OperationVariant for $ty {
            const KIND: OperationKind = OperationKind::$variant;

            fn from_context(context: &mut OperationContext) -> Option<&mut Self> {
                match context {
                    OperationContext::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

operation_variant!(CipherContext, Cipher);
operation_variant!(HashContext, Hash);
operation_variant!(MacContext, Mac);
operation_variant!(KeyPolicyContext, KeyPolicy);
