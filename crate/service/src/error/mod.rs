use thiserror::Error;

use crate::status::Status;

pub(crate) mod result;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Bad parameters: {0}")]
    BadParameters(String),

    #[error("Bad state: {0}")]
    BadState(String),

    #[error("Buffer too small: {required} bytes required, {provided} provided")]
    BufferTooSmall { required: usize, provided: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Default(String),

    #[error("Indexing slicing Error: {0}")]
    IndexingSlicing(String),

    #[error("Invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    #[error("Invalid operation handle: {0:#010x}")]
    InvalidHandle(u32),

    #[error("Invalid key data: {0}")]
    InvalidKeyData(String),

    #[error("Invalid key slot: {0}")]
    InvalidKeyId(u32),

    #[error("Invalid key type: {0}")]
    InvalidKeyType(String),

    #[error("Invalid padding")]
    InvalidPadding,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Not permitted: {0}")]
    NotPermitted(String),

    #[error("No free operation context left (capacity: {0})")]
    ResourceExhausted(usize),

    #[error("Key slot {0} is already in use")]
    SlotInUse(u32),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl ServiceError {
    /// The status code returned across the trust boundary for this error.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::BadParameters(_) => Status::BadParameters,
            Self::BadState(_) => Status::BadState,
            Self::BufferTooSmall { .. } => Status::BufferTooSmall,
            Self::Config(_) | Self::Default(_) | Self::IndexingSlicing(_) => Status::GenericError,
            Self::InvalidAlgorithm(_) => Status::InvalidAlgorithm,
            Self::InvalidHandle(_) => Status::InvalidHandle,
            Self::InvalidKeyData(_) => Status::InvalidKeyData,
            Self::InvalidKeyId(_) => Status::InvalidKeyId,
            Self::InvalidKeyType(_) => Status::InvalidKeyType,
            Self::InvalidPadding => Status::InvalidPadding,
            Self::InvalidSignature => Status::InvalidSignature,
            Self::NotPermitted(_) => Status::NotPermitted,
            Self::ResourceExhausted(_) => Status::ResourceExhausted,
            Self::SlotInUse(_) => Status::SlotInUse,
            Self::UnsupportedAlgorithm(_) => Status::UnsupportedAlgorithm,
        }
    }

    /// Errors after which an operation context must not survive.
    pub(crate) const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::BadState(_) | Self::InvalidSignature | Self::InvalidPadding
        )
    }
}

impl From<aes::cipher::InvalidLength> for ServiceError {
    fn from(e: aes::cipher::InvalidLength) -> Self {
        Self::InvalidKeyData(e.to_string())
    }
}

/// Return early with an error if a condition is not satisfied.
///
/// This macro is equivalent to `if !$cond { return Err(From::from($err)); }`.
#[macro_export]
macro_rules! service_ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($crate::service_error!($msg));
        }
    };
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return ::core::result::Result::Err($crate::service_error!($fmt, $($arg)*));
        }
    };
}

/// Construct a service error from a string.
#[macro_export]
macro_rules! service_error {
    ($msg:literal) => {
        $crate::ServiceError::Default(::core::format_args!($msg).to_string())
    };
    ($err:expr $(,)?) => ({
        $crate::ServiceError::Default($err.to_string())
    });
    ($fmt:expr, $($arg:tt)*) => {
        $crate::ServiceError::Default(::core::format_args!($fmt, $($arg)*).to_string())
    };
}

/// Return early with an error.
#[macro_export]
macro_rules! service_bail {
    ($msg:literal) => {
        return ::core::result::Result::Err($crate::service_error!($msg))
    };
    ($err:expr $(,)?) => {
        return ::core::result::Result::Err($err)
    };
    ($fmt:expr, $($arg:tt)*) => {
        return ::core::result::Result::Err($crate::service_error!($fmt, $($arg)*))
    };
}
