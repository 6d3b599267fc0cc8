pub use algorithms::{
    Algorithm,
    cipher::{BLOCK_SIZE, IV_SIZE},
    hash::MAX_HASH_SIZE,
    mac::MAX_MAC_SIZE,
};
pub use config::ServiceConfig;
pub use error::{
    ServiceError,
    result::{ServiceResult, ServiceResultHelper},
};
pub use key_store::{KeyPolicyAttributes, KeyStore, KeyType, KeyUsage, MAX_KEY_BYTES};
pub use operation::{
    CipherContext, Direction, HashContext, INVALID_HANDLE, KeyPolicyContext,
    MAX_OPERATION_CAPACITY, MacContext, MacDirection, OperationContext, OperationKind,
    OperationVariant,
};
pub use registry::OperationRegistry;
pub use service::{
    CipherOperation, CryptoService, HashOperation, KeyPolicy, MacOperation, SharedCryptoService,
};
pub use status::Status;

mod algorithms;
mod config;
mod error;
mod key_store;
mod operation;
mod registry;
mod service;
mod status;
