//! The entry points reached by clients of the secure domain.
//!
//! Each entry point resolves the caller handle through the registry, drives the
//! context it gets back and decides whether the context survives the call.

use std::sync::{Mutex, TryLockError};

use crypto_service_logger::{debug, warn};

use crate::{
    config::ServiceConfig,
    error::{ServiceError, result::ServiceResult},
    key_store::KeyStore,
    operation::{INVALID_HANDLE, OperationKind, OperationVariant},
    registry::OperationRegistry,
    service_ensure,
};

mod cipher;
mod hash;
mod key_management;
mod key_policy;
mod mac;

macro_rules! operation_object {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Default, PartialEq, Eq)]
        pub struct $name {
            /// Opaque handle of the context, `INVALID_HANDLE` when idle.
            pub handle: u32,
        }

        impl $name {
            #[must_use]
            pub const fn is_active(&self) -> bool {
                self.handle != INVALID_HANDLE
            }
        }
    };
}

operation_object!(
    /// Caller-side object of a multi-part cipher operation.
    CipherOperation
);
operation_object!(
    /// Caller-side object of a multi-part hash operation.
    HashOperation
);
operation_object!(
    /// Caller-side object of a multi-part MAC operation.
    MacOperation
);
operation_object!(
    /// Caller-side key policy object.
    KeyPolicy
);

/// The crypto service: the operation registry and the key store it draws keys from.
pub struct CryptoService {
    registry: OperationRegistry,
    key_store: KeyStore,
}

impl CryptoService {
    pub fn new(config: &ServiceConfig) -> ServiceResult<Self> {
        config.validate()?;
        let service = Self {
            registry: OperationRegistry::new(config.operation_capacity)?,
            key_store: KeyStore::new(config.key_slot_capacity, config.max_key_bytes)?,
        };
        debug!("crypto service ready ({config})");
        Ok(service)
    }

    #[must_use]
    pub const fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Direct access to the registry, bypassing the entry points.
    pub fn registry_mut(&mut self) -> &mut OperationRegistry {
        &mut self.registry
    }

    #[must_use]
    pub const fn key_store(&self) -> &KeyStore {
        &self.key_store
    }

    /// Allocate a context of `kind` for an idle caller object.
    fn begin(&mut self, handle: u32, kind: OperationKind) -> ServiceResult<u32> {
        service_ensure!(
            handle == INVALID_HANDLE,
            ServiceError::BadState(format!("a {kind} operation is already active"))
        );
        self.registry.allocate(kind)
    }

    /// Publish a freshly allocated handle, or give the slot back if populating it failed.
    fn commit(
        &mut self,
        target: &mut u32,
        handle: u32,
        populated: ServiceResult<()>,
    ) -> ServiceResult<()> {
        match populated {
            Ok(()) => {
                *target = handle;
                Ok(())
            }
            Err(e) => {
                if self.registry.release(handle).is_err() {
                    warn!("setup: handle {handle:#010x} was already released");
                }
                Err(e)
            }
        }
    }

    /// Run `f` on the live context behind `handle`.
    ///
    /// A terminal failure releases the context and clears `handle`.
    fn step<T, R, F>(&mut self, handle: &mut u32, f: F) -> ServiceResult<R>
    where
        T: OperationVariant,
        F: FnOnce(&mut T) -> ServiceResult<R>,
    {
        let result = f(self.lookup::<T>(*handle)?);
        if let Err(e) = &result {
            if e.is_terminal() {
                warn!("{} operation {:#010x} terminated: {e}", T::KIND, *handle);
                self.end(handle);
            }
        }
        result
    }

    /// Run `f` on the live context behind `handle`, then release it whatever the outcome.
    fn last_step<T, R, F>(&mut self, handle: &mut u32, f: F) -> ServiceResult<R>
    where
        T: OperationVariant,
        F: FnOnce(&mut T) -> ServiceResult<R>,
    {
        let result = f(self.lookup::<T>(*handle)?);
        if let Err(e) = &result {
            warn!("{} operation {:#010x} failed: {e}", T::KIND, *handle);
        }
        self.end(handle);
        result
    }

    fn lookup<T: OperationVariant>(&mut self, handle: u32) -> ServiceResult<&mut T> {
        self.registry.lookup_as::<T>(handle).inspect_err(|e| {
            warn!("{} operation rejected: {e}", T::KIND);
        })
    }

    /// Release a handle resolved earlier in the same call.
    fn end(&mut self, handle: &mut u32) {
        if let Err(e) = self.registry.release(*handle) {
            warn!("release: {e}");
        }
        *handle = INVALID_HANDLE;
    }

    /// Release a live context of kind `T` without finishing it.
    fn abort<T: OperationVariant>(&mut self, handle: &mut u32) -> ServiceResult<()> {
        self.lookup::<T>(*handle)?;
        self.registry.release(*handle)?;
        debug!("{} operation {:#010x} aborted", T::KIND, *handle);
        *handle = INVALID_HANDLE;
        Ok(())
    }
}

/// A `CryptoService` shared by every caller of the process.
///
/// A call arriving while another one holds the service is rejected instead of
/// waiting for it.
pub struct SharedCryptoService(Mutex<CryptoService>);

impl SharedCryptoService {
    pub fn new(config: &ServiceConfig) -> ServiceResult<Self> {
        Ok(Self(Mutex::new(CryptoService::new(config)?)))
    }

    /// Run one entry point call with exclusive access to the service.
    pub fn with<R, F>(&self, f: F) -> ServiceResult<R>
    where
        F: FnOnce(&mut CryptoService) -> ServiceResult<R>,
    {
        let mut service = match self.0.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                warn!("crypto service re-entered while busy");
                return Err(ServiceError::BadState(
                    "the crypto service is already handling a call".to_owned(),
                ))
            }
            Err(TryLockError::Poisoned(_)) => {
                return Err(ServiceError::Default(
                    "the crypto service lock is poisoned".to_owned(),
                ))
            }
        };
        f(&mut service)
    }
}
