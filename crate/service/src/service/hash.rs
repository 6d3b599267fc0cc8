use crypto_service_logger::debug;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::{CryptoService, HashOperation};
use crate::{
    algorithms::{
        Algorithm,
        hash::{HashState, MAX_HASH_SIZE},
    },
    error::{ServiceError, result::ServiceResult},
    operation::{HashContext, OperationKind},
    service_ensure,
};

impl HashContext {
    fn state(&mut self) -> ServiceResult<&mut HashState> {
        self.state
            .as_mut()
            .ok_or_else(|| ServiceError::BadState("hash operation is not set up".to_owned()))
    }

    fn finish(&mut self, out: &mut [u8]) -> ServiceResult<usize> {
        let state = self.state()?;
        let required = state.output_size();
        service_ensure!(
            out.len() >= required,
            ServiceError::BufferTooSmall {
                required,
                provided: out.len(),
            }
        );
        state.finalize_into(out)
    }

    fn verify(&mut self, expected: &[u8]) -> ServiceResult<()> {
        let mut digest = [0_u8; MAX_HASH_SIZE];
        let size = self.state()?.finalize_into(&mut digest)?;
        let matches = digest
            .get(..size)
            .is_some_and(|d| bool::from(d.ct_eq(expected)));
        digest.zeroize();
        service_ensure!(matches, ServiceError::InvalidSignature);
        Ok(())
    }
}

impl CryptoService {
    pub fn hash_setup(
        &mut self,
        operation: &mut HashOperation,
        algorithm: Algorithm,
    ) -> ServiceResult<()> {
        service_ensure!(
            algorithm.is_hash(),
            ServiceError::UnsupportedAlgorithm(format!("{algorithm} is not a hash algorithm"))
        );
        let handle = self.begin(operation.handle, OperationKind::Hash)?;
        let populated = HashState::new(algorithm).and_then(|state| {
            let ctx = self.registry.lookup_as::<HashContext>(handle)?;
            ctx.algorithm = Some(algorithm);
            ctx.state = Some(state);
            Ok(())
        });
        self.commit(&mut operation.handle, handle, populated)?;
        debug!("hash setup: {algorithm}, handle {:#010x}", operation.handle);
        Ok(())
    }

    pub fn hash_update(
        &mut self,
        operation: &mut HashOperation,
        input: &[u8],
    ) -> ServiceResult<()> {
        self.step(&mut operation.handle, |ctx: &mut HashContext| {
            ctx.state()?.update(input);
            Ok(())
        })
    }

    /// Write the digest to `out` and end the operation.
    ///
    /// An undersized `out` keeps the operation alive so the call can be retried.
    pub fn hash_finish(
        &mut self,
        operation: &mut HashOperation,
        out: &mut [u8],
    ) -> ServiceResult<usize> {
        let written = self.step(&mut operation.handle, |ctx: &mut HashContext| ctx.finish(out))?;
        self.end(&mut operation.handle);
        Ok(written)
    }

    /// Compare the digest with `expected` in constant time and end the operation.
    pub fn hash_verify(
        &mut self,
        operation: &mut HashOperation,
        expected: &[u8],
    ) -> ServiceResult<()> {
        self.last_step(&mut operation.handle, |ctx: &mut HashContext| {
            ctx.verify(expected)
        })
    }

    pub fn hash_abort(&mut self, operation: &mut HashOperation) -> ServiceResult<()> {
        self.abort::<HashContext>(&mut operation.handle)
    }
}
