use crypto_service_logger::debug;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use super::{CryptoService, MacOperation};
use crate::{
    algorithms::{
        Algorithm,
        mac::{MAX_MAC_SIZE, MacState},
    },
    error::{ServiceError, result::ServiceResult},
    key_store::KeyUsage,
    operation::{MacContext, MacDirection, OperationKind},
    service_ensure,
};

impl MacContext {
    /// The running state, provided the operation was set up for `direction`.
    fn state_for(&mut self, direction: MacDirection) -> ServiceResult<&mut MacState> {
        service_ensure!(
            self.direction == direction,
            ServiceError::BadState(format!(
                "the MAC operation was set up for {:?}",
                self.direction
            ))
        );
        self.state
            .as_mut()
            .ok_or_else(|| ServiceError::BadState("MAC operation is not set up".to_owned()))
    }

    fn update(&mut self, input: &[u8]) -> ServiceResult<()> {
        self.state
            .as_mut()
            .ok_or_else(|| ServiceError::BadState("MAC operation is not set up".to_owned()))?
            .update(input);
        Ok(())
    }

    fn sign_finish(&mut self, out: &mut [u8]) -> ServiceResult<usize> {
        let state = self.state_for(MacDirection::Sign)?;
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

    fn verify_finish(&mut self, expected: &[u8]) -> ServiceResult<()> {
        let mut tag = [0_u8; MAX_MAC_SIZE];
        let size = self.state_for(MacDirection::Verify)?.finalize_into(&mut tag)?;
        let matches = tag
            .get(..size)
            .is_some_and(|t| bool::from(t.ct_eq(expected)));
        tag.zeroize();
        service_ensure!(matches, ServiceError::InvalidSignature);
        Ok(())
    }
}

impl CryptoService {
    /// Start computing a MAC with the key in `key_slot`.
    pub fn mac_sign_setup(
        &mut self,
        operation: &mut MacOperation,
        key_slot: u32,
        algorithm: Algorithm,
    ) -> ServiceResult<()> {
        self.mac_setup(operation, key_slot, algorithm, MacDirection::Sign)
    }

    /// Start checking a MAC with the key in `key_slot`.
    pub fn mac_verify_setup(
        &mut self,
        operation: &mut MacOperation,
        key_slot: u32,
        algorithm: Algorithm,
    ) -> ServiceResult<()> {
        self.mac_setup(operation, key_slot, algorithm, MacDirection::Verify)
    }

    fn mac_setup(
        &mut self,
        operation: &mut MacOperation,
        key_slot: u32,
        algorithm: Algorithm,
        direction: MacDirection,
    ) -> ServiceResult<()> {
        service_ensure!(
            algorithm.is_mac(),
            ServiceError::InvalidAlgorithm(format!("{algorithm} is not a MAC algorithm"))
        );
        let handle = self.begin(operation.handle, OperationKind::Mac)?;
        let usage = match direction {
            MacDirection::Sign => KeyUsage::SIGN,
            MacDirection::Verify => KeyUsage::VERIFY,
        };
        let populated = self
            .key_store
            .resolve(key_slot, usage, algorithm)
            .and_then(|key| {
                debug!(
                    "mac {direction:?} setup: {algorithm} with {} key of slot {key_slot}",
                    key.key_type
                );
                let state = MacState::new(algorithm, key.material)?;
                let ctx = self.registry.lookup_as::<MacContext>(handle)?;
                ctx.key_slot = key_slot;
                ctx.algorithm = Some(algorithm);
                ctx.direction = direction;
                ctx.state = Some(state);
                Ok(())
            });
        self.commit(&mut operation.handle, handle, populated)
    }

    pub fn mac_update(&mut self, operation: &mut MacOperation, input: &[u8]) -> ServiceResult<()> {
        self.step(&mut operation.handle, |ctx: &mut MacContext| ctx.update(input))
    }

    /// Write the tag to `out` and end the operation.
    ///
    /// An undersized `out` keeps the operation alive so the call can be retried.
    pub fn mac_sign_finish(
        &mut self,
        operation: &mut MacOperation,
        out: &mut [u8],
    ) -> ServiceResult<usize> {
        let written = self.step(&mut operation.handle, |ctx: &mut MacContext| {
            ctx.sign_finish(out)
        })?;
        self.end(&mut operation.handle);
        Ok(written)
    }

    /// Compare the tag with `expected` in constant time and end the operation.
    pub fn mac_verify_finish(
        &mut self,
        operation: &mut MacOperation,
        expected: &[u8],
    ) -> ServiceResult<()> {
        self.last_step(&mut operation.handle, |ctx: &mut MacContext| {
            ctx.verify_finish(expected)
        })
    }

    pub fn mac_abort(&mut self, operation: &mut MacOperation) -> ServiceResult<()> {
        self.abort::<MacContext>(&mut operation.handle)
    }
}
