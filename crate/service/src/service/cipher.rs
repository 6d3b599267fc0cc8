use crypto_service_logger::debug;

use super::{CipherOperation, CryptoService};
use crate::{
    algorithms::Algorithm,
    error::{ServiceError, result::ServiceResult},
    key_store::KeyUsage,
    operation::{CipherContext, Direction, OperationKind},
    service_ensure,
};

impl CryptoService {
    /// Start encrypting with the AES key in `key_slot`.
    pub fn cipher_encrypt_setup(
        &mut self,
        operation: &mut CipherOperation,
        key_slot: u32,
        algorithm: Algorithm,
    ) -> ServiceResult<()> {
        self.cipher_setup(operation, key_slot, algorithm, Direction::Encrypt)
    }

    /// Start decrypting with the AES key in `key_slot`.
    pub fn cipher_decrypt_setup(
        &mut self,
        operation: &mut CipherOperation,
        key_slot: u32,
        algorithm: Algorithm,
    ) -> ServiceResult<()> {
        self.cipher_setup(operation, key_slot, algorithm, Direction::Decrypt)
    }

    fn cipher_setup(
        &mut self,
        operation: &mut CipherOperation,
        key_slot: u32,
        algorithm: Algorithm,
        direction: Direction,
    ) -> ServiceResult<()> {
        service_ensure!(
            algorithm.is_cipher(),
            ServiceError::InvalidAlgorithm(format!("{algorithm} is not a cipher algorithm"))
        );
        let handle = self.begin(operation.handle, OperationKind::Cipher)?;
        let usage = match direction {
            Direction::Encrypt => KeyUsage::ENCRYPT,
            Direction::Decrypt => KeyUsage::DECRYPT,
        };
        let populated = self
            .key_store
            .resolve(key_slot, usage, algorithm)
            .and_then(|key| {
                debug!(
                    "cipher {direction:?} setup: {algorithm} with {} key of slot {key_slot}",
                    key.key_type
                );
                self.registry
                    .lookup_as::<CipherContext>(handle)?
                    .setup(key_slot, algorithm, direction, key.material)
            });
        self.commit(&mut operation.handle, handle, populated)
    }

    /// Set the IV, or the initial counter block in CTR mode. Only once per operation.
    pub fn cipher_set_iv(
        &mut self,
        operation: &mut CipherOperation,
        iv: &[u8],
    ) -> ServiceResult<()> {
        self.step(&mut operation.handle, |ctx: &mut CipherContext| ctx.set_iv(iv))
    }

    /// Encrypt or decrypt the next chunk of data.
    ///
    /// Returns the number of bytes written to `output`, always a whole number of
    /// blocks in CBC modes.
    pub fn cipher_update(
        &mut self,
        operation: &mut CipherOperation,
        input: &[u8],
        output: &mut [u8],
    ) -> ServiceResult<usize> {
        self.step(&mut operation.handle, |ctx: &mut CipherContext| {
            ctx.update(input, output)
        })
    }

    /// Produce the last block and end the operation, whatever the outcome.
    pub fn cipher_finish(
        &mut self,
        operation: &mut CipherOperation,
        output: &mut [u8],
    ) -> ServiceResult<usize> {
        let written = self.last_step(&mut operation.handle, |ctx: &mut CipherContext| {
            ctx.finish(output)
        })?;
        debug!("cipher finished, {written} final bytes");
        Ok(written)
    }

    pub fn cipher_abort(&mut self, operation: &mut CipherOperation) -> ServiceResult<()> {
        self.abort::<CipherContext>(&mut operation.handle)
    }
}
