use zeroize::Zeroize;

use crate::{
    algorithms::{
        Algorithm,
        cipher::{AesKey, BLOCK_SIZE, IV_SIZE, ctr_apply},
    },
    error::{ServiceError, result::ServiceResult},
    key_store::KeyMaterial,
    service_ensure,
};

/// The direction of a cipher operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Encrypt,
    Decrypt,
}

/// Transient state of a multi-part cipher operation.
///
/// Input is consumed in whole blocks; whatever does not fill a block is parked
/// in `partial` until the next update or the finish.
#[derive(Default)]
pub struct CipherContext {
    key_slot: u32,
    algorithm: Option<Algorithm>,
    direction: Direction,
    key: KeyMaterial,
    /// CBC chaining value, or the initial counter block in CTR mode.
    iv: [u8; IV_SIZE],
    iv_set: bool,
    partial: [u8; BLOCK_SIZE],
    partial_len: usize,
    /// Bytes of keystream already consumed in CTR mode.
    position: u64,
}

impl CipherContext {
    pub(crate) fn setup(
        &mut self,
        key_slot: u32,
        algorithm: Algorithm,
        direction: Direction,
        key: &[u8],
    ) -> ServiceResult<()> {
        service_ensure!(
            algorithm.is_cipher(),
            ServiceError::UnsupportedAlgorithm(format!("{algorithm} is not a cipher algorithm"))
        );
        self.key.load(key)?;
        self.key_slot = key_slot;
        self.algorithm = Some(algorithm);
        self.direction = direction;
        Ok(())
    }

    #[must_use]
    pub const fn key_slot(&self) -> u32 {
        self.key_slot
    }

    #[must_use]
    pub const fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub const fn iv_set(&self) -> bool {
        self.iv_set
    }

    /// Bytes held back, waiting for a full block.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.partial_len
    }

    fn set_up_algorithm(&self) -> ServiceResult<Algorithm> {
        self.algorithm
            .ok_or_else(|| ServiceError::BadState("cipher operation is not set up".to_owned()))
    }

    /// PKCS#7 decryption keeps the last full block back: it may be the padding block.
    fn holds_back_last_block(&self) -> bool {
        self.algorithm == Some(Algorithm::CbcPkcs7) && self.direction == Direction::Decrypt
    }

    pub(crate) fn set_iv(&mut self, iv: &[u8]) -> ServiceResult<()> {
        self.set_up_algorithm()?;
        service_ensure!(
            !self.iv_set,
            ServiceError::BadState("the IV has already been set".to_owned())
        );
        service_ensure!(
            iv.len() == IV_SIZE,
            ServiceError::BadState(format!(
                "the IV must be {IV_SIZE} bytes long, found {}",
                iv.len()
            ))
        );
        self.iv.copy_from_slice(iv);
        self.iv_set = true;
        Ok(())
    }

    /// Output produced by an update with `input_len` more bytes.
    #[must_use]
    pub fn update_output_size(&self, input_len: usize) -> usize {
        if self.algorithm == Some(Algorithm::Ctr) {
            return input_len
        }
        let total = self.partial_len + input_len;
        if self.holds_back_last_block() {
            total.saturating_sub(1) / BLOCK_SIZE * BLOCK_SIZE
        } else {
            total / BLOCK_SIZE * BLOCK_SIZE
        }
    }

    /// Process `input`, writing every completed block to `output`.
    ///
    /// An undersized `output` is rejected before any state changes.
    pub(crate) fn update(&mut self, input: &[u8], output: &mut [u8]) -> ServiceResult<usize> {
        let algorithm = self.set_up_algorithm()?;
        service_ensure!(
            self.iv_set,
            ServiceError::BadState("the IV must be set before processing data".to_owned())
        );
        let required = self.update_output_size(input.len());
        service_ensure!(
            output.len() >= required,
            ServiceError::BufferTooSmall {
                required,
                provided: output.len(),
            }
        );

        if algorithm == Algorithm::Ctr {
            let out = output.get_mut(..input.len()).ok_or_else(|| {
                ServiceError::IndexingSlicing("cipher update: ..input.len()".to_owned())
            })?;
            out.copy_from_slice(input);
            ctr_apply(self.key.as_bytes(), &self.iv, self.position, out)?;
            self.position += input.len() as u64;
            return Ok(input.len())
        }

        let aes = AesKey::new(self.key.as_bytes())?;
        let hold_back = self.holds_back_last_block();
        let mut written = 0;
        let mut remaining = input;
        while !remaining.is_empty() {
            if self.partial_len == BLOCK_SIZE {
                self.flush_block(&aes, output, written)?;
                written += BLOCK_SIZE;
            }
            let take = (BLOCK_SIZE - self.partial_len).min(remaining.len());
            let (head, tail) = remaining.split_at(take);
            self.partial
                .get_mut(self.partial_len..self.partial_len + take)
                .ok_or_else(|| {
                    ServiceError::IndexingSlicing("cipher update: partial block".to_owned())
                })?
                .copy_from_slice(head);
            self.partial_len += take;
            remaining = tail;
        }
        if self.partial_len == BLOCK_SIZE && !hold_back {
            self.flush_block(&aes, output, written)?;
            written += BLOCK_SIZE;
        }
        Ok(written)
    }

    /// Run the parked full block through the cipher into `output[offset..]`.
    fn flush_block(&mut self, aes: &AesKey, output: &mut [u8], offset: usize) -> ServiceResult<()> {
        let out = output
            .get_mut(offset..offset + BLOCK_SIZE)
            .ok_or_else(|| {
                ServiceError::IndexingSlicing("cipher update: output block".to_owned())
            })?;
        let mut block = self.partial;
        match self.direction {
            Direction::Encrypt => aes.cbc_encrypt(&mut self.iv, &mut block),
            Direction::Decrypt => aes.cbc_decrypt(&mut self.iv, &mut block),
        }
        out.copy_from_slice(&block);
        block.zeroize();
        self.partial.zeroize();
        self.partial_len = 0;
        Ok(())
    }

    /// Flush the final block, applying or removing the padding.
    pub(crate) fn finish(&mut self, output: &mut [u8]) -> ServiceResult<usize> {
        let algorithm = self.set_up_algorithm()?;
        service_ensure!(
            self.iv_set,
            ServiceError::BadState("the IV must be set before finishing".to_owned())
        );
        match (algorithm, self.direction) {
            (Algorithm::Ctr, _) => Ok(0),
            (Algorithm::CbcNoPadding, _) => {
                service_ensure!(
                    self.partial_len == 0,
                    ServiceError::BadParameters(format!(
                        "{} trailing bytes do not form a full block",
                        self.partial_len
                    ))
                );
                Ok(0)
            }
            (Algorithm::CbcPkcs7, Direction::Encrypt) => {
                service_ensure!(
                    output.len() >= BLOCK_SIZE,
                    ServiceError::BufferTooSmall {
                        required: BLOCK_SIZE,
                        provided: output.len(),
                    }
                );
                #[allow(clippy::cast_possible_truncation)]
                let pad = (BLOCK_SIZE - self.partial_len) as u8;
                if let Some(tail) = self.partial.get_mut(self.partial_len..) {
                    tail.fill(pad);
                }
                self.partial_len = BLOCK_SIZE;
                let aes = AesKey::new(self.key.as_bytes())?;
                self.flush_block(&aes, output, 0)?;
                Ok(BLOCK_SIZE)
            }
            (Algorithm::CbcPkcs7, Direction::Decrypt) => {
                service_ensure!(
                    self.partial_len == BLOCK_SIZE,
                    ServiceError::BadParameters(
                        "the ciphertext is not a whole number of blocks".to_owned()
                    )
                );
                let aes = AesKey::new(self.key.as_bytes())?;
                let mut block = self.partial;
                aes.cbc_decrypt(&mut self.iv, &mut block);
                let result = unpad(&block).and_then(|len| {
                    let provided = output.len();
                    let out = output.get_mut(..len).ok_or(ServiceError::BufferTooSmall {
                        required: len,
                        provided,
                    })?;
                    out.copy_from_slice(block.get(..len).unwrap_or_default());
                    Ok(len)
                });
                block.zeroize();
                result
            }
            (other, _) => Err(ServiceError::BadState(format!(
                "{other} is not a cipher algorithm"
            ))),
        }
    }
}

/// Length of the plaintext in a PKCS#7 padded final block.
///
/// Every byte of the block is inspected whatever the pad value.
fn unpad(block: &[u8; BLOCK_SIZE]) -> ServiceResult<usize> {
    let pad = block[BLOCK_SIZE - 1];
    let pad_len = usize::from(pad);
    let mut bad = u8::from(pad == 0) | u8::from(pad_len > BLOCK_SIZE);
    for (i, byte) in block.iter().enumerate() {
        let in_padding = u8::from(i + pad_len >= BLOCK_SIZE);
        bad |= in_padding & u8::from(*byte != pad);
    }
    if bad != 0 {
        return Err(ServiceError::InvalidPadding)
    }
    Ok(BLOCK_SIZE - pad_len)
}
