use aes::{
    Aes128, Aes192, Aes256,
    cipher::{BlockDecrypt, BlockEncrypt, KeyInit},
};
use ctr::{
    Ctr128BE,
    cipher::{KeyIvInit, StreamCipher, StreamCipherSeek},
};

use crate::error::{ServiceError, result::ServiceResult};

/// AES block length in bytes.
pub const BLOCK_SIZE: usize = 16;
/// IV length of every supported cipher mode, in bytes.
pub const IV_SIZE: usize = 16;

/// An expanded AES key, rebuilt from the context key copy on each call.
///
/// The key schedule is wiped on drop.
pub(crate) enum AesKey {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl AesKey {
    pub(crate) fn new(key: &[u8]) -> ServiceResult<Self> {
        Ok(match key.len() {
            16 => Self::Aes128(Aes128::new_from_slice(key)?),
            24 => Self::Aes192(Aes192::new_from_slice(key)?),
            32 => Self::Aes256(Aes256::new_from_slice(key)?),
            n => {
                return Err(ServiceError::InvalidKeyData(format!(
                    "AES keys are 16, 24 or 32 bytes long, found {n}"
                )))
            }
        })
    }

    /// CBC-encrypt one block in place, advancing the chaining value.
    pub(crate) fn cbc_encrypt(&self, chain: &mut [u8; BLOCK_SIZE], block: &mut [u8; BLOCK_SIZE]) {
        for (b, c) in block.iter_mut().zip(chain.iter()) {
            *b ^= c;
        }
        let b = aes::Block::from_mut_slice(block);
        match self {
            Self::Aes128(k) => k.encrypt_block(b),
            Self::Aes192(k) => k.encrypt_block(b),
            Self::Aes256(k) => k.encrypt_block(b),
        }
        chain.copy_from_slice(block);
    }

    /// CBC-decrypt one block in place, advancing the chaining value.
    pub(crate) fn cbc_decrypt(&self, chain: &mut [u8; BLOCK_SIZE], block: &mut [u8; BLOCK_SIZE]) {
        let ciphertext = *block;
        let b = aes::Block::from_mut_slice(block);
        match self {
            Self::Aes128(k) => k.decrypt_block(b),
            Self::Aes192(k) => k.decrypt_block(b),
            Self::Aes256(k) => k.decrypt_block(b),
        }
        for (b, c) in block.iter_mut().zip(chain.iter()) {
            *b ^= c;
        }
        *chain = ciphertext;
    }
}

/// Apply the AES-CTR keystream starting at byte `position` of the stream.
pub(crate) fn ctr_apply(
    key: &[u8],
    iv: &[u8; IV_SIZE],
    position: u64,
    data: &mut [u8],
) -> ServiceResult<()> {
    match key.len() {
        16 => apply_keystream::<Ctr128BE<Aes128>>(key, iv, position, data),
        24 => apply_keystream::<Ctr128BE<Aes192>>(key, iv, position, data),
        32 => apply_keystream::<Ctr128BE<Aes256>>(key, iv, position, data),
        n => Err(ServiceError::InvalidKeyData(format!(
            "AES keys are 16, 24 or 32 bytes long, found {n}"
        ))),
    }
}

fn apply_keystream<C>(key: &[u8], iv: &[u8], position: u64, data: &mut [u8]) -> ServiceResult<()>
where
    C: KeyIvInit + StreamCipher + StreamCipherSeek,
{
    let mut cipher = C::new_from_slices(key, iv)?;
    cipher.seek(position);
    cipher.apply_keystream(data);
    Ok(())
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::{AesKey, BLOCK_SIZE, ctr_apply};

    fn block(hex_str: &str) -> [u8; BLOCK_SIZE] {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    // NIST SP 800-38A, F.2.1 / F.2.2
    #[test]
    fn test_cbc_aes128_known_answer() {
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let aes = AesKey::new(&key).unwrap();
        let iv = block("000102030405060708090a0b0c0d0e0f");

        let mut chain = iv;
        let mut b1 = block("6bc1bee22e409f96e93d7e117393172a");
        let mut b2 = block("ae2d8a571e03ac9c9eb76fac45af8e51");
        aes.cbc_encrypt(&mut chain, &mut b1);
        aes.cbc_encrypt(&mut chain, &mut b2);
        assert_eq!(hex::encode(b1), "7649abac8119b246cee98e9b12e9197d");
        assert_eq!(hex::encode(b2), "5086cb9b507219ee95db113a917678b2");

        let mut chain = iv;
        aes.cbc_decrypt(&mut chain, &mut b1);
        aes.cbc_decrypt(&mut chain, &mut b2);
        assert_eq!(hex::encode(b1), "6bc1bee22e409f96e93d7e117393172a");
        assert_eq!(hex::encode(b2), "ae2d8a571e03ac9c9eb76fac45af8e51");
    }

    // NIST SP 800-38A, F.5.1
    #[test]
    fn test_ctr_aes128_known_answer_with_seek() {
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let iv = block("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
        let mut data = hex::decode(
            "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51",
        )
        .unwrap();
        // split at an unaligned position to exercise the keystream offset
        let (first, second) = data.split_at_mut(5);
        ctr_apply(&key, &iv, 0, first).unwrap();
        ctr_apply(&key, &iv, 5, second).unwrap();
        assert_eq!(
            hex::encode(&data),
            "874d6191b620e3261bef6864990db6ce9806f66b7970fdff8617187bb9fffdff"
        );
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(AesKey::new(&[0_u8; 15]).is_err());
        assert!(ctr_apply(&[0_u8; 20], &[0_u8; 16], 0, &mut [0_u8; 4]).is_err());
    }
}
