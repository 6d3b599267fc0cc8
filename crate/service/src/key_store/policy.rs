use bitflags::bitflags;

use crate::algorithms::Algorithm;

bitflags! {
    /// What a key may be used for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyUsage: u32 {
        const EXPORT = 0x0000_0001;
        const ENCRYPT = 0x0000_0100;
        const DECRYPT = 0x0000_0200;
        const SIGN = 0x0000_0400;
        const VERIFY = 0x0000_0800;
    }
}

/// Usage flags and permitted algorithm attached to a key slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPolicyAttributes {
    pub usage: KeyUsage,
    /// `None` permits every algorithm compatible with the key type.
    pub algorithm: Option<Algorithm>,
}

impl Default for KeyPolicyAttributes {
    /// A fresh policy object grants nothing.
    fn default() -> Self {
        Self {
            usage: KeyUsage::empty(),
            algorithm: None,
        }
    }
}

impl KeyPolicyAttributes {
    /// The policy of a slot that was never given an explicit one.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            usage: KeyUsage::all(),
            algorithm: None,
        }
    }

    #[must_use]
    pub fn permits(&self, usage: KeyUsage, algorithm: Option<Algorithm>) -> bool {
        if !self.usage.contains(usage) {
            return false
        }
        match (self.algorithm, algorithm) {
            (Some(permitted), Some(requested)) => permitted == requested,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyPolicyAttributes, KeyUsage};
    use crate::algorithms::Algorithm;

    #[test]
    fn test_permits() {
        let policy = KeyPolicyAttributes {
            usage: KeyUsage::ENCRYPT | KeyUsage::DECRYPT,
            algorithm: Some(Algorithm::CbcPkcs7),
        };
        assert!(policy.permits(KeyUsage::ENCRYPT, Some(Algorithm::CbcPkcs7)));
        assert!(!policy.permits(KeyUsage::ENCRYPT, Some(Algorithm::Ctr)));
        assert!(!policy.permits(KeyUsage::EXPORT, None));
        assert!(!KeyPolicyAttributes::default().permits(KeyUsage::SIGN, None));
        assert!(KeyPolicyAttributes::unrestricted().permits(KeyUsage::EXPORT, None));
    }
}
