use crypto_service_logger::debug;

use super::{CryptoService, KeyPolicy};
use crate::{
    algorithms::Algorithm,
    error::result::ServiceResult,
    key_store::{KeyPolicyAttributes, KeyUsage},
    operation::{KeyPolicyContext, OperationKind},
};

impl CryptoService {
    /// Allocate an empty policy object: no usage, any algorithm.
    pub fn key_policy_init(&mut self, policy: &mut KeyPolicy) -> ServiceResult<()> {
        policy.handle = self.begin(policy.handle, OperationKind::KeyPolicy)?;
        Ok(())
    }

    pub fn key_policy_set_usage(
        &mut self,
        policy: &mut KeyPolicy,
        usage: KeyUsage,
        algorithm: Option<Algorithm>,
    ) -> ServiceResult<()> {
        self.step(&mut policy.handle, |ctx: &mut KeyPolicyContext| {
            ctx.policy = KeyPolicyAttributes { usage, algorithm };
            Ok(())
        })
    }

    pub fn key_policy_get_usage(&mut self, policy: &mut KeyPolicy) -> ServiceResult<KeyUsage> {
        self.step(&mut policy.handle, |ctx: &mut KeyPolicyContext| {
            Ok(ctx.policy.usage)
        })
    }

    pub fn key_policy_get_algorithm(
        &mut self,
        policy: &mut KeyPolicy,
    ) -> ServiceResult<Option<Algorithm>> {
        self.step(&mut policy.handle, |ctx: &mut KeyPolicyContext| {
            Ok(ctx.policy.algorithm)
        })
    }

    pub fn key_policy_release(&mut self, policy: &mut KeyPolicy) -> ServiceResult<()> {
        self.abort::<KeyPolicyContext>(&mut policy.handle)
    }

    /// Attach the content of a policy object to an empty key slot.
    pub fn set_key_policy(&mut self, key_slot: u32, policy: &mut KeyPolicy) -> ServiceResult<()> {
        let attributes = self.step(&mut policy.handle, |ctx: &mut KeyPolicyContext| {
            Ok(ctx.policy)
        })?;
        self.key_store.set_policy(key_slot, attributes)?;
        debug!("key slot {key_slot}: policy set to {attributes:?}");
        Ok(())
    }

    /// Load the policy in force for a key slot into a policy object.
    pub fn get_key_policy(&mut self, key_slot: u32, policy: &mut KeyPolicy) -> ServiceResult<()> {
        let attributes = self.key_store.policy(key_slot)?;
        self.step(&mut policy.handle, |ctx: &mut KeyPolicyContext| {
            ctx.policy = attributes;
            Ok(())
        })
    }
}
