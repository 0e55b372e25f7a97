//! Gas model of the entry point

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use warden_primitives::{
    constants::{gas, validation::PAYMASTER_VERIFICATION_GAS_MUL},
    UserOperationSigned,
};

/// Struct to calculate the pre-verification gas of a user operation
// https://github.com/eth-infinitism/bundler/blob/main/packages/sdk/src/calcPreVerificationGas.ts#L44-L51
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Overhead {
    pub fixed: U256,
    pub per_user_op: U256,
    pub per_user_op_word: U256,
    pub zero_byte: U256,
    pub non_zero_byte: U256,
    pub bundle_size: U256,
    pub sig_size: U256,
}

impl Default for Overhead {
    fn default() -> Self {
        Self {
            fixed: U256::from(21000),
            per_user_op: U256::from(18300),
            per_user_op_word: U256::from(4),
            zero_byte: U256::from(4),
            non_zero_byte: U256::from(16),
            bundle_size: U256::from(1),
            sig_size: U256::from(65),
        }
    }
}

impl Overhead {
    /// Calculates the pre-verification gas of a [UserOperation](UserOperationSigned)
    /// The function first packs the [UserOperation](UserOperationSigned), then extracts the call
    /// data for gas calculation. An empty signature is priced as a `sig_size` dummy signature,
    /// with `sig_size` clamped to 65..=1024 bytes.
    ///
    /// # Arguments
    /// `uo` - The [UserOperation](UserOperationSigned) to calculate the pre-verification gas for
    ///
    /// # Returns
    /// The pre-verification gas of the [UserOperation](UserOperationSigned)
    pub fn calculate_pre_verification_gas(&self, uo: &UserOperationSigned) -> U256 {
        let uo_pack = if uo.signature.is_empty() {
            let sig_size = self
                .sig_size
                .clamp(gas::MIN_DUMMY_SIGNATURE_SIZE.into(), gas::MAX_DUMMY_SIGNATURE_SIZE.into())
                .as_usize();
            uo.clone().signature(vec![1u8; sig_size].into()).pack()
        } else {
            uo.pack()
        };

        let call_data = uo_pack.deref().iter().fold(U256::zero(), |acc, &x| {
            let byte_cost = if x == 0 { &self.zero_byte } else { &self.non_zero_byte };
            acc.saturating_add(*byte_cost)
        });

        // per_user_op_word * (uo_pack.len() + 31) / 32
        let word_cost = div_ceil(
            self.per_user_op_word.saturating_mul(U256::from(uo_pack.len() + 31)),
            U256::from(32),
        );

        // fixed / bundle_size
        let fixed_divided_by_bundle_size = div_ceil(self.fixed, self.bundle_size);

        fixed_divided_by_bundle_size
            .saturating_add(call_data)
            .saturating_add(self.per_user_op)
            .saturating_add(word_cost)
    }
}

/// Gas charged by the in-memory ledger for the steps of validation and execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GasSchedule {
    pub signature_recovery: u64,
    pub nonce_update: u64,
    pub storage_lookup: u64,
    pub prefund_transfer: u64,
    pub account_creation: u64,
    pub paymaster_validation: u64,
    pub execute_overhead: u64,
    pub value_transfer: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            signature_recovery: gas::SIGNATURE_RECOVERY,
            nonce_update: gas::NONCE_UPDATE,
            storage_lookup: gas::STORAGE_LOOKUP,
            prefund_transfer: gas::PREFUND_TRANSFER,
            account_creation: gas::ACCOUNT_CREATION,
            paymaster_validation: gas::PAYMASTER_VALIDATION,
            execute_overhead: gas::EXECUTE_OVERHEAD,
            value_transfer: gas::VALUE_TRANSFER,
        }
    }
}

impl GasSchedule {
    /// Gas of the account's `validateUserOp`: nonce update, signature recovery and one storage
    /// lookup per gate read
    pub fn account_validation(&self, lookups: u64) -> u64 {
        self.nonce_update
            .saturating_add(self.signature_recovery)
            .saturating_add(self.storage_lookup.saturating_mul(lookups))
    }

    /// Gas of one forwarded call, on top of what the target reports
    pub fn call(&self, value: U256) -> u64 {
        if value.is_zero() {
            self.execute_overhead
        } else {
            self.execute_overhead.saturating_add(self.value_transfer)
        }
    }
}

/// Price per gas unit paid by the operation: `min(maxFeePerGas, maxPriorityFeePerGas + baseFee)`
pub fn gas_price(uo: &UserOperationSigned, base_fee: U256) -> U256 {
    if uo.max_fee_per_gas == uo.max_priority_fee_per_gas {
        // legacy mode
        return uo.max_fee_per_gas;
    }
    uo.max_fee_per_gas.min(uo.max_priority_fee_per_gas.saturating_add(base_fee))
}

/// Funds reserved before validation: every gas limit at `maxFeePerGas`. The verification gas
/// limit counts three times when a paymaster is used (validation and post-op).
pub fn required_prefund(uo: &UserOperationSigned) -> U256 {
    let mul = if uo.paymaster_and_data.is_empty() {
        U256::one()
    } else {
        U256::from(PAYMASTER_VERIFICATION_GAS_MUL)
    };
    uo.call_gas_limit
        .saturating_add(uo.verification_gas_limit.saturating_mul(mul))
        .saturating_add(uo.pre_verification_gas)
        .saturating_mul(uo.max_fee_per_gas)
}

/// Performs division and rounds up to the nearest integer.
pub fn div_ceil(numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::zero();
    }
    let (quotient, remainder) = numerator.div_mod(denominator);
    if remainder.is_zero() {
        quotient
    } else {
        quotient.saturating_add(U256::one())
    }
}
