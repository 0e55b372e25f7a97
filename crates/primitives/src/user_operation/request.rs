//! User operation request (optional fields)

use super::UserOperationSigned;
use crate::{
    constants::user_operation::{
        DEFAULT_MAX_PRIORITY_FEE_PER_GAS, DEFAULT_PRE_VERIFICATION_GAS,
        DEFAULT_VERIFICATION_GAS_LIMIT,
    },
    utils::as_checksum_addr,
};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// User operation with all fields being optional
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationRequest {
    #[serde(default = "Address::zero", serialize_with = "as_checksum_addr")]
    pub sender: Address,
    #[serde(default)]
    pub nonce: U256,
    #[serde(default)]
    pub init_code: Bytes,
    #[serde(default)]
    pub call_data: Bytes,
    #[serde(default)]
    pub call_gas_limit: Option<U256>,
    #[serde(default)]
    pub verification_gas_limit: Option<U256>,
    #[serde(default)]
    pub pre_verification_gas: Option<U256>,
    #[serde(default)]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default)]
    pub paymaster_and_data: Bytes,
    #[serde(default)]
    pub signature: Option<Bytes>,
}

impl UserOperationRequest {
    /// Fills every missing field with the client defaults: 200k verification gas, 21k
    /// pre-verification gas, 1 gwei priority fee and zero for the remaining gas values.
    pub fn fill_defaults(self) -> UserOperationSigned {
        UserOperationSigned {
            sender: self.sender,
            nonce: self.nonce,
            init_code: self.init_code,
            call_data: self.call_data,
            call_gas_limit: self.call_gas_limit.unwrap_or_default(),
            verification_gas_limit: self
                .verification_gas_limit
                .unwrap_or_else(|| DEFAULT_VERIFICATION_GAS_LIMIT.into()),
            pre_verification_gas: self
                .pre_verification_gas
                .unwrap_or_else(|| DEFAULT_PRE_VERIFICATION_GAS.into()),
            max_fee_per_gas: self.max_fee_per_gas.unwrap_or_default(),
            max_priority_fee_per_gas: self
                .max_priority_fee_per_gas
                .unwrap_or_else(|| DEFAULT_MAX_PRIORITY_FEE_PER_GAS.into()),
            paymaster_and_data: self.paymaster_and_data,
            signature: self.signature.unwrap_or_default(),
        }
    }
}

impl From<UserOperationRequest> for UserOperationSigned {
    fn from(user_operation: UserOperationRequest) -> Self {
        Self {
            sender: user_operation.sender,
            nonce: user_operation.nonce,
            init_code: user_operation.init_code,
            call_data: user_operation.call_data,
            call_gas_limit: user_operation.call_gas_limit.unwrap_or_default(),
            verification_gas_limit: user_operation.verification_gas_limit.unwrap_or_default(),
            pre_verification_gas: user_operation.pre_verification_gas.unwrap_or_default(),
            max_fee_per_gas: user_operation.max_fee_per_gas.unwrap_or_default(),
            max_priority_fee_per_gas: user_operation.max_priority_fee_per_gas.unwrap_or_default(),
            paymaster_and_data: user_operation.paymaster_and_data,
            signature: user_operation.signature.unwrap_or_default(),
        }
    }
}
