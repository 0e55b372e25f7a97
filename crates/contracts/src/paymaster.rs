//! Verifying paymaster: sponsors user operations approved by an off-chain signer.
//!
//! `paymasterAndData = paymaster(20) ‖ abi.encode(uint48 validUntil, uint48 validAfter) ‖
//! signature(65)`

use crate::error::ContractError;
use ethers::{
    abi::{decode, encode, ParamType, Token},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use std::ops::Deref;
use warden_primitives::{signature, simulation::ValidationData, UserOperationSigned};

const VALID_TIMESTAMP_OFFSET: usize = 20;
const SIGNATURE_OFFSET: usize = 84;
const SIGNATURE_LENGTH: usize = 65;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingPaymaster {
    address: Address,
    entry_point: Address,
    verifying_signer: Address,
}

impl VerifyingPaymaster {
    pub fn new(address: Address, entry_point: Address, verifying_signer: Address) -> Self {
        Self { address, entry_point, verifying_signer }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub fn verifying_signer(&self) -> Address {
        self.verifying_signer
    }

    /// Digest the verifying signer signs, covering every field except `paymasterAndData` and
    /// the signature
    pub fn hash(
        &self,
        uo: &UserOperationSigned,
        chain_id: u64,
        valid_until: u64,
        valid_after: u64,
    ) -> H256 {
        keccak256(encode(&[
            Token::Address(uo.sender),
            Token::Uint(uo.nonce),
            Token::FixedBytes(keccak256(uo.init_code.deref()).to_vec()),
            Token::FixedBytes(keccak256(uo.call_data.deref()).to_vec()),
            Token::Uint(uo.call_gas_limit),
            Token::Uint(uo.verification_gas_limit),
            Token::Uint(uo.pre_verification_gas),
            Token::Uint(uo.max_fee_per_gas),
            Token::Uint(uo.max_priority_fee_per_gas),
            Token::Uint(chain_id.into()),
            Token::Address(self.address),
            Token::Uint(valid_until.into()),
            Token::Uint(valid_after.into()),
        ]))
        .into()
    }

    /// Builds `paymasterAndData` around the verifying signer's signature
    pub fn paymaster_and_data(
        &self,
        valid_until: u64,
        valid_after: u64,
        signature: &[u8],
    ) -> Bytes {
        [
            self.address.as_bytes(),
            encode(&[Token::Uint(valid_until.into()), Token::Uint(valid_after.into())]).as_slice(),
            signature,
        ]
        .concat()
        .into()
    }

    /// Validates the sponsorship.
    ///
    /// Malformed `paymasterAndData` or signature bytes are errors (the paymaster reverts); a
    /// signature by another key yields a failed signature in the validation data. Returns the
    /// paymaster context (empty) and the validation data with the validity window.
    pub fn validate_paymaster_user_op(
        &self,
        uo: &UserOperationSigned,
        chain_id: u64,
    ) -> Result<(Bytes, ValidationData), ContractError> {
        let (valid_until, valid_after, sig) = parse_paymaster_and_data(&uo.paymaster_and_data)?;

        let digest = self.hash(uo, chain_id, valid_until, valid_after);
        let signer = signature::recover(digest, sig)?;

        let data = if signer == self.verifying_signer {
            ValidationData::ok()
        } else {
            ValidationData::sig_failed()
        };
        Ok((Bytes::default(), data.with_window(valid_after, valid_until)))
    }
}

fn parse_paymaster_and_data(data: &[u8]) -> Result<(u64, u64, &[u8]), ContractError> {
    if data.len() != SIGNATURE_OFFSET + SIGNATURE_LENGTH {
        return Err(ContractError::InvalidCallData {
            inner: format!(
                "VerifyingPaymaster: invalid paymasterAndData length {}, expected {}",
                data.len(),
                SIGNATURE_OFFSET + SIGNATURE_LENGTH
            ),
        });
    }

    let tokens = decode(
        &[ParamType::Uint(48), ParamType::Uint(48)],
        &data[VALID_TIMESTAMP_OFFSET..SIGNATURE_OFFSET],
    )
    .map_err(|err| ContractError::InvalidCallData { inner: err.to_string() })?;

    let as_u64 = |token: &Token| -> Result<u64, ContractError> {
        token
            .clone()
            .into_uint()
            .filter(|v| *v <= U256::from(u64::MAX))
            .map(|v| v.as_u64())
            .ok_or_else(|| ContractError::InvalidCallData { inner: "invalid timestamp".into() })
    };

    Ok((as_u64(&tokens[0])?, as_u64(&tokens[1])?, &data[SIGNATURE_OFFSET..]))
}
