//! Results of the validation simulation

use crate::constants::validation::{SIG_VALIDATION_FAILED, VALID_UNTIL_MAX};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Validation data returned by an account or a paymaster.
///
/// Packed into a `uint256` as
/// `validAfter(6 bytes) ‖ validUntil(6 bytes) ‖ aggregator(20 bytes)`.
/// An aggregator of `1` signals a failed signature check, `valid_until == 0` means no expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationData {
    pub aggregator: Address,
    pub valid_after: u64,
    pub valid_until: u64,
}

impl ValidationData {
    /// Successful validation without a validity window
    pub fn ok() -> Self {
        Self::default()
    }

    /// Failed signature check
    pub fn sig_failed() -> Self {
        Self {
            aggregator: Address::from_low_u64_be(SIG_VALIDATION_FAILED.into()),
            ..Self::default()
        }
    }

    pub fn with_window(mut self, valid_after: u64, valid_until: u64) -> Self {
        self.valid_after = valid_after & VALID_UNTIL_MAX;
        self.valid_until = valid_until & VALID_UNTIL_MAX;
        self
    }

    pub fn is_sig_failed(&self) -> bool {
        self.aggregator == Address::from_low_u64_be(SIG_VALIDATION_FAILED.into())
    }

    /// `valid_until` with zero mapped to "no expiry"
    pub fn deadline(&self) -> u64 {
        if self.valid_until == 0 {
            VALID_UNTIL_MAX
        } else {
            self.valid_until
        }
    }

    /// Whether the window is open at `timestamp`
    pub fn is_valid_at(&self, timestamp: u64) -> bool {
        timestamp >= self.valid_after && timestamp <= self.deadline()
    }

    /// Intersection of the account and paymaster windows. A failed signature of either side
    /// fails the intersection.
    pub fn intersect(&self, other: &Self) -> Self {
        let aggregator = if self.is_sig_failed() || other.is_sig_failed() {
            Self::sig_failed().aggregator
        } else {
            self.aggregator
        };
        Self {
            aggregator,
            valid_after: self.valid_after.max(other.valid_after),
            valid_until: self.deadline().min(other.deadline()),
        }
    }

    pub fn pack(&self) -> U256 {
        let mut b = [0u8; 32];
        b[..6].copy_from_slice(&self.valid_after.to_be_bytes()[2..]);
        b[6..12].copy_from_slice(&self.valid_until.to_be_bytes()[2..]);
        b[12..].copy_from_slice(self.aggregator.as_bytes());
        U256::from_big_endian(&b)
    }

    pub fn unpack(data: U256) -> Self {
        let mut b = [0u8; 32];
        data.to_big_endian(&mut b);
        let mut after = [0u8; 8];
        after[2..].copy_from_slice(&b[..6]);
        let mut until = [0u8; 8];
        until[2..].copy_from_slice(&b[6..12]);
        Self {
            aggregator: Address::from_slice(&b[12..]),
            valid_after: u64::from_be_bytes(after),
            valid_until: u64::from_be_bytes(until),
        }
    }
}

/// Gas and validity information of a simulated validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnInfo {
    pub pre_op_gas: U256,
    pub prefund: U256,
    pub sig_failed: bool,
    pub valid_after: u64,
    pub valid_until: u64,
    pub paymaster_context: Bytes,
}

/// Deposit information of an entity taking part in the operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeInfo {
    pub addr: Address,
    pub deposit: U256,
}

/// Result of `simulateValidation`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub return_info: ReturnInfo,
    pub sender_info: StakeInfo,
    pub factory_info: Option<StakeInfo>,
    pub paymaster_info: Option<StakeInfo>,
}

/// Result of `simulateHandleOp`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub pre_op_gas: U256,
    pub paid: U256,
    pub valid_after: u64,
    pub valid_until: u64,
    pub call_gas_used: U256,
    pub target_success: bool,
    pub target_result: Bytes,
}
