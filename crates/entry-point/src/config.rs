//! Configuration of the entry point

use crate::{
    error::ConfigError,
    gas::{GasSchedule, Overhead},
};
use alloy_chains::Chain;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use warden_primitives::constants::entry_point::{ADDRESS_BYTES, DEV_CHAIN_ID};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryPointConfig {
    /// Address of the entry point, part of the user operation hash domain
    pub address: Address,
    /// Chain the entry point runs on, part of the user operation hash domain
    pub chain: Chain,
    /// Base fee used for the gas price of handled operations
    pub base_fee_per_gas: U256,
    /// Pre-verification gas model
    pub overhead: Overhead,
    /// Gas charged for validation and execution steps
    pub gas: GasSchedule,
    /// Reject operations whose `preVerificationGas` is below the overhead model
    pub check_pre_verification_gas: bool,
}

impl Default for EntryPointConfig {
    fn default() -> Self {
        Self {
            address: ADDRESS_BYTES,
            chain: Chain::from_id(DEV_CHAIN_ID),
            base_fee_per_gas: U256::zero(),
            overhead: Overhead::default(),
            gas: GasSchedule::default(),
            check_pre_verification_gas: false,
        }
    }
}

impl EntryPointConfig {
    pub fn chain_id(&self) -> u64 {
        self.chain.id()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
