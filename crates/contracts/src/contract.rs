//! External target contracts called through accounts

use crate::error::ContractError;
use ethers::types::{Address, Bytes, U256};
use std::fmt;
use warden_primitives::Event;

/// Context of a call into a target contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Immediate caller (the account)
    pub caller: Address,
    /// Address of the called contract
    pub address: Address,
    pub value: U256,
    /// Ledger timestamp
    pub timestamp: u64,
}

/// Output of a successful call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOutput {
    pub return_data: Bytes,
    pub gas_used: u64,
    /// Events emitted by the contract, recorded by the ledger when the call commits
    pub logs: Vec<Event>,
}

/// Contract living in the ledger that accounts can call.
///
/// A call that returns an error reverts: the ledger discards every change the contract made
/// during the call.
pub trait Contract: fmt::Debug + Send + Sync {
    fn call(&mut self, ctx: &CallContext, data: &[u8]) -> Result<CallOutput, ContractError>;

    fn box_clone(&self) -> Box<dyn Contract>;
}

impl Clone for Box<dyn Contract> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
