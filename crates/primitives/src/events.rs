//! Events recorded by the ledger for external indexers

use crate::{identity::Identity, selector::Selector, UserOperationHash};
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Event emitted by the identity graph, the access control modules, the accounts, the stake
/// manager or the entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    BindingCreated {
        graph: Address,
        identity: Identity,
    },
    BindingRemoved {
        graph: Address,
        identity: Identity,
    },
    #[serde(rename_all = "camelCase")]
    AccessControlChanged {
        module: Address,
        /// `None` for an entry valid on any target
        target: Option<Address>,
        function_signature: String,
        allowed: bool,
    },
    AccessControlSet {
        account: Address,
        module: Address,
    },
    AccountExecuted {
        account: Address,
        target: Address,
        value: U256,
        selector: Option<Selector>,
    },
    #[serde(rename_all = "camelCase")]
    Deposited {
        account: Address,
        total_deposit: U256,
    },
    #[serde(rename_all = "camelCase")]
    Withdrawn {
        account: Address,
        withdraw_address: Address,
        amount: U256,
    },
    #[serde(rename_all = "camelCase")]
    AccountDeployed {
        user_op_hash: UserOperationHash,
        sender: Address,
        factory: Address,
        paymaster: Option<Address>,
    },
    #[serde(rename_all = "camelCase")]
    UserOperationEvent {
        user_op_hash: UserOperationHash,
        sender: Address,
        paymaster: Option<Address>,
        nonce: U256,
        success: bool,
        actual_gas_cost: U256,
        actual_gas_used: U256,
    },
    #[serde(rename_all = "camelCase")]
    UserOperationRevertReason {
        user_op_hash: UserOperationHash,
        sender: Address,
        nonce: U256,
        revert_reason: String,
    },
    #[serde(rename_all = "camelCase")]
    ValidationFailed {
        user_op_hash: UserOperationHash,
        sender: Address,
        reason: String,
    },
    /// Application event emitted by a target contract
    Log {
        address: Address,
        name: String,
        data: Bytes,
    },
}

impl Event {
    /// Name of the event
    pub fn name(&self) -> &str {
        match self {
            Event::BindingCreated { .. } => "BindingCreated",
            Event::BindingRemoved { .. } => "BindingRemoved",
            Event::AccessControlChanged { .. } => "AccessControlChanged",
            Event::AccessControlSet { .. } => "AccessControlSet",
            Event::AccountExecuted { .. } => "AccountExecuted",
            Event::Deposited { .. } => "Deposited",
            Event::Withdrawn { .. } => "Withdrawn",
            Event::AccountDeployed { .. } => "AccountDeployed",
            Event::UserOperationEvent { .. } => "UserOperationEvent",
            Event::UserOperationRevertReason { .. } => "UserOperationRevertReason",
            Event::ValidationFailed { .. } => "ValidationFailed",
            Event::Log { name, .. } => name,
        }
    }
}
