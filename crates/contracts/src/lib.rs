//! Delegated account abstraction (ERC-4337) contracts
//!
//! Identity graph, access control module, smart account with its execution gate, account
//! factory, verifying paymaster and the in-memory ledger they live in.

pub mod access_control;
pub mod account;
pub mod contract;
mod error;
pub mod factory;
pub mod identity_graph;
pub mod paymaster;
pub mod state;

pub use access_control::AccessControl;
pub use account::{
    Account, AccountCall, AccountValidation, CallOrigin, ExecuteBatchCall, ExecuteCall, TargetCall,
};
pub use contract::{CallContext, CallOutput, Contract};
pub use error::ContractError;
pub use factory::{AccountFactory, CreateAccountCall};
pub use identity_graph::{Binding, IdentityGraph};
pub use paymaster::VerifyingPaymaster;
pub use state::State;
