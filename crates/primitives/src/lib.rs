//! Delegated account abstraction (ERC-4337) primitive types
//!
//! This crate contains the user operation codec, the personal-message signature verifier, the
//! identity, selector and event types shared by the contracts and the entry point, and helper
//! functions.

pub mod constants;
pub mod events;
pub mod identity;
pub mod selector;
pub mod signature;
pub mod simulation;
mod user_operation;
mod utils;
mod wallet;

pub use events::Event;
pub use identity::{Action, Identity};
pub use selector::{FunctionSignature, Selector, SelectorError};
pub use signature::{Authorized, SignatureError};
pub use user_operation::{
    UserOperation, UserOperationGasEstimation, UserOperationHash, UserOperationReceipt,
    UserOperationRequest, UserOperationSigned,
};
pub use utils::{as_checksum_addr, as_checksum_addr_opt, get_address};
pub use wallet::Wallet;
