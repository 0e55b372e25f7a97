use ethers::types::{Address, U256};
use thiserror::Error;
use warden_primitives::{SelectorError, SignatureError};

/// Errors of the identity graph, the access control modules, the accounts and the ledger
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Signature bytes are malformed
    #[error("invalid signature: {inner}")]
    InvalidSignature {
        /// The inner error message
        inner: String,
    },

    /// Signature is well formed but does not recover to the expected authority
    #[error("unauthorized binding: signer {recovered:?} is not {expected:?}")]
    UnauthorizedBinding { expected: Address, recovered: Address },

    /// Identity was deleted from the graph and cannot be bound again
    #[error("binding of {platform}:{identity_value} was revoked")]
    BindingRevoked { platform: String, identity_value: String },

    /// Caller is not the controller of the access control module
    #[error("AccessControl: caller {caller:?} is not the controller")]
    Unauthorized { caller: Address },

    /// Account without access control called by someone other than its owner
    #[error("Account: Not authorized")]
    NotAuthorized { caller: Address },

    /// Caller or selector is not allowed by the bound access control module
    #[error("Account: Not authorized call")]
    NotAuthorizedCall { caller: Address, target: Address },

    /// Access control module governs another account
    #[error("access control module governs {module_account:?}, not {account:?}")]
    AccessControlMismatch { module_account: Address, account: Address },

    /// Account already has an access control module, the binding is permanent
    #[error("account {account:?} is already bound to access control {module:?}")]
    AccessControlAlreadySet { account: Address, module: Address },

    /// No contract at the address
    #[error("no contract at {0:?}")]
    UnknownContract(Address),

    #[error("insufficient funds: needed {needed}, available {available}")]
    InsufficientFunds { needed: U256, available: U256 },

    #[error("out of gas: used {used}, limit {limit}")]
    OutOfGas { used: U256, limit: U256 },

    /// Target contract reverted
    #[error("{0}")]
    Reverted(String),

    #[error("invalid call data: {inner}")]
    InvalidCallData {
        /// The inner error message
        inner: String,
    },

    #[error(transparent)]
    InvalidFunctionSignature(#[from] SelectorError),

    #[error("account {0:?} already exists")]
    AccountAlreadyExists(Address),

    #[error("invalid init code: {inner}")]
    InvalidInitCode {
        /// The inner error message
        inner: String,
    },
}

impl From<SignatureError> for ContractError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidSignature { inner } => Self::InvalidSignature { inner },
            SignatureError::UnauthorizedSigner { expected, recovered } => {
                Self::UnauthorizedBinding { expected, recovered }
            }
        }
    }
}

impl ContractError {
    pub fn reverted(reason: impl Into<String>) -> Self {
        Self::Reverted(reason.into())
    }

    /// Whether the error is a rejection by the account's execution gate
    pub fn is_gate_rejection(&self) -> bool {
        matches!(self, Self::NotAuthorized { .. } | Self::NotAuthorizedCall { .. })
    }
}
