use ethers::types::{Address, U256};
use thiserror::Error;
use warden_contracts::ContractError;

/// Class of a failure, independent of where it was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Malformed signature bytes
    InvalidSignature,
    /// Well-formed signature by the wrong authority
    UnauthorizedBinding,
    /// Rejected by the account's execution gate
    NotAuthorizedCall,
    /// Replay or out-of-order submission
    NonceMismatch,
    /// Declared gas or fee bound too low
    ResourceExceeded,
    Other,
}

impl From<&ContractError> for FailureKind {
    fn from(err: &ContractError) -> Self {
        match err {
            ContractError::InvalidSignature { .. } => Self::InvalidSignature,
            ContractError::UnauthorizedBinding { .. } | ContractError::BindingRevoked { .. } => {
                Self::UnauthorizedBinding
            }
            ContractError::NotAuthorized { .. } |
            ContractError::NotAuthorizedCall { .. } |
            ContractError::Unauthorized { .. } => Self::NotAuthorizedCall,
            ContractError::OutOfGas { .. } | ContractError::InsufficientFunds { .. } => {
                Self::ResourceExceeded
            }
            _ => Self::Other,
        }
    }
}

/// Validation outcomes. The message of each variant is the reason the entry point reverts
/// with in `FailedOp`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("AA10 sender already constructed")]
    SenderAlreadyConstructed { sender: Address },

    #[error("AA13 initCode failed or OOG")]
    InitCodeFailed { inner: ContractError },

    #[error("AA14 initCode must return sender")]
    InitCodeSenderMismatch { sender: Address, created: Address },

    #[error("AA20 account not deployed")]
    AccountNotDeployed { sender: Address },

    #[error("AA21 didn't pay prefund")]
    PrefundNotPaid { prefund: U256, deposit: U256 },

    #[error("AA22 expired or not due")]
    Expired { valid_after: u64, valid_until: u64 },

    #[error("AA23 reverted: {inner}")]
    AccountReverted { inner: ContractError },

    /// Signature by a key that may not make the calls
    #[error("AA24 signature error")]
    SignatureFailed { rejection: Option<ContractError> },

    #[error("AA25 invalid account nonce")]
    InvalidNonce { expected: U256, actual: U256 },

    #[error("AA30 paymaster not deployed")]
    PaymasterNotDeployed { paymaster: Address },

    #[error("AA31 paymaster deposit too low")]
    PaymasterDepositTooLow { prefund: U256, deposit: U256 },

    #[error("AA32 paymaster expired or not due")]
    PaymasterExpired { valid_after: u64, valid_until: u64 },

    #[error("AA33 reverted: {inner}")]
    PaymasterReverted { inner: ContractError },

    #[error("AA34 signature error")]
    PaymasterSignatureFailed { paymaster: Address },

    #[error("AA40 over verificationGasLimit")]
    OverVerificationGasLimit { used: U256, limit: U256 },

    #[error("AA93 invalid paymasterAndData")]
    InvalidPaymasterAndData { len: usize },

    #[error("AA94 gas values overflow")]
    GasValuesOverflow,

    #[error("pre-verification gas {pre_verification_gas} is lower than {expected}")]
    PreVerificationGasTooLow { pre_verification_gas: U256, expected: U256 },
}

impl ValidationError {
    /// ERC-4337 reason code, used as a metrics label
    pub fn code(&self) -> &'static str {
        match self {
            Self::SenderAlreadyConstructed { .. } => "AA10",
            Self::InitCodeFailed { .. } => "AA13",
            Self::InitCodeSenderMismatch { .. } => "AA14",
            Self::AccountNotDeployed { .. } => "AA20",
            Self::PrefundNotPaid { .. } => "AA21",
            Self::Expired { .. } => "AA22",
            Self::AccountReverted { .. } => "AA23",
            Self::SignatureFailed { .. } => "AA24",
            Self::InvalidNonce { .. } => "AA25",
            Self::PaymasterNotDeployed { .. } => "AA30",
            Self::PaymasterDepositTooLow { .. } => "AA31",
            Self::PaymasterExpired { .. } => "AA32",
            Self::PaymasterReverted { .. } => "AA33",
            Self::PaymasterSignatureFailed { .. } => "AA34",
            Self::OverVerificationGasLimit { .. } => "AA40",
            Self::InvalidPaymasterAndData { .. } => "AA93",
            Self::GasValuesOverflow => "AA94",
            Self::PreVerificationGasTooLow { .. } => "PVG",
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::AccountReverted { inner } |
            Self::PaymasterReverted { inner } |
            Self::InitCodeFailed { inner } => inner.into(),
            Self::SignatureFailed { rejection: Some(inner) } => inner.into(),
            Self::SignatureFailed { rejection: None } | Self::PaymasterSignatureFailed { .. } => {
                FailureKind::UnauthorizedBinding
            }
            Self::InvalidNonce { .. } => FailureKind::NonceMismatch,
            Self::PrefundNotPaid { .. } |
            Self::PaymasterDepositTooLow { .. } |
            Self::OverVerificationGasLimit { .. } |
            Self::GasValuesOverflow |
            Self::PreVerificationGasTooLow { .. } => FailureKind::ResourceExceeded,
            _ => FailureKind::Other,
        }
    }
}

/// Failure of the execution phase. Validation effects (nonce, prefund) stay committed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The gate rejected the call at execution time
    #[error("{0}")]
    NotAuthorized(ContractError),

    #[error("{0}")]
    Reverted(ContractError),

    #[error("out of gas: used {used}, limit {limit}")]
    OutOfGas { used: U256, limit: U256 },
}

impl From<ContractError> for ExecutionError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::OutOfGas { used, limit } => Self::OutOfGas { used, limit },
            err if err.is_gate_rejection() => Self::NotAuthorized(err),
            err => Self::Reverted(err),
        }
    }
}

impl ExecutionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotAuthorized(_) => FailureKind::NotAuthorizedCall,
            Self::Reverted(inner) => inner.into(),
            Self::OutOfGas { .. } => FailureKind::ResourceExceeded,
        }
    }
}

/// Errors of the entry point
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntryPointError {
    /// Validation of the operation at `index` failed
    #[error("FailedOp({index}, \"{error}\")")]
    FailedOp { index: usize, error: ValidationError },

    /// Execution of the operation at `index` failed
    #[error("operation {index} reverted: {error}")]
    Execution { index: usize, error: ExecutionError },

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl EntryPointError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::FailedOp { error, .. } => error.kind(),
            Self::Execution { error, .. } => error.kind(),
            Self::Contract(inner) => inner.into(),
        }
    }
}

/// Errors loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
