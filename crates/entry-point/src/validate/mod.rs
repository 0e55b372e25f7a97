//! Validation of user operations.
//!
//! Validation is a chain of [ValidationCheck]s run against a working copy of the ledger. Each
//! check may reject the operation with a [ValidationError] or record what it learned in the
//! [ValidationContext] for the checks after it.

use crate::{config::EntryPointConfig, error::ValidationError};
use ethers::types::{Address, Bytes, U256};
use warden_contracts::{AccountValidation, State, TargetCall};
use warden_primitives::{simulation::ValidationData, UserOperation};

pub mod account;
pub mod gas_values;
pub mod nonce;
pub mod paymaster;
pub mod prefund;
pub mod sender;
pub mod verification_gas;
pub mod window;

pub use account::AccountSignature;
pub use gas_values::{GasValues, PreVerificationGas};
pub use nonce::Nonce;
pub use paymaster::Paymaster;
pub use prefund::AccountPrefund;
pub use sender::Sender;
pub use verification_gas::VerificationGas;
pub use window::ValidationWindow;

/// Whether the operation is about to be executed or only simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// `handleOps`: signature failures and closed windows reject the operation
    HandleOps,
    /// `simulateValidation`: signature failures and windows are reported, not enforced
    Simulation,
}

/// Data shared by the checks of one operation
pub struct ValidationContext<'a> {
    /// Working copy of the ledger, committed only if every check passes
    pub state: &'a mut State,
    pub config: &'a EntryPointConfig,
    pub mode: ValidationMode,
    pub gas_price: U256,
    pub prefund: U256,
    /// Gas used by validation so far
    pub verification_gas: u64,
    pub factory: Option<Address>,
    pub account: Option<AccountValidation>,
    pub paymaster: Option<Address>,
    pub paymaster_context: Bytes,
    pub paymaster_validation: Option<ValidationData>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(state: &'a mut State, config: &'a EntryPointConfig, mode: ValidationMode) -> Self {
        Self {
            state,
            config,
            mode,
            gas_price: U256::zero(),
            prefund: U256::zero(),
            verification_gas: 0,
            factory: None,
            account: None,
            paymaster: None,
            paymaster_context: Bytes::default(),
            paymaster_validation: None,
        }
    }

    pub fn into_outcome(self, uo: &UserOperation) -> UserOperationValidationOutcome {
        let (signer, calls, account_validation) = match self.account {
            Some(AccountValidation { signer, calls, validation_data, .. }) => {
                (signer, calls, validation_data)
            }
            None => (Address::zero(), vec![], ValidationData::ok()),
        };
        UserOperationValidationOutcome {
            signer,
            calls,
            prefund: self.prefund,
            gas_price: self.gas_price,
            pre_op_gas: U256::from(self.verification_gas).saturating_add(uo.pre_verification_gas),
            account_validation,
            paymaster_validation: self.paymaster_validation,
            paymaster: self.paymaster,
            paymaster_context: self.paymaster_context,
            factory: self.factory,
        }
    }
}

/// The outcome of a successful validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOperationValidationOutcome {
    /// Recovered signer of the operation
    pub signer: Address,
    /// Calls the account will forward
    pub calls: Vec<TargetCall>,
    pub prefund: U256,
    pub gas_price: U256,
    /// Validation gas plus `preVerificationGas`
    pub pre_op_gas: U256,
    pub account_validation: ValidationData,
    pub paymaster_validation: Option<ValidationData>,
    pub paymaster: Option<Address>,
    pub paymaster_context: Bytes,
    pub factory: Option<Address>,
}

impl UserOperationValidationOutcome {
    /// Account window intersected with the paymaster window
    pub fn validation_data(&self) -> ValidationData {
        match self.paymaster_validation {
            Some(pm) => self.account_validation.intersect(&pm),
            None => self.account_validation,
        }
    }

    /// Deposit paying for the operation
    pub fn payer(&self, sender: Address) -> Address {
        self.paymaster.unwrap_or(sender)
    }
}

/// A step of user operation validation
pub trait ValidationCheck: Send + Sync {
    /// Checks the [UserOperation](UserOperation) against the working copy of the ledger.
    ///
    /// # Arguments
    /// `uo` - The [UserOperation](UserOperation) to be checked.
    /// `ctx` - The [validation context](ValidationContext) holding the ledger and the results of
    /// the previous checks.
    ///
    /// # Returns
    /// Nothing if the check is successful, otherwise a [ValidationError](ValidationError).
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError>;
}

macro_rules! validation_check_impls {
    ( $( $name:ident )+ ) => {
        #[allow(non_snake_case)]
        impl<$($name : ValidationCheck,)+> ValidationCheck for ($($name,)+)
        {
            fn check_user_operation(
                &self,
                uo: &UserOperation,
                ctx: &mut ValidationContext,
            ) -> Result<(), ValidationError>
                {
                    let ($($name,)+) = self;
                    ($($name.check_user_operation(uo, ctx)?,)+);
                    Ok(())
                }
        }
    };
}

impl ValidationCheck for () {
    fn check_user_operation(
        &self,
        _uo: &UserOperation,
        _ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        Ok(())
    }
}

// These macro enable chaining checks:
// `(Check1, Check2, Check3, ...).check_user_operation(uo, ctx)`
validation_check_impls! { A }
validation_check_impls! { A B }
validation_check_impls! { A B C }
validation_check_impls! { A B C D }
validation_check_impls! { A B C D F }
validation_check_impls! { A B C D F G }
validation_check_impls! { A B C D F G I }
validation_check_impls! { A B C D F G I J }
validation_check_impls! { A B C D F G I J K }
validation_check_impls! { A B C D F G I J K L }

/// The checks of the entry point, in the order the on-chain entry point performs them
pub type StandardChecks = (
    Sender,
    GasValues,
    PreVerificationGas,
    AccountSignature,
    AccountPrefund,
    Nonce,
    Paymaster,
    VerificationGas,
    ValidationWindow,
);

pub fn standard_checks() -> StandardChecks {
    (
        Sender,
        GasValues,
        PreVerificationGas,
        AccountSignature,
        AccountPrefund,
        Nonce,
        Paymaster,
        VerificationGas,
        ValidationWindow,
    )
}

/// Runs the standard checks on `state`. On error the state may be partially modified and must
/// be discarded.
pub fn validate_user_operation(
    uo: &UserOperation,
    state: &mut State,
    config: &EntryPointConfig,
    mode: ValidationMode,
) -> Result<UserOperationValidationOutcome, ValidationError> {
    let mut ctx = ValidationContext::new(state, config, mode);
    standard_checks().check_user_operation(uo, &mut ctx)?;
    Ok(ctx.into_outcome(uo))
}
