use crate::{
    error::ValidationError,
    validate::{ValidationCheck, ValidationContext},
};
use warden_primitives::UserOperation;

/// The nonce matches the account's and is consumed
#[derive(Clone)]
pub struct Nonce;

impl ValidationCheck for Nonce {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        let account = ctx
            .state
            .account_mut(&uo.sender)
            .ok_or(ValidationError::AccountNotDeployed { sender: uo.sender })?;

        let expected = account.get_nonce();
        if uo.nonce != expected {
            return Err(ValidationError::InvalidNonce { expected, actual: uo.nonce });
        }
        account.increment_nonce();
        Ok(())
    }
}
