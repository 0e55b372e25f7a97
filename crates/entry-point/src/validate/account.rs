use crate::{
    error::ValidationError,
    validate::{ValidationCheck, ValidationContext},
};
use warden_primitives::UserOperation;

/// Runs the account's `validateUserOp`: signature recovery and authorization of the calls.
///
/// Malformed signatures or call data make the account revert (`AA23`). A signer that may not
/// make the calls is only recorded here, [ValidationWindow](super::ValidationWindow) rejects it.
#[derive(Clone)]
pub struct AccountSignature;

impl ValidationCheck for AccountSignature {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        let account = ctx
            .state
            .account(&uo.sender)
            .ok_or(ValidationError::AccountNotDeployed { sender: uo.sender })?;
        let (module, graph) =
            ctx.state.gate_of(account).map_err(|inner| ValidationError::AccountReverted { inner })?;

        let validation = account
            .validate_user_op(uo, module, graph)
            .map_err(|inner| ValidationError::AccountReverted { inner })?;

        let lookups = validation.calls.len() as u64 + u64::from(module.is_some());
        ctx.verification_gas =
            ctx.verification_gas.saturating_add(ctx.config.gas.account_validation(lookups));
        ctx.account = Some(validation);
        Ok(())
    }
}
