use crate::{
    error::ValidationError,
    validate::{ValidationCheck, ValidationContext},
};
use tracing::trace;
use warden_primitives::UserOperation;

/// Without a paymaster the account's deposit pays the prefund. The account tops up a short
/// deposit from its own balance.
#[derive(Clone)]
pub struct AccountPrefund;

impl ValidationCheck for AccountPrefund {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        if !uo.paymaster_and_data.is_empty() {
            return Ok(());
        }

        let deposit = ctx.state.deposit_of(&uo.sender);
        let missing = ctx.prefund.saturating_sub(deposit);
        if !missing.is_zero() {
            // all or nothing, the deposit check below decides
            if let Err(err) = ctx.state.deposit_to(uo.sender, uo.sender, missing) {
                trace!(sender = ?uo.sender, %err, "Account could not pay missing funds");
            }
        }

        let deposit = ctx.state.deposit_of(&uo.sender);
        ctx.state
            .debit_deposit(uo.sender, ctx.prefund)
            .map_err(|_| ValidationError::PrefundNotPaid { prefund: ctx.prefund, deposit })?;
        ctx.verification_gas = ctx.verification_gas.saturating_add(ctx.config.gas.prefund_transfer);
        Ok(())
    }
}
