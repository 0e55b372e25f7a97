use crate::{
    error::ValidationError,
    validate::{ValidationCheck, ValidationContext},
};
use warden_primitives::{get_address, UserOperation};

/// Sponsorship by a verifying paymaster: the paymaster exists, its deposit covers the prefund
/// and it accepts the operation
#[derive(Clone)]
pub struct Paymaster;

impl ValidationCheck for Paymaster {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        if uo.paymaster_and_data.is_empty() {
            return Ok(());
        }

        let addr = get_address(&uo.paymaster_and_data).ok_or(
            ValidationError::InvalidPaymasterAndData { len: uo.paymaster_and_data.len() },
        )?;
        let paymaster = ctx
            .state
            .paymaster(&addr)
            .cloned()
            .ok_or(ValidationError::PaymasterNotDeployed { paymaster: addr })?;

        let deposit = ctx.state.deposit_of(&addr);
        if deposit < ctx.prefund {
            return Err(ValidationError::PaymasterDepositTooLow { prefund: ctx.prefund, deposit });
        }
        ctx.state
            .debit_deposit(addr, ctx.prefund)
            .map_err(|inner| ValidationError::PaymasterReverted { inner })?;

        let (context, validation_data) = paymaster
            .validate_paymaster_user_op(uo, ctx.config.chain_id())
            .map_err(|inner| ValidationError::PaymasterReverted { inner })?;

        ctx.paymaster = Some(addr);
        ctx.paymaster_context = context;
        ctx.paymaster_validation = Some(validation_data);
        ctx.verification_gas =
            ctx.verification_gas.saturating_add(ctx.config.gas.paymaster_validation);
        Ok(())
    }
}
