use crate::{
    error::ValidationError,
    validate::{ValidationCheck, ValidationContext, ValidationMode},
};
use tracing::debug;
use warden_primitives::UserOperation;

/// Signature results and validity windows of the account and the paymaster.
///
/// Enforced only in [ValidationMode::HandleOps]; a simulation reports them in its result.
#[derive(Clone)]
pub struct ValidationWindow;

impl ValidationCheck for ValidationWindow {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        if ctx.mode == ValidationMode::Simulation {
            return Ok(());
        }
        let now = ctx.state.timestamp();

        if let Some(account) = &ctx.account {
            let data = account.validation_data;
            if data.is_sig_failed() {
                debug!(sender = ?uo.sender, signer = ?account.signer, "Account rejected signer");
                return Err(ValidationError::SignatureFailed {
                    rejection: account.rejection.clone(),
                });
            }
            if !data.is_valid_at(now) {
                return Err(ValidationError::Expired {
                    valid_after: data.valid_after,
                    valid_until: data.deadline(),
                });
            }
        }

        if let (Some(paymaster), Some(data)) = (ctx.paymaster, ctx.paymaster_validation) {
            if data.is_sig_failed() {
                return Err(ValidationError::PaymasterSignatureFailed { paymaster });
            }
            if !data.is_valid_at(now) {
                return Err(ValidationError::PaymasterExpired {
                    valid_after: data.valid_after,
                    valid_until: data.deadline(),
                });
            }
        }
        Ok(())
    }
}
