use crate::{
    error::ValidationError,
    validate::{ValidationCheck, ValidationContext},
};
use ethers::types::U256;
use warden_primitives::UserOperation;

/// Validation used no more gas than `verificationGasLimit`
#[derive(Clone)]
pub struct VerificationGas;

impl ValidationCheck for VerificationGas {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        let used = U256::from(ctx.verification_gas);
        if used > uo.verification_gas_limit {
            return Err(ValidationError::OverVerificationGasLimit {
                used,
                limit: uo.verification_gas_limit,
            });
        }
        Ok(())
    }
}
