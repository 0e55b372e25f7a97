use crate::{
    error::ValidationError,
    gas::{gas_price, required_prefund},
    validate::{ValidationCheck, ValidationContext},
};
use ethers::types::U256;
use warden_primitives::UserOperation;

/// Gas values fit in `uint120`; computes the prefund and the gas price
#[derive(Clone)]
pub struct GasValues;

impl ValidationCheck for GasValues {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        let max = U256::MAX >> 136;
        if [
            uo.call_gas_limit,
            uo.verification_gas_limit,
            uo.pre_verification_gas,
            uo.max_fee_per_gas,
            uo.max_priority_fee_per_gas,
        ]
        .iter()
        .any(|v| *v > max)
        {
            return Err(ValidationError::GasValuesOverflow);
        }

        ctx.prefund = required_prefund(uo);
        ctx.gas_price = gas_price(uo, ctx.config.base_fee_per_gas);
        Ok(())
    }
}

/// `preVerificationGas` covers the calldata overhead of the operation. Off unless enabled in
/// the configuration.
#[derive(Clone)]
pub struct PreVerificationGas;

impl ValidationCheck for PreVerificationGas {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        if !ctx.config.check_pre_verification_gas {
            return Ok(());
        }

        let expected = ctx.config.overhead.calculate_pre_verification_gas(uo);
        if uo.pre_verification_gas < expected {
            return Err(ValidationError::PreVerificationGasTooLow {
                pre_verification_gas: uo.pre_verification_gas,
                expected,
            });
        }
        Ok(())
    }
}
