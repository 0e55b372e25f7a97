use crate::{
    error::ValidationError,
    validate::{ValidationCheck, ValidationContext},
};
use tracing::debug;
use warden_contracts::{AccountFactory, ContractError};
use warden_primitives::{Event, UserOperation};

/// The sender exists, or `initCode` deploys it at the sender address
#[derive(Clone)]
pub struct Sender;

impl ValidationCheck for Sender {
    fn check_user_operation(
        &self,
        uo: &UserOperation,
        ctx: &mut ValidationContext,
    ) -> Result<(), ValidationError> {
        let deployed = ctx.state.account(&uo.sender).is_some();

        if uo.init_code.is_empty() {
            return if deployed {
                Ok(())
            } else {
                Err(ValidationError::AccountNotDeployed { sender: uo.sender })
            };
        }

        if deployed || ctx.state.is_deployed(&uo.sender) {
            return Err(ValidationError::SenderAlreadyConstructed { sender: uo.sender });
        }

        let (factory, call) = AccountFactory::decode_init_code(&uo.init_code)
            .map_err(|inner| ValidationError::InitCodeFailed { inner })?;
        let created = ctx
            .state
            .factory(&factory)
            .ok_or(ValidationError::InitCodeFailed {
                inner: ContractError::UnknownContract(factory),
            })?
            .get_address(call.owner, call.identity_graph, call.salt);
        if created != uo.sender {
            return Err(ValidationError::InitCodeSenderMismatch { sender: uo.sender, created });
        }

        ctx.state
            .create_account(factory, call.owner, call.identity_graph, call.salt)
            .map_err(|inner| ValidationError::InitCodeFailed { inner })?;
        debug!(sender = ?uo.sender, ?factory, "Account deployed from initCode");

        ctx.state.emit(Event::AccountDeployed {
            user_op_hash: uo.hash,
            sender: uo.sender,
            factory,
            paymaster: uo.get_entities().2,
        });
        ctx.factory = Some(factory);
        ctx.verification_gas = ctx.verification_gas.saturating_add(ctx.config.gas.account_creation);
        Ok(())
    }
}
