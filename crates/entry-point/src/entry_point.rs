//! The entry point (dispatcher) validating and executing batches of user operations

use crate::{
    config::EntryPointConfig,
    error::{EntryPointError, ExecutionError, ValidationError},
    metrics,
    validate::{
        validate_user_operation, Sender, UserOperationValidationOutcome, ValidationCheck,
        ValidationContext, ValidationMode,
    },
};
use ethers::types::{Address, Bytes, U256};
use tracing::{debug, info, trace, warn};
use warden_contracts::{AccountCall, AccountFactory, CallOrigin, ContractError, State};
use warden_primitives::{
    simulation::{ExecutionResult, ReturnInfo, StakeInfo, ValidationResult},
    Event, UserOperation, UserOperationGasEstimation, UserOperationHash, UserOperationReceipt,
    UserOperationSigned,
};

/// What happened to one operation of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserOperationOutcome {
    /// Validation passed: the nonce was consumed and gas was paid. `error` is set when the
    /// execution reverted.
    Executed { receipt: UserOperationReceipt, error: Option<EntryPointError> },
    /// Validation failed, nothing changed
    Rejected(EntryPointError),
}

impl UserOperationOutcome {
    pub fn receipt(&self) -> Option<&UserOperationReceipt> {
        match self {
            Self::Executed { receipt, .. } => Some(receipt),
            Self::Rejected(_) => None,
        }
    }

    pub fn error(&self) -> Option<&EntryPointError> {
        match self {
            Self::Executed { error, .. } => error.as_ref(),
            Self::Rejected(err) => Some(err),
        }
    }

    /// Validated and executed without revert
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Executed { error: None, .. })
    }
}

/// Gas and result of the execution phase
struct Execution {
    call_gas_used: U256,
    result: Result<Bytes, ExecutionError>,
}

#[derive(Debug, Clone, Default)]
pub struct EntryPoint {
    config: EntryPointConfig,
    state: State,
}

impl EntryPoint {
    pub fn new(config: EntryPointConfig, state: State) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &EntryPointConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn into_state(self) -> State {
        self.state
    }

    /// Hash of the operation in the domain of this entry point and chain
    pub fn get_user_op_hash(&self, uo: &UserOperationSigned) -> UserOperationHash {
        uo.hash(&self.config.address, self.chain_id())
    }

    /// Next nonce of the sender, zero for an account not deployed yet
    pub fn get_nonce(&self, sender: &Address) -> U256 {
        self.state.account(sender).map(|a| a.get_nonce()).unwrap_or_default()
    }

    /// Address of the account `initCode` deploys
    pub fn get_sender_address(&self, init_code: &[u8]) -> Result<Address, EntryPointError> {
        let (factory, call) = AccountFactory::decode_init_code(init_code)?;
        let factory =
            self.state.factory(&factory).ok_or(ContractError::UnknownContract(factory))?;
        Ok(factory.get_address(call.owner, call.identity_graph, call.salt))
    }

    /// Adds `amount` from the payer's balance to the deposit of `account`
    pub fn deposit_to(
        &mut self,
        payer: Address,
        account: Address,
        amount: U256,
    ) -> Result<(), EntryPointError> {
        self.state.deposit_to(payer, account, amount)?;
        debug!(?payer, ?account, %amount, "Deposited");
        Ok(())
    }

    /// Deposit of the account at the entry point
    pub fn balance_of(&self, account: &Address) -> U256 {
        self.state.deposit_of(account)
    }

    /// Withdraws from the caller's own deposit
    pub fn withdraw_to(
        &mut self,
        caller: Address,
        withdraw_address: Address,
        amount: U256,
    ) -> Result<(), EntryPointError> {
        self.state.withdraw_to(caller, withdraw_address, amount)?;
        debug!(account = ?caller, ?withdraw_address, %amount, "Withdrawn");
        Ok(())
    }

    fn with_hash(&self, uo: &UserOperationSigned) -> UserOperation {
        uo.clone().with_hash(&self.config.address, self.chain_id())
    }

    fn stake_info(&self, addr: Address) -> StakeInfo {
        StakeInfo { addr, deposit: self.state.deposit_of(&addr) }
    }

    /// Validates the operation without executing it. The ledger is not modified.
    ///
    /// A signer that may not make the calls is reported with `sig_failed`, not as an error.
    pub fn simulate_validation(
        &self,
        uo: &UserOperationSigned,
    ) -> Result<ValidationResult, EntryPointError> {
        let uo = self.with_hash(uo);
        let mut state = self.state.clone();
        let outcome =
            validate_user_operation(&uo, &mut state, &self.config, ValidationMode::Simulation)
                .map_err(|error| EntryPointError::FailedOp { index: 0, error })?;

        let data = outcome.validation_data();
        trace!(hash = %uo.hash, sig_failed = data.is_sig_failed(), "Validation simulated");
        Ok(ValidationResult {
            return_info: ReturnInfo {
                pre_op_gas: outcome.pre_op_gas,
                prefund: outcome.prefund,
                sig_failed: data.is_sig_failed(),
                valid_after: data.valid_after,
                valid_until: data.deadline(),
                paymaster_context: outcome.paymaster_context.clone(),
            },
            sender_info: self.stake_info(uo.sender),
            factory_info: outcome.factory.map(|addr| self.stake_info(addr)),
            paymaster_info: outcome.paymaster.map(|addr| self.stake_info(addr)),
        })
    }

    /// Validates and executes the operation on a throw-away copy of the ledger
    pub fn simulate_handle_op(
        &self,
        uo: &UserOperationSigned,
    ) -> Result<ExecutionResult, EntryPointError> {
        let uo = self.with_hash(uo);
        let mut ep = self.clone();
        let outcome =
            validate_user_operation(&uo, &mut ep.state, &ep.config, ValidationMode::Simulation)
                .map_err(|error| EntryPointError::FailedOp { index: 0, error })?;

        let execution = ep.execute(&uo, &outcome);
        let data = outcome.validation_data();
        let paid = outcome
            .pre_op_gas
            .saturating_add(execution.call_gas_used)
            .saturating_mul(outcome.gas_price)
            .min(outcome.prefund);

        let (target_success, target_result) = match execution.result {
            Ok(ret) => (true, ret),
            Err(err) => (false, Bytes::from(err.to_string().into_bytes())),
        };
        Ok(ExecutionResult {
            pre_op_gas: outcome.pre_op_gas,
            paid,
            valid_after: data.valid_after,
            valid_until: data.deadline(),
            call_gas_used: execution.call_gas_used,
            target_success,
            target_result,
        })
    }

    /// Gas limits for an operation that is not signed yet.
    ///
    /// The calls are run without the gate on a copy of the ledger; a revert is an error.
    pub fn estimate_user_operation_gas(
        &self,
        uo: &UserOperationSigned,
    ) -> Result<UserOperationGasEstimation, EntryPointError> {
        let hashed = self.with_hash(uo);
        let mut state = self.state.clone();
        let mut ctx = ValidationContext::new(&mut state, &self.config, ValidationMode::Simulation);
        Sender
            .check_user_operation(&hashed, &mut ctx)
            .map_err(|error| EntryPointError::FailedOp { index: 0, error })?;
        let deployment_gas = ctx.verification_gas;

        let account = state.account(&uo.sender).ok_or(EntryPointError::FailedOp {
            index: 0,
            error: ValidationError::AccountNotDeployed { sender: uo.sender },
        })?;
        let calls = if uo.call_data.is_empty() {
            vec![]
        } else {
            AccountCall::decode(&uo.call_data)?.into_calls()?
        };

        let gas = &self.config.gas;
        let lookups = calls.len() as u64 + u64::from(account.access_control().is_some());
        let payment = if uo.paymaster_and_data.is_empty() {
            gas.prefund_transfer
        } else {
            gas.paymaster_validation
        };
        let verification_gas_limit = deployment_gas
            .saturating_add(gas.account_validation(lookups))
            .saturating_add(payment);

        let overhead = calls.iter().fold(0u64, |acc, c| acc.saturating_add(gas.call(c.value)));
        let outputs = state
            .simulate_calls(uo.sender, calls)
            .map_err(|err| EntryPointError::Execution { index: 0, error: err.into() })?;
        let call_gas_limit =
            outputs.iter().fold(overhead, |acc, out| acc.saturating_add(out.gas_used));

        // priced with the largest gas value in place of the pre-verification gas it pays for
        let filled = uo
            .clone()
            .verification_gas_limit(verification_gas_limit.into())
            .call_gas_limit(call_gas_limit.into())
            .pre_verification_gas(U256::MAX >> 136);
        let pre_verification_gas = self.config.overhead.calculate_pre_verification_gas(&filled);

        Ok(UserOperationGasEstimation {
            pre_verification_gas,
            verification_gas_limit: verification_gas_limit.into(),
            call_gas_limit: call_gas_limit.into(),
        })
    }

    /// Validates and executes the operations in order and pays the collected fees to
    /// `beneficiary`.
    ///
    /// Operations are isolated: a rejected or reverted operation does not affect the others.
    pub fn handle_ops(
        &mut self,
        uos: Vec<UserOperationSigned>,
        beneficiary: Address,
    ) -> Vec<UserOperationOutcome> {
        let total = uos.len();
        let mut collected = U256::zero();
        let mut outcomes = Vec::with_capacity(total);

        for (index, uo) in uos.iter().enumerate() {
            let uo = self.with_hash(uo);
            let outcome = self.handle_op(index, &uo);
            if let Some(receipt) = outcome.receipt() {
                collected = collected.saturating_add(receipt.actual_gas_cost);
            }
            outcomes.push(outcome);
        }

        self.state.fund(beneficiary, collected);

        let executed = outcomes.iter().filter(|o| o.receipt().is_some()).count();
        info!(
            ops = total,
            executed,
            rejected = total - executed,
            %collected,
            ?beneficiary,
            "Handled user operations"
        );
        outcomes
    }

    fn handle_op(&mut self, index: usize, uo: &UserOperation) -> UserOperationOutcome {
        let first_event = self.state.events().len();

        let mut working = self.state.clone();
        let outcome = match validate_user_operation(
            uo,
            &mut working,
            &self.config,
            ValidationMode::HandleOps,
        ) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    index,
                    hash = %uo.hash,
                    sender = ?uo.sender,
                    reason = %error,
                    "User operation validation failed"
                );
                metrics::record_validation_failure(error.code());
                self.state.emit(Event::ValidationFailed {
                    user_op_hash: uo.hash,
                    sender: uo.sender,
                    reason: error.to_string(),
                });
                return UserOperationOutcome::Rejected(EntryPointError::FailedOp { index, error });
            }
        };
        self.state = working;

        let execution = self.execute(uo, &outcome);
        let actual_gas_used = outcome.pre_op_gas.saturating_add(execution.call_gas_used);
        let actual_gas_cost =
            actual_gas_used.saturating_mul(outcome.gas_price).min(outcome.prefund);
        let paymaster = outcome.paymaster;

        self.state.credit_deposit(
            outcome.payer(uo.sender),
            outcome.prefund.saturating_sub(actual_gas_cost),
        );

        let error = execution.result.err();
        if let Some(err) = &error {
            warn!(
                index,
                hash = %uo.hash,
                sender = ?uo.sender,
                reason = %err,
                "User operation reverted"
            );
            metrics::record_execution_revert();
            self.state.emit(Event::UserOperationRevertReason {
                user_op_hash: uo.hash,
                sender: uo.sender,
                nonce: uo.nonce,
                revert_reason: err.to_string(),
            });
        }
        self.state.emit(Event::UserOperationEvent {
            user_op_hash: uo.hash,
            sender: uo.sender,
            paymaster,
            nonce: uo.nonce,
            success: error.is_none(),
            actual_gas_cost,
            actual_gas_used,
        });
        metrics::record_handled_op(error.is_none());
        debug!(
            index,
            hash = %uo.hash,
            signer = ?outcome.signer,
            %actual_gas_cost,
            success = error.is_none(),
            "User operation handled"
        );

        let receipt = UserOperationReceipt {
            user_operation_hash: uo.hash,
            sender: uo.sender,
            nonce: uo.nonce,
            paymaster,
            actual_gas_cost,
            actual_gas_used,
            success: error.is_none(),
            reason: error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            logs: self.state.events()[first_event..].to_vec(),
        };
        UserOperationOutcome::Executed {
            receipt,
            error: error.map(|error| EntryPointError::Execution { index, error }),
        }
    }

    /// Forwards the calls through the account's gate. Gate rejections and reverts charge the
    /// call overhead, running out of `callGasLimit` charges all of it.
    fn execute(
        &mut self,
        uo: &UserOperation,
        outcome: &UserOperationValidationOutcome,
    ) -> Execution {
        let limit = uo.call_gas_limit;
        let overhead = outcome
            .calls
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(self.config.gas.call(c.value)));
        let snapshot = self.state.clone();

        match self.state.execute_calls(
            CallOrigin::EntryPoint,
            outcome.signer,
            uo.sender,
            outcome.calls.clone(),
        ) {
            Ok(outputs) => {
                let used = U256::from(
                    outputs.iter().fold(overhead, |acc, out| acc.saturating_add(out.gas_used)),
                );
                if used > limit {
                    self.state = snapshot;
                    return Execution {
                        call_gas_used: limit,
                        result: Err(ExecutionError::OutOfGas { used, limit }),
                    };
                }
                Execution {
                    call_gas_used: used,
                    result: Ok(outputs
                        .last()
                        .map(|out| out.return_data.clone())
                        .unwrap_or_default()),
                }
            }
            Err(err) => Execution {
                call_gas_used: U256::from(overhead).min(limit),
                result: Err(err.into()),
            },
        }
    }
}
