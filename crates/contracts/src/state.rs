//! In-memory ledger holding balances, deposits, contracts and the event log.
//!
//! `State` is `Clone`: a failed operation is rolled back by restoring a snapshot, which also
//! drops the events the operation emitted.

use crate::{
    access_control::AccessControl,
    account::{Account, CallOrigin, TargetCall},
    contract::{CallContext, CallOutput, Contract},
    error::ContractError,
    factory::AccountFactory,
    identity_graph::IdentityGraph,
    paymaster::VerifyingPaymaster,
};
use ethers::{
    types::{Address, Bytes, U256},
    utils::get_contract_address,
};
use std::collections::HashMap;
use tracing::{debug, trace};
use warden_primitives::{Action, Event, Identity};

#[derive(Clone, Debug, Default)]
pub struct State {
    timestamp: u64,
    balances: HashMap<Address, U256>,
    deposits: HashMap<Address, U256>,
    accounts: HashMap<Address, Account>,
    identity_graphs: HashMap<Address, IdentityGraph>,
    access_controls: HashMap<Address, AccessControl>,
    factories: HashMap<Address, AccountFactory>,
    paymasters: HashMap<Address, VerifyingPaymaster>,
    contracts: HashMap<Address, Box<dyn Contract>>,
    deploy_nonces: HashMap<Address, u64>,
    events: Vec<Event>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Ordered event log
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn emit(&mut self, event: Event) {
        trace!(event = event.name(), "Event");
        self.events.push(event);
    }

    // Native balances

    pub fn balance(&self, addr: &Address) -> U256 {
        self.balances.get(addr).copied().unwrap_or_default()
    }

    /// Credits `amount` out of thin air (genesis allocation, tests)
    pub fn fund(&mut self, addr: Address, amount: U256) {
        let balance = self.balances.entry(addr).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ContractError> {
        self.debit_balance(from, amount)?;
        self.fund(to, amount);
        Ok(())
    }

    fn debit_balance(&mut self, addr: Address, amount: U256) -> Result<(), ContractError> {
        let available = self.balance(&addr);
        if available < amount {
            return Err(ContractError::InsufficientFunds { needed: amount, available });
        }
        self.balances.insert(addr, available - amount);
        Ok(())
    }

    // Deposits held by the entry point

    pub fn deposit_of(&self, addr: &Address) -> U256 {
        self.deposits.get(addr).copied().unwrap_or_default()
    }

    /// Moves `amount` from the payer's balance to the deposit of `account`
    pub fn deposit_to(
        &mut self,
        payer: Address,
        account: Address,
        amount: U256,
    ) -> Result<(), ContractError> {
        self.debit_balance(payer, amount)?;
        self.credit_deposit(account, amount);
        self.emit(Event::Deposited { account, total_deposit: self.deposit_of(&account) });
        Ok(())
    }

    /// Moves `amount` from the deposit of `account` to the balance of `withdraw_address`
    pub fn withdraw_to(
        &mut self,
        account: Address,
        withdraw_address: Address,
        amount: U256,
    ) -> Result<(), ContractError> {
        self.debit_deposit(account, amount)?;
        self.fund(withdraw_address, amount);
        self.emit(Event::Withdrawn { account, withdraw_address, amount });
        Ok(())
    }

    pub fn debit_deposit(&mut self, addr: Address, amount: U256) -> Result<(), ContractError> {
        let available = self.deposit_of(&addr);
        if available < amount {
            return Err(ContractError::InsufficientFunds { needed: amount, available });
        }
        self.deposits.insert(addr, available - amount);
        Ok(())
    }

    pub fn credit_deposit(&mut self, addr: Address, amount: U256) {
        let deposit = self.deposits.entry(addr).or_default();
        *deposit = deposit.saturating_add(amount);
    }

    // Deployment

    fn next_address(&mut self, deployer: Address) -> Address {
        let nonce = self.deploy_nonces.entry(deployer).or_default();
        let addr = get_contract_address(deployer, *nonce);
        *nonce += 1;
        addr
    }

    /// Whether anything lives at the address
    pub fn is_deployed(&self, addr: &Address) -> bool {
        self.accounts.contains_key(addr) ||
            self.identity_graphs.contains_key(addr) ||
            self.access_controls.contains_key(addr) ||
            self.factories.contains_key(addr) ||
            self.paymasters.contains_key(addr) ||
            self.contracts.contains_key(addr)
    }

    pub fn deploy_identity_graph(&mut self, deployer: Address, root: Address) -> Address {
        let addr = self.next_address(deployer);
        self.identity_graphs.insert(addr, IdentityGraph::new(addr, root));
        addr
    }

    /// Identity graph rooted at an uncompressed public key
    pub fn deploy_identity_graph_from_public_key(
        &mut self,
        deployer: Address,
        public_key: &[u8],
    ) -> Result<Address, ContractError> {
        let addr = self.next_address(deployer);
        self.identity_graphs.insert(addr, IdentityGraph::from_public_key(addr, public_key)?);
        Ok(addr)
    }

    pub fn deploy_access_control(
        &mut self,
        deployer: Address,
        controller: Address,
        account: Address,
    ) -> Address {
        let addr = self.next_address(deployer);
        self.access_controls.insert(addr, AccessControl::new(addr, controller, account));
        addr
    }

    pub fn deploy_account_factory(&mut self, deployer: Address, entry_point: Address) -> Address {
        let addr = self.next_address(deployer);
        self.factories.insert(addr, AccountFactory::new(addr, entry_point));
        addr
    }

    pub fn deploy_paymaster(
        &mut self,
        deployer: Address,
        entry_point: Address,
        verifying_signer: Address,
    ) -> Address {
        let addr = self.next_address(deployer);
        self.paymasters.insert(addr, VerifyingPaymaster::new(addr, entry_point, verifying_signer));
        addr
    }

    /// Deploys a target contract
    pub fn deploy_contract(&mut self, deployer: Address, contract: Box<dyn Contract>) -> Address {
        let addr = self.next_address(deployer);
        self.contracts.insert(addr, contract);
        addr
    }

    pub fn insert_account(&mut self, account: Account) -> Result<(), ContractError> {
        if self.is_deployed(&account.address()) {
            return Err(ContractError::AccountAlreadyExists(account.address()));
        }
        debug!(account = ?account.address(), owner = ?account.owner(), "Account created");
        self.accounts.insert(account.address(), account);
        Ok(())
    }

    /// Deploys an account through the factory. Returns the existing address when the account is
    /// already deployed.
    pub fn create_account(
        &mut self,
        factory: Address,
        owner: Address,
        identity_graph: Address,
        salt: U256,
    ) -> Result<Address, ContractError> {
        let account = self
            .factories
            .get(&factory)
            .ok_or(ContractError::UnknownContract(factory))?
            .create_account(owner, identity_graph, salt);
        let addr = account.address();
        if !self.accounts.contains_key(&addr) {
            self.insert_account(account)?;
        }
        Ok(addr)
    }

    // Lookups

    pub fn account(&self, addr: &Address) -> Option<&Account> {
        self.accounts.get(addr)
    }

    pub fn account_mut(&mut self, addr: &Address) -> Option<&mut Account> {
        self.accounts.get_mut(addr)
    }

    pub fn identity_graph(&self, addr: &Address) -> Option<&IdentityGraph> {
        self.identity_graphs.get(addr)
    }

    pub fn access_control(&self, addr: &Address) -> Option<&AccessControl> {
        self.access_controls.get(addr)
    }

    pub fn factory(&self, addr: &Address) -> Option<&AccountFactory> {
        self.factories.get(addr)
    }

    pub fn paymaster(&self, addr: &Address) -> Option<&VerifyingPaymaster> {
        self.paymasters.get(addr)
    }

    /// Access control module and identity graph the account's gate consults
    pub fn gate_of(
        &self,
        account: &Account,
    ) -> Result<(Option<&AccessControl>, Option<&IdentityGraph>), ContractError> {
        let module = account
            .access_control()
            .map(|addr| self.access_control(&addr).ok_or(ContractError::UnknownContract(addr)))
            .transpose()?;
        let graph = account.identity_graph().and_then(|addr| self.identity_graph(&addr));
        Ok((module, graph))
    }

    // Authenticated mutations

    /// Submits a root-signed binding to the identity graph
    pub fn set_identity(
        &mut self,
        graph: Address,
        identity: Identity,
        action: Action,
        signature: &[u8],
    ) -> Result<(), ContractError> {
        let event = self
            .identity_graphs
            .get_mut(&graph)
            .ok_or(ContractError::UnknownContract(graph))?
            .set_identity(identity, action, signature)?;
        self.emit(event);
        Ok(())
    }

    pub fn set_valid_function(
        &mut self,
        caller: Address,
        module: Address,
        signature: &str,
        allowed: bool,
    ) -> Result<(), ContractError> {
        let event = self
            .access_controls
            .get_mut(&module)
            .ok_or(ContractError::UnknownContract(module))?
            .set_valid_function(caller, signature, allowed)?;
        self.emit(event);
        Ok(())
    }

    pub fn set_valid_target_function(
        &mut self,
        caller: Address,
        module: Address,
        target: Address,
        signature: &str,
        allowed: bool,
    ) -> Result<(), ContractError> {
        let event = self
            .access_controls
            .get_mut(&module)
            .ok_or(ContractError::UnknownContract(module))?
            .set_valid_target_function(caller, target, signature, allowed)?;
        self.emit(event);
        Ok(())
    }

    /// Binds the access control module to the account with the owner's signature
    pub fn set_access_control(
        &mut self,
        account: Address,
        module: Address,
        signature: &[u8],
    ) -> Result<(), ContractError> {
        let m = self.access_controls.get(&module).ok_or(ContractError::UnknownContract(module))?;
        let event = self
            .accounts
            .get_mut(&account)
            .ok_or(ContractError::UnknownContract(account))?
            .set_access_control(m, signature)?;
        self.emit(event);
        Ok(())
    }

    /// Tops up the entry point deposit of the account. No authorization check.
    pub fn add_deposit(
        &mut self,
        payer: Address,
        account: Address,
        amount: U256,
    ) -> Result<(), ContractError> {
        if !self.accounts.contains_key(&account) {
            return Err(ContractError::UnknownContract(account));
        }
        self.deposit_to(payer, account, amount)
    }

    // Execution

    /// `execute(target, value, callData)` called directly on the account
    pub fn execute(
        &mut self,
        caller: Address,
        account: Address,
        target: Address,
        value: U256,
        call_data: Bytes,
    ) -> Result<CallOutput, ContractError> {
        let mut outputs = self.execute_calls(
            CallOrigin::Direct,
            caller,
            account,
            vec![TargetCall { target, value, data: call_data }],
        )?;
        Ok(outputs.pop().unwrap_or_default())
    }

    /// `executeBatch(dest, func)` called directly on the account
    pub fn execute_batch(
        &mut self,
        caller: Address,
        account: Address,
        dest: Vec<Address>,
        func: Vec<Bytes>,
    ) -> Result<Vec<CallOutput>, ContractError> {
        if dest.len() != func.len() {
            return Err(ContractError::InvalidCallData { inner: "wrong array lengths".into() });
        }
        let calls = dest
            .into_iter()
            .zip(func)
            .map(|(target, data)| TargetCall { target, value: U256::zero(), data })
            .collect();
        self.execute_calls(CallOrigin::Direct, caller, account, calls)
    }

    /// Runs the calls through the account's gate. All or nothing: on any rejection or revert
    /// the state is restored.
    pub fn execute_calls(
        &mut self,
        origin: CallOrigin,
        caller: Address,
        account: Address,
        calls: Vec<TargetCall>,
    ) -> Result<Vec<CallOutput>, ContractError> {
        {
            let acc = self.accounts.get(&account).ok_or(ContractError::UnknownContract(account))?;
            let (module, graph) = self.gate_of(acc)?;
            for call in calls.iter() {
                acc.authorize_call(origin, caller, module, graph, call)?;
            }
        }

        let outputs = self.run_calls(account, calls)?;
        debug!(?account, ?caller, calls = outputs.len(), "Account executed");
        Ok(outputs)
    }

    /// Runs the calls on a throw-away copy of the ledger, bypassing the gate. Used to measure
    /// the gas of calls before they are signed.
    pub fn simulate_calls(
        &self,
        account: Address,
        calls: Vec<TargetCall>,
    ) -> Result<Vec<CallOutput>, ContractError> {
        self.clone().run_calls(account, calls)
    }

    fn run_calls(
        &mut self,
        account: Address,
        calls: Vec<TargetCall>,
    ) -> Result<Vec<CallOutput>, ContractError> {
        let snapshot = self.clone();
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            match self.call(account, &call) {
                Ok(out) => {
                    self.emit(Event::AccountExecuted {
                        account,
                        target: call.target,
                        value: call.value,
                        selector: call.selector(),
                    });
                    outputs.push(out);
                }
                Err(err) => {
                    debug!(?account, target = ?call.target, %err, "Execution reverted");
                    *self = snapshot;
                    return Err(err);
                }
            }
        }
        Ok(outputs)
    }

    /// Message call from an externally owned account straight into a target contract. A
    /// revert leaves no trace.
    pub fn transact(
        &mut self,
        caller: Address,
        target: Address,
        value: U256,
        data: Bytes,
    ) -> Result<CallOutput, ContractError> {
        let snapshot = self.clone();
        match self.call(caller, &TargetCall { target, value, data }) {
            Ok(out) => Ok(out),
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Message call from `caller` into the target. A call without data to an address with no
    /// contract is a plain value transfer.
    fn call(&mut self, caller: Address, call: &TargetCall) -> Result<CallOutput, ContractError> {
        if !call.value.is_zero() {
            self.transfer(caller, call.target, call.value)?;
        }

        let Some(contract) = self.contracts.get(&call.target) else {
            return if call.data.is_empty() {
                Ok(CallOutput::default())
            } else {
                Err(ContractError::UnknownContract(call.target))
            };
        };

        let mut contract = contract.box_clone();
        let ctx = CallContext {
            caller,
            address: call.target,
            value: call.value,
            timestamp: self.timestamp,
        };
        let out = contract.call(&ctx, &call.data)?;
        self.contracts.insert(call.target, contract);
        self.events.extend(out.logs.iter().cloned());
        Ok(out)
    }
}
