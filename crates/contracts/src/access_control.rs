//! Access control module: allow-list of functions a controller may call through an account

use crate::error::ContractError;
use ethers::types::Address;
use std::collections::HashMap;
use tracing::debug;
use warden_primitives::{Event, FunctionSignature, Selector};

/// Allow-list key. `target == None` is an entry valid on any target.
type Entry = (Option<Address>, Selector);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
    address: Address,
    controller: Address,
    account: Address,
    functions: HashMap<Entry, bool>,
}

impl AccessControl {
    pub fn new(address: Address, controller: Address, account: Address) -> Self {
        Self { address, controller, account, functions: HashMap::new() }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn controller(&self) -> Address {
        self.controller
    }

    /// Account governed by the module
    pub fn account(&self) -> Address {
        self.account
    }

    /// Allows or disallows `signature` (e.g. `"createNewGame(address,address)"`) on any target
    pub fn set_valid_function(
        &mut self,
        caller: Address,
        signature: &str,
        allowed: bool,
    ) -> Result<Event, ContractError> {
        self.set_entry(caller, None, signature, allowed)
    }

    /// Allows or disallows `signature` on `target` only
    pub fn set_valid_target_function(
        &mut self,
        caller: Address,
        target: Address,
        signature: &str,
        allowed: bool,
    ) -> Result<Event, ContractError> {
        self.set_entry(caller, Some(target), signature, allowed)
    }

    /// Wildcard entry lookup, `false` for unset entries and unparsable signatures
    pub fn is_allowed(&self, signature: &str) -> bool {
        FunctionSignature::parse(signature)
            .map(|f| self.get(&(None, f.selector)))
            .unwrap_or(false)
    }

    /// Whether a call of `selector` on `target` is allowed. An entry scoped to `target` takes
    /// precedence over the wildcard entry, in both directions.
    pub fn is_allowed_call(&self, target: Address, selector: Selector) -> bool {
        self.functions
            .get(&(Some(target), selector))
            .copied()
            .unwrap_or_else(|| self.get(&(None, selector)))
    }

    fn get(&self, entry: &Entry) -> bool {
        self.functions.get(entry).copied().unwrap_or(false)
    }

    fn set_entry(
        &mut self,
        caller: Address,
        target: Option<Address>,
        signature: &str,
        allowed: bool,
    ) -> Result<Event, ContractError> {
        if caller != self.controller {
            return Err(ContractError::Unauthorized { caller });
        }
        let function = FunctionSignature::parse(signature)?;

        debug!(
            module = ?self.address,
            ?target,
            function = %function,
            allowed,
            "Setting valid function"
        );
        self.functions.insert((target, function.selector), allowed);

        Ok(Event::AccessControlChanged {
            module: self.address,
            target,
            function_signature: function.canonical(),
            allowed,
        })
    }
}
