//! Smart account with an execution gate.
//!
//! Without an access control module only the owner may execute. Once a module is bound, a call
//! goes through iff the caller is the module's controller (or, for user operations, a session
//! key bound in the owner's identity graph) and the called selector is allow-listed.

use crate::{access_control::AccessControl, error::ContractError, identity_graph::IdentityGraph};
use ethers::{
    abi::AbiDecode,
    contract::EthCall,
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use tracing::{debug, info};
use warden_primitives::{
    signature, simulation::ValidationData, Event, Identity, Selector, UserOperation,
};

/// `execute(address,uint256,bytes)`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "execute", abi = "execute(address,uint256,bytes)")]
pub struct ExecuteCall {
    pub dest: Address,
    pub value: U256,
    pub func: Bytes,
}

/// `executeBatch(address[],bytes[])`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "executeBatch", abi = "executeBatch(address[],bytes[])")]
pub struct ExecuteBatchCall {
    pub dest: Vec<Address>,
    pub func: Vec<Bytes>,
}

/// Call data accepted by the account
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountCall {
    Execute(ExecuteCall),
    ExecuteBatch(ExecuteBatchCall),
}

impl AccountCall {
    pub fn decode(data: &[u8]) -> Result<Self, ContractError> {
        if let Ok(call) = <ExecuteCall as AbiDecode>::decode(data) {
            return Ok(Self::Execute(call));
        }
        if let Ok(call) = <ExecuteBatchCall as AbiDecode>::decode(data) {
            return Ok(Self::ExecuteBatch(call));
        }
        Err(ContractError::InvalidCallData {
            inner: format!(
                "unknown account function {}",
                Selector::from_call_data(data).map(|s| s.to_string()).unwrap_or_default()
            ),
        })
    }

    /// Target calls in execution order
    pub fn into_calls(self) -> Result<Vec<TargetCall>, ContractError> {
        match self {
            Self::Execute(call) => {
                Ok(vec![TargetCall { target: call.dest, value: call.value, data: call.func }])
            }
            Self::ExecuteBatch(call) => {
                if call.dest.len() != call.func.len() {
                    return Err(ContractError::InvalidCallData {
                        inner: "wrong array lengths".into(),
                    });
                }
                Ok(call
                    .dest
                    .into_iter()
                    .zip(call.func)
                    .map(|(target, data)| TargetCall { target, value: U256::zero(), data })
                    .collect())
            }
        }
    }
}

/// One call forwarded by the account
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetCall {
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
}

impl TargetCall {
    pub fn selector(&self) -> Option<Selector> {
        Selector::from_call_data(&self.data)
    }
}

/// Who is invoking the gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallOrigin {
    /// Literal caller of `execute`
    Direct,
    /// Recovered signer of a user operation handled by the entry point
    EntryPoint,
}

/// Outcome of [Account::validate_user_op]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountValidation {
    pub signer: Address,
    pub validation_data: ValidationData,
    /// Calls decoded from the call data
    pub calls: Vec<TargetCall>,
    /// Why the signer was refused, if it was
    pub rejection: Option<ContractError>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    address: Address,
    owner: Address,
    entry_point: Address,
    identity_graph: Option<Address>,
    access_control: Option<Address>,
    nonce: U256,
}

impl Account {
    pub fn new(
        address: Address,
        owner: Address,
        entry_point: Address,
        identity_graph: Option<Address>,
    ) -> Self {
        Self {
            address,
            owner,
            entry_point,
            identity_graph,
            access_control: None,
            nonce: U256::zero(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub fn get_nonce(&self) -> U256 {
        self.nonce
    }

    pub fn access_control(&self) -> Option<Address> {
        self.access_control
    }

    pub fn identity_graph(&self) -> Option<Address> {
        self.identity_graph
    }

    /// Bumps the nonce after a successful validation
    pub fn increment_nonce(&mut self) -> U256 {
        self.nonce = self.nonce.saturating_add(U256::one());
        self.nonce
    }

    /// Digest the owner signs to bind an access control module
    pub fn access_control_digest(module: Address) -> H256 {
        keccak256(module.as_bytes()).into()
    }

    /// Binds the access control module. Anyone may submit, the owner's signature over
    /// [Account::access_control_digest] is the authority. The binding is set once.
    pub fn set_access_control(
        &mut self,
        module: &AccessControl,
        signature: &[u8],
    ) -> Result<Event, ContractError> {
        if let Some(bound) = self.access_control {
            return Err(ContractError::AccessControlAlreadySet {
                account: self.address,
                module: bound,
            });
        }
        signature::authorize(Self::access_control_digest(module.address()), signature, self.owner)?;

        if module.account() != self.address {
            return Err(ContractError::AccessControlMismatch {
                module_account: module.account(),
                account: self.address,
            });
        }

        info!(account = ?self.address, module = ?module.address(), "Access control bound");
        self.access_control = Some(module.address());
        Ok(Event::AccessControlSet { account: self.address, module: module.address() })
    }

    /// Execution gate
    pub fn authorize_call(
        &self,
        origin: CallOrigin,
        caller: Address,
        module: Option<&AccessControl>,
        graph: Option<&IdentityGraph>,
        call: &TargetCall,
    ) -> Result<(), ContractError> {
        let Some(module) = module else {
            return if caller == self.owner {
                Ok(())
            } else {
                Err(ContractError::NotAuthorized { caller })
            };
        };

        let delegate = caller == module.controller() ||
            (origin == CallOrigin::EntryPoint && self.is_session_key(graph, caller));
        let allowed = call.selector().is_some_and(|s| module.is_allowed_call(call.target, s));

        if delegate && allowed {
            Ok(())
        } else {
            debug!(
                account = ?self.address,
                ?caller,
                target = ?call.target,
                delegate,
                allowed,
                "Call rejected"
            );
            Err(ContractError::NotAuthorizedCall { caller, target: call.target })
        }
    }

    /// Validates the signature of the user operation and authorizes its calls.
    ///
    /// Malformed signatures and call data are errors; a well-formed signature by a key that is
    /// not allowed to make the calls yields a failed signature in the validation data.
    pub fn validate_user_op(
        &self,
        uo: &UserOperation,
        module: Option<&AccessControl>,
        graph: Option<&IdentityGraph>,
    ) -> Result<AccountValidation, ContractError> {
        let signer = signature::recover(uo.hash.0, &uo.signature)?;

        let calls = if uo.call_data.is_empty() {
            vec![]
        } else {
            AccountCall::decode(&uo.call_data)?.into_calls()?
        };

        let rejection = if calls.is_empty() {
            let known = signer == self.owner ||
                module.is_some_and(|m| m.controller() == signer) ||
                (module.is_some() && self.is_session_key(graph, signer));
            (!known).then_some(ContractError::NotAuthorized { caller: signer })
        } else {
            calls.iter().find_map(|call| {
                self.authorize_call(CallOrigin::EntryPoint, signer, module, graph, call).err()
            })
        };

        let validation_data =
            if rejection.is_some() { ValidationData::sig_failed() } else { ValidationData::ok() };

        Ok(AccountValidation { signer, validation_data, calls, rejection })
    }

    fn is_session_key(&self, graph: Option<&IdentityGraph>, key: Address) -> bool {
        graph.is_some_and(|g| g.root() == self.owner && g.is_bound(&Identity::ethereum(key)))
    }
}
