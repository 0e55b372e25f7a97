//! Account factory with counterfactual (CREATE2) addresses

use crate::{account::Account, error::ContractError};
use ethers::{
    abi::{encode, AbiDecode, AbiEncode, Token},
    contract::EthCall,
    types::{Address, Bytes, U256},
    utils::{get_create2_address_from_hash, keccak256},
};

/// `createAccount(address,address,uint256)`
#[derive(Clone, Debug, Default, PartialEq, Eq, EthCall)]
#[ethcall(name = "createAccount", abi = "createAccount(address,address,uint256)")]
pub struct CreateAccountCall {
    pub owner: Address,
    pub identity_graph: Address,
    pub salt: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFactory {
    address: Address,
    entry_point: Address,
}

impl AccountFactory {
    pub fn new(address: Address, entry_point: Address) -> Self {
        Self { address, entry_point }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    /// Counterfactual address of the account
    pub fn get_address(&self, owner: Address, identity_graph: Address, salt: U256) -> Address {
        let init_code_hash = keccak256(encode(&[
            Token::Address(self.entry_point),
            Token::Address(owner),
            Token::Address(identity_graph),
        ]));
        get_create2_address_from_hash(self.address, salt.encode(), init_code_hash)
    }

    /// Builds the account at its counterfactual address
    pub fn create_account(&self, owner: Address, identity_graph: Address, salt: U256) -> Account {
        let graph = (!identity_graph.is_zero()).then_some(identity_graph);
        Account::new(self.get_address(owner, identity_graph, salt), owner, self.entry_point, graph)
    }

    /// `initCode` deploying the account through this factory
    pub fn init_code(&self, owner: Address, identity_graph: Address, salt: U256) -> Bytes {
        let call = CreateAccountCall { owner, identity_graph, salt };
        [self.address.as_bytes(), call.encode().as_slice()].concat().into()
    }

    /// Splits `initCode` into the factory address and the decoded deployment call
    pub fn decode_init_code(
        init_code: &[u8],
    ) -> Result<(Address, CreateAccountCall), ContractError> {
        if init_code.len() < 20 {
            return Err(ContractError::InvalidInitCode {
                inner: format!("init code of {} bytes is too short", init_code.len()),
            });
        }
        let factory = Address::from_slice(&init_code[..20]);
        let call = <CreateAccountCall as AbiDecode>::decode(&init_code[20..])
            .map_err(|err| ContractError::InvalidInitCode { inner: err.to_string() })?;
        Ok((factory, call))
    }
}
