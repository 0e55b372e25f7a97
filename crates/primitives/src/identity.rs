//! Identities that can be bound to a root identity in an identity graph

use crate::constants::identity::ETHEREUM_PLATFORM;
use ethers::{
    abi::{encode, Token},
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Action of an identity binding
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Action {
    Create = 0,
    Delete = 1,
}

/// Auxiliary identity (session key, cross-platform account, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Platform the identity lives on, e.g. `Ethereum`
    pub platform: String,
    /// Value of the identity on the platform (lower-case hex address for Ethereum keys)
    pub identity_value: String,
    /// Optional chain the identity is scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_identity: Option<String>,
}

impl Identity {
    pub fn new(platform: impl Into<String>, identity_value: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            identity_value: identity_value.into(),
            chain_identity: None,
        }
    }

    /// Identity of an Ethereum key, which is how session keys are bound
    pub fn ethereum(address: Address) -> Self {
        Self::new(ETHEREUM_PLATFORM, format!("{address:#x}"))
    }

    /// Scopes the identity to one chain
    pub fn with_chain_identity(mut self, chain_identity: impl Into<String>) -> Self {
        self.chain_identity = Some(chain_identity.into());
        self
    }

    /// Canonical binding message.
    ///
    /// Without a chain it is `platform ‖ identityValue ‖ uint8(action)`, tightly packed. A
    /// chain-scoped identity is ABI encoded as `(string, string, string, uint8)` so the field
    /// boundaries are part of what the root signs.
    pub fn message(&self, action: Action) -> Bytes {
        match &self.chain_identity {
            None => {
                let mut msg =
                    Vec::with_capacity(self.platform.len() + self.identity_value.len() + 1);
                msg.extend_from_slice(self.platform.as_bytes());
                msg.extend_from_slice(self.identity_value.as_bytes());
                msg.push(action as u8);
                msg.into()
            }
            Some(chain_identity) => encode(&[
                Token::String(self.platform.clone()),
                Token::String(self.identity_value.clone()),
                Token::String(chain_identity.clone()),
                Token::Uint(U256::from(action as u8)),
            ])
            .into(),
        }
    }

    /// Digest the root key signs (personal-message convention) to authorize the binding
    pub fn digest(&self, action: Action) -> H256 {
        keccak256(self.message(action)).into()
    }
}
