//! Identity graph: auxiliary identities bound to one root key.
//!
//! Every binding is authorized by a signature of the root over the canonical identity message,
//! so anyone may submit it. A deleted identity stays in the graph as a tombstone and can not be
//! created again (the identity message carries no nonce).

use crate::error::ContractError;
use ethers::{
    types::{Address, Bytes},
    utils::raw_public_key_to_address,
};
use std::collections::HashMap;
use tracing::debug;
use warden_primitives::{
    signature::{self, Authorized},
    Action, Event, Identity,
};

/// Binding metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub action: Action,
    pub signature: Bytes,
    pub root: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityGraph {
    address: Address,
    root: Address,
    bindings: HashMap<Identity, Binding>,
}

impl IdentityGraph {
    pub fn new(address: Address, root: Address) -> Self {
        Self { address, root, bindings: HashMap::new() }
    }

    /// Graph rooted at an uncompressed secp256k1 public key (64 bytes, or 65 with the `0x04`
    /// prefix)
    pub fn from_public_key(address: Address, public_key: &[u8]) -> Result<Self, ContractError> {
        let key = match public_key.len() {
            64 => public_key,
            65 if public_key[0] == 0x04 => &public_key[1..],
            len => {
                return Err(ContractError::InvalidSignature {
                    inner: format!("invalid root public key length {len}"),
                })
            }
        };
        Ok(Self::new(address, raw_public_key_to_address(key)))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn root(&self) -> Address {
        self.root
    }

    /// Creates or deletes the binding of `identity`
    ///
    /// # Arguments
    /// * `identity` - The identity to bind
    /// * `action` - Create or delete
    /// * `signature` - Signature of the root over [Identity::digest]
    ///
    /// # Returns
    /// * `Event` - The binding event to record
    pub fn set_identity(
        &mut self,
        identity: Identity,
        action: Action,
        signature: &[u8],
    ) -> Result<Event, ContractError> {
        let auth = self.verify(&identity, action, signature)?;

        if action == Action::Create &&
            matches!(self.bindings.get(&identity), Some(b) if b.action == Action::Delete)
        {
            return Err(ContractError::BindingRevoked {
                platform: identity.platform,
                identity_value: identity.identity_value,
            });
        }

        debug!(
            graph = ?self.address,
            platform = %identity.platform,
            value = %identity.identity_value,
            %action,
            "Setting identity"
        );

        self.bindings.insert(
            identity.clone(),
            Binding { action, signature: signature.to_vec().into(), root: auth.signer() },
        );

        Ok(match action {
            Action::Create => Event::BindingCreated { graph: self.address, identity },
            Action::Delete => Event::BindingRemoved { graph: self.address, identity },
        })
    }

    /// True iff a non-deleted create entry exists for the identity
    pub fn is_bound(&self, identity: &Identity) -> bool {
        matches!(self.bindings.get(identity), Some(b) if b.action == Action::Create)
    }

    pub fn binding(&self, identity: &Identity) -> Option<&Binding> {
        self.bindings.get(identity)
    }

    fn verify(
        &self,
        identity: &Identity,
        action: Action,
        signature: &[u8],
    ) -> Result<Authorized, ContractError> {
        Ok(signature::authorize(identity.digest(action), signature, self.root)?)
    }
}
