//! A `Wallet` is a wrapper around an ethers wallet used by clients (avatars, agents and session
//! keys) to sign user operations and authorization messages
use crate::{
    signature::{self, SignatureError},
    UserOperationSigned,
};
use ethers::{
    prelude::{k256::ecdsa::SigningKey, rand},
    signers::{coins_bip39::English, MnemonicBuilder, Signer, WalletError},
    types::{Address, Bytes, H256},
};

/// Wrapper around ethers wallet
#[derive(Clone, Debug)]
pub struct Wallet {
    /// Signing key of the wallet
    pub signer: ethers::signers::Wallet<SigningKey>,
}

impl Wallet {
    /// Builds a `Wallet` from a randomly generated key
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self { signer: ethers::signers::Wallet::new(&mut rng) }
    }

    /// Create a new wallet from the given mnemonic phrase
    ///
    /// # Arguments
    /// * `phrase` - The mnemonic phrase
    /// * `index` - Index of the account in the `m/44'/60'/0'/0` derivation path
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_phrase(phrase: &str, index: u32) -> Result<Self, WalletError> {
        let signer = MnemonicBuilder::<English>::default().phrase(phrase).index(index)?.build()?;
        Ok(Self { signer })
    }

    /// Address of the wallet
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Uncompressed public key without the `0x04` prefix (64 bytes)
    pub fn public_key(&self) -> Bytes {
        let point = self.signer.signer().verifying_key().to_encoded_point(false);
        Bytes::from(point.as_bytes()[1..].to_vec())
    }

    /// Signs a 32-byte digest with the personal-message convention
    pub fn sign_digest(&self, digest: H256) -> Result<Bytes, SignatureError> {
        signature::sign(digest, &self.signer)
    }

    /// Signs the user operation
    ///
    /// # Arguments
    /// * `uo` - The [UserOperation](UserOperationSigned) to be signed
    /// * `ep` - The entry point address
    /// * `chain_id` - The chain id of the network the entry point runs on
    ///
    /// # Returns
    /// * `UserOperationSigned` - The signed user operation
    pub fn sign_uo(
        &self,
        uo: &UserOperationSigned,
        ep: &Address,
        chain_id: u64,
    ) -> Result<UserOperationSigned, SignatureError> {
        let h = uo.hash(ep, chain_id);
        let sig = self.sign_digest(h.0)?;
        Ok(UserOperationSigned { signature: sig, ..uo.clone() })
    }
}
