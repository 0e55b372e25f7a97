//! Signature verifier using the personal-message (EIP-191) convention.
//!
//! A 32-byte digest is prefixed with `"\x19Ethereum Signed Message:\n32"` and hashed again
//! before it is signed. Recovery of a well-formed signature always yields *some* address, so
//! authority is only granted through [authorize], which compares the recovered signer with the
//! expected one and hands out an [Authorized] token.

use ethers::{
    signers::LocalWallet,
    types::{Address, Bytes, RecoveryMessage, Signature, H256},
    utils::hash_message,
};
use thiserror::Error;

/// Signature errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature bytes are malformed (wrong length, invalid `v`, `r` or `s`)
    #[error("invalid signature: {inner}")]
    InvalidSignature {
        /// The inner error message
        inner: String,
    },
    /// Signature is well formed but was not produced by the expected signer
    #[error("signer {recovered:?} is not the expected signer {expected:?}")]
    UnauthorizedSigner { expected: Address, recovered: Address },
}

/// Proof that `signer` signed `digest`. Only [authorize] creates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorized {
    signer: Address,
    digest: H256,
}

impl Authorized {
    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn digest(&self) -> H256 {
        self.digest
    }
}

/// Personal-message hash of a 32-byte digest
pub fn hash_personal(digest: H256) -> H256 {
    hash_message(digest.as_bytes())
}

/// Signs the digest with the personal-message convention and returns the 65-byte `r ‖ s ‖ v`
/// signature.
pub fn sign(digest: H256, wallet: &LocalWallet) -> Result<Bytes, SignatureError> {
    let sig = wallet
        .sign_hash(hash_personal(digest))
        .map_err(|err| SignatureError::InvalidSignature { inner: err.to_string() })?;
    Ok(sig.to_vec().into())
}

/// Recovers the signer of the digest.
///
/// A well-formed signature by the wrong key recovers to an unrelated address instead of
/// failing; compare the result or use [authorize].
pub fn recover(digest: H256, signature: &[u8]) -> Result<Address, SignatureError> {
    let sig = Signature::try_from(signature)
        .map_err(|err| SignatureError::InvalidSignature { inner: err.to_string() })?;
    sig.recover(RecoveryMessage::Data(digest.as_bytes().to_vec()))
        .map_err(|err| SignatureError::InvalidSignature { inner: err.to_string() })
}

/// Recovers the signer of the digest and checks it against `expected`
pub fn authorize(
    digest: H256,
    signature: &[u8],
    expected: Address,
) -> Result<Authorized, SignatureError> {
    let recovered = recover(digest, signature)?;
    if recovered != expected {
        return Err(SignatureError::UnauthorizedSigner { expected, recovered });
    }
    Ok(Authorized { signer: recovered, digest })
}
