//! Delegated account abstraction (ERC-4337)-related constants

/// Entry point (dispatcher)
pub mod entry_point {
    use ethers::types::H160;

    /// Address of the canonical entry point deployment
    pub const ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Same address as raw bytes
    pub const ADDRESS_BYTES: H160 = H160([
        0x5f, 0xf1, 0x37, 0xd4, 0xb0, 0xfd, 0xcd, 0x49, 0xdc, 0xa3, 0x0c, 0x7c, 0xf5, 0x7e, 0x57,
        0x8a, 0x02, 0x6d, 0x27, 0x89,
    ]);
    /// Version of the entry point interface
    pub const VERSION: &str = "0.6.0";
    /// Chain id of a local development network
    pub const DEV_CHAIN_ID: u64 = 1337;
}

/// User operation client defaults
pub mod user_operation {
    pub const DEFAULT_VERIFICATION_GAS_LIMIT: u64 = 200_000;
    pub const DEFAULT_PRE_VERIFICATION_GAS: u64 = 21_000;
    /// 1 gwei
    pub const DEFAULT_MAX_PRIORITY_FEE_PER_GAS: u64 = 1_000_000_000;
}

/// Identities
pub mod identity {
    /// Platform name used for bindings of Ethereum keys (session keys)
    pub const ETHEREUM_PLATFORM: &str = "Ethereum";
}

/// Account
pub mod account {
    /// Human-readable signature of the single call entry
    pub const EXECUTE: &str = "execute(address,uint256,bytes)";
    /// Human-readable signature of the batched call entry
    pub const EXECUTE_BATCH: &str = "executeBatch(address[],bytes[])";
    /// Human-readable signature of the factory deployment call
    pub const CREATE_ACCOUNT: &str = "createAccount(address,address,uint256)";
}

/// Validation
pub mod validation {
    /// `validUntil` value meaning "no expiry" (max uint48)
    pub const VALID_UNTIL_MAX: u64 = 0xffff_ffff_ffff;
    /// Aggregator value signalling a failed signature check
    pub const SIG_VALIDATION_FAILED: u8 = 1;
    /// Multiplier applied to the verification gas limit when a paymaster is used
    pub const PAYMASTER_VERIFICATION_GAS_MUL: u64 = 3;
}

/// Gas schedule defaults of the in-memory ledger
pub mod gas {
    /// Public key recovery of a personal-message signature
    pub const SIGNATURE_RECOVERY: u64 = 3_000;
    /// Nonce read and update
    pub const NONCE_UPDATE: u64 = 5_000;
    /// One access control or identity graph storage read
    pub const STORAGE_LOOKUP: u64 = 2_100;
    /// Deposit debit for the prefund
    pub const PREFUND_TRANSFER: u64 = 9_000;
    /// Account deployment through the factory
    pub const ACCOUNT_CREATION: u64 = 100_000;
    /// Paymaster signature validation
    pub const PAYMASTER_VALIDATION: u64 = 10_000;
    /// Account `execute` frame
    pub const EXECUTE_OVERHEAD: u64 = 9_000;
    /// Non-zero value transfer
    pub const VALUE_TRANSFER: u64 = 9_000;
    /// Bounds of the dummy signature priced for an unsigned operation
    pub const MIN_DUMMY_SIGNATURE_SIZE: u64 = 65;
    pub const MAX_DUMMY_SIGNATURE_SIZE: u64 = 1_024;
}
