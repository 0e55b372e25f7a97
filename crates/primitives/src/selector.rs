//! Human-readable function signatures (`name(type,...)`) and the 4-byte selectors they resolve
//! to.
//!
//! Allow-lists are configured with the human-readable form but keyed internally by
//! [Selector], so a call is matched against its first four bytes without any string handling.

use ethers::{
    abi::{param_type::Reader, short_signature, ParamType},
    types::Bytes,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Malformed function signature
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("function signature {0:?} must have the form name(type,...)")]
    InvalidShape(String),
    #[error("invalid function name {0:?}")]
    InvalidName(String),
    #[error("invalid parameter type {ty:?}: {inner}")]
    InvalidType { ty: String, inner: String },
}

/// First four bytes of the keccak256 hash of a canonical function signature
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// Selector of the call data, `None` when the call data is shorter than four bytes
    pub fn from_call_data(call_data: &[u8]) -> Option<Self> {
        let bytes: [u8; 4] = call_data.get(..4)?.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Prepends the selector to already ABI-encoded arguments
    pub fn encode_call(&self, args: &[u8]) -> Bytes {
        [self.0.as_slice(), args].concat().into()
    }
}

impl From<[u8; 4]> for Selector {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0.iter().map(|b| format!("{b:02x}")).collect::<String>())
    }
}

/// Parsed function signature
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub inputs: Vec<ParamType>,
    pub selector: Selector,
}

impl FunctionSignature {
    /// Parses `name(type,...)`.
    ///
    /// Whitespace around names and types is ignored, so `"transfer(address, uint256)"` and
    /// `"transfer(address,uint256)"` resolve to the same selector.
    pub fn parse(signature: &str) -> Result<Self, SelectorError> {
        let signature = signature.trim();
        let (name, rest) = signature
            .split_once('(')
            .ok_or_else(|| SelectorError::InvalidShape(signature.to_string()))?;
        let params = rest
            .strip_suffix(')')
            .ok_or_else(|| SelectorError::InvalidShape(signature.to_string()))?;

        let name = name.trim();
        if !is_identifier(name) {
            return Err(SelectorError::InvalidName(name.to_string()));
        }

        let inputs = split_params(params)
            .ok_or_else(|| SelectorError::InvalidShape(signature.to_string()))?
            .into_iter()
            .map(|ty| {
                Reader::read(ty).map_err(|err| SelectorError::InvalidType {
                    ty: ty.to_string(),
                    inner: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let selector = Selector(short_signature(name, &inputs));
        Ok(Self { name: name.to_string(), inputs, selector })
    }

    /// Canonical form used for hashing
    pub fn canonical(&self) -> String {
        format!(
            "{}({})",
            self.name,
            self.inputs.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        )
    }
}

impl FromStr for FunctionSignature {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Splits a parameter list on top-level commas. Returns `None` on unbalanced parentheses or
/// empty entries.
fn split_params(params: &str) -> Option<Vec<&str>> {
    if params.trim().is_empty() {
        return Some(vec![]);
    }

    let mut out = vec![];
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in params.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                out.push(params[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    out.push(params[start..].trim());

    if out.iter().any(|p| p.is_empty()) {
        None
    } else {
        Some(out)
    }
}
