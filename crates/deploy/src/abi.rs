//! Minimal ABI encoding for the handful of factory calls the workflow makes.

use alloy_core::primitives::{Address, Bytes, keccak256};

/// `feeToSetter()`
pub const FEE_TO_SETTER: &str = "feeToSetter()";
/// `feeTo()`
pub const FEE_TO: &str = "feeTo()";
/// `setFeeTo(address)`
pub const SET_FEE_TO: &str = "setFeeTo(address)";

/// First four bytes of the keccak-256 of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Left-pad an address to a 32-byte ABI word.
pub fn encode_address(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

/// Calldata for a function whose parameters are all addresses.
pub fn encode_call(signature: &str, args: &[Address]) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&encode_address(*arg));
    }
    data.into()
}

/// Creation code followed by ABI-encoded constructor arguments.
pub fn encode_constructor(bytecode: &[u8], args: &[Address]) -> Bytes {
    let mut data = Vec::with_capacity(bytecode.len() + 32 * args.len());
    data.extend_from_slice(bytecode);
    for arg in args {
        data.extend_from_slice(&encode_address(*arg));
    }
    data.into()
}

/// Decode a single `address` return value.
pub fn decode_address(data: &[u8]) -> Result<Address, String> {
    if data.len() != 32 {
        return Err(format!(
            "expected a 32-byte address word, got {} bytes",
            data.len()
        ));
    }

    if data[..12].iter().any(|b| *b != 0) {
        return Err(format!(
            "return word is not a valid address: 0x{}",
            hex::encode(data)
        ));
    }

    Ok(Address::from_slice(&data[12..]))
}
