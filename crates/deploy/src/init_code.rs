//! Init code hash of the pair contract.
//!
//! Pair addresses are derived off-chain with CREATE2 from this digest, so it must be
//! the plain keccak-256 of the creation bytecode, byte for byte, with nothing appended.

use alloy_core::primitives::{B256, keccak256};

use crate::error::{DeployError, Result};

/// keccak-256 of the pair creation bytecode.
pub fn init_code_hash(bytecode: &[u8]) -> Result<B256> {
    if bytecode.is_empty() {
        return Err(DeployError::Input(
            "Cannot hash empty pair bytecode".to_string(),
        ));
    }

    Ok(keccak256(bytecode))
}

/// Lowercase `0x`-prefixed hex, the form consumed by address-derivation code.
pub fn format_hash(hash: &B256) -> String {
    format!("0x{}", hex::encode(hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_hash_determinism() {
        let bytecode = hex::decode("6080604052348015600f57600080fd5b50").unwrap();

        let hash1 = init_code_hash(&bytecode).unwrap();
        let hash2 = init_code_hash(&bytecode.clone()).unwrap();

        assert_eq!(hash1, hash2, "Hash should be deterministic");
        assert_eq!(format_hash(&hash1).len(), 66, "0x + 64 hex characters");
    }

    #[test]
    fn test_known_digest() {
        // keccak256 of the empty string is well known; a single zero byte too.
        assert_eq!(
            format_hash(&keccak256(b"")),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            format_hash(&init_code_hash(&[0x00]).unwrap()),
            "0xbc36789e7a1e281436464229828f817d6612f7b477d66591ff96a9e064bcc98a"
        );
    }

    #[test]
    fn test_hash_changes_with_single_byte() {
        let mut rng = rand::rng();
        let mut bytecode = vec![0u8; 512];
        rng.fill_bytes(&mut bytecode);

        let mut flipped = bytecode.clone();
        flipped[511] ^= 0x01;

        assert_ne!(
            init_code_hash(&bytecode).unwrap(),
            init_code_hash(&flipped).unwrap(),
            "Hash should change when any byte changes"
        );
    }

    #[test]
    fn test_hash_changes_with_appended_args() {
        let bytecode = vec![0x60, 0x80, 0x60, 0x40];
        let mut with_args = bytecode.clone();
        with_args.extend_from_slice(&[0u8; 32]);

        assert_ne!(
            init_code_hash(&bytecode).unwrap(),
            init_code_hash(&with_args).unwrap()
        );
    }

    #[test]
    fn test_empty_bytecode_is_input_error() {
        let err = init_code_hash(&[]).unwrap_err();
        assert!(matches!(err, DeployError::Input(_)));
    }
}
