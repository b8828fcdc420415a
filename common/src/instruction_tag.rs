//! Deterministic 8-byte instruction/account tag derivation, so an off-chain
//! decoder can reproduce the tag bytes from a name alone, without reading
//! the program's source.
//!
//! Scheme: tag = first 8 bytes of `sha256(preimage)`, the same construction
//! Anchor uses for its instruction/account discriminators
//! (`sha256("global:<ix_name>")[..8]` / `sha256("account:<name>")[..8]`),
//! generalized here to a hand-rolled native program so no IDL needs to be
//! shared between `program`, `updater`, and `reader`.

use sha2::{Digest, Sha256};

pub fn tag(preimage: &str) -> [u8; 8] {
    let digest = Sha256::digest(preimage.as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[0..8]);
    out
}

pub fn instruction_tag(name: &str) -> [u8; 8] {
    tag(&format!("global:{name}"))
}

pub fn account_tag(name: &str) -> [u8; 8] {
    tag(&format!("account:{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable_and_distinct() {
        let a = instruction_tag("initialize");
        let b = instruction_tag("batch_set_prices");
        let c = instruction_tag("close_state");
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
        // deterministic: recomputing yields the same bytes.
        assert_eq!(a, instruction_tag("initialize"));
    }
}
