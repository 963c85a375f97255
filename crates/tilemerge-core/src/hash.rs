//! Stable hashing helpers for plans, manifests, and join output.

use blake3::Hasher;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::tile::LogicalTile;

/// 32-byte blake3 digest; serializes as 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 || !s.bytes().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let mut out = [0u8; 32];
        for (i, b) in out.iter_mut().enumerate() {
            *b = u8::from_str_radix(&s[2 * i..2 * i + 2], 16).ok()?;
        }
        Some(Hash256(out))
    }

    pub fn to_hex(&self) -> String {
        // blake3 hex(32b) is 64 hex chars
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s)
            .ok_or_else(|| D::Error::custom(format!("expected 64 hex characters, got {s:?}")))
    }
}

pub fn hash_bytes(bytes: &[u8]) -> Hash256 {
    let mut h = Hasher::new();
    h.update(bytes);
    let out = h.finalize();
    Hash256(out.into())
}

/// Hash any serde-serializable value deterministically (via JSON).
pub fn hash_serde<T: Serialize>(v: &T) -> Result<Hash256, crate::error::Error> {
    let bytes = serde_json::to_vec(v).map_err(|e| crate::error::Error::Hash(e.to_string()))?;
    Ok(hash_bytes(&bytes))
}

/// Digest a sequence of tiles: shape, raw position lists, and resolved values.
///
/// Two runs over the same inputs must produce the same digest.
pub fn hash_tiles<'a>(tiles: impl IntoIterator<Item = &'a LogicalTile>) -> Hash256 {
    let mut h = Hasher::new();
    for tile in tiles {
        h.update(&(tile.column_count() as u64).to_le_bytes());
        h.update(&(tile.row_count() as u64).to_le_bytes());
        for info in tile.schema() {
            h.update(&(info.position_list_idx as u64).to_le_bytes());
        }
        for list in tile.position_lists() {
            for pos in list {
                h.update(&(*pos as u64).to_le_bytes());
            }
        }
        for r in 0..tile.row_count() {
            for c in 0..tile.column_count() {
                if let Some(v) = tile.value(c, r) {
                    v.hash_into(&mut h);
                }
            }
        }
    }
    Hash256(h.finalize().into())
}
