use serde::Serialize;
use sha2::{Digest, Sha256};

use super::CacheError;

/// Content-derived cache address: lowercase hex SHA-256 of the JSON
/// serialization of the key material. Doubles as the disk file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive<K: Serialize + ?Sized>(material: &K) -> Result<Self, CacheError> {
        let bytes = serde_json::to_vec(material)?;
        Ok(Self::from_bytes(&bytes))
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        CacheKey(format!("{:x}", digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Material<'a> {
        prompt: &'a str,
        temperature: f32,
    }

    #[test]
    fn identical_material_hashes_identically() {
        let a = CacheKey::derive(&Material { prompt: "p", temperature: 0.2 }).unwrap();
        let b = CacheKey::derive(&Material { prompt: "p", temperature: 0.2 }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn any_field_change_changes_key() {
        let a = CacheKey::derive(&Material { prompt: "p", temperature: 0.2 }).unwrap();
        let b = CacheKey::derive(&Material { prompt: "p", temperature: 0.3 }).unwrap();
        let c = CacheKey::derive(&Material { prompt: "q", temperature: 0.2 }).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn key_is_stable_hex_digest() {
        // SHA-256 of the JSON string "abc" (with quotes).
        let key = CacheKey::derive("abc").unwrap();
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(key, CacheKey::from_bytes(b"\"abc\""));
    }

    #[test]
    fn known_digest() {
        let key = CacheKey::from_bytes(b"abc");
        assert_eq!(
            key.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(key.short(), "ba7816bf8f01");
    }
}
