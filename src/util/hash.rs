//! Hashing utilities for structural fingerprints.
//!
//! The resolver and code generator memoize on a structural hash of their
//! input; the fingerprint builder here is the single place that hash is
//! assembled.

use sha2::{Digest, Sha256};

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of a string.
pub fn sha256_str(s: &str) -> String {
    sha256_bytes(s.as_bytes())
}

/// A hasher for building structural fingerprints from multiple components.
///
/// Components are length-delimited so that `["ab", "c"]` and `["a", "bc"]`
/// hash differently.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    /// Create a new fingerprint builder.
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component to the fingerprint.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.update_len(s.len());
        self.hasher.update(s.as_bytes());
        self
    }

    /// Add multiple strings to the fingerprint.
    pub fn update_strs<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) -> &mut Self {
        for s in items {
            self.update_str(s);
        }
        self
    }

    /// Add an optional string component.
    pub fn update_opt(&mut self, opt: Option<&str>) -> &mut Self {
        match opt {
            Some(s) => {
                self.hasher.update(b"\x01");
                self.update_str(s);
            }
            None => {
                self.hasher.update(b"\x00");
            }
        }
        self
    }

    /// Add a boolean component.
    pub fn update_bool(&mut self, b: bool) -> &mut Self {
        self.hasher.update([b as u8]);
        self
    }

    /// Add a list-length component, delimiting variable-size sections.
    pub fn update_len(&mut self, len: usize) -> &mut Self {
        self.hasher.update((len as u64).to_le_bytes());
        self
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }

    /// Finalize and return a short fingerprint (first 16 chars).
    pub fn finish_short(self) -> String {
        self.finish()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_str() {
        let hash = sha256_str("hello");
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let fp1 = {
            let mut fp = Fingerprint::new();
            fp.update_str("hello").update_str("world");
            fp.finish()
        };

        let fp2 = {
            let mut fp = Fingerprint::new();
            fp.update_str("hello").update_str("world");
            fp.finish()
        };

        let fp3 = {
            let mut fp = Fingerprint::new();
            fp.update_str("hello").update_str("different");
            fp.finish()
        };

        assert_eq!(fp1, fp2);
        assert_ne!(fp1, fp3);
    }

    #[test]
    fn test_fingerprint_length_delimited() {
        let fp1 = {
            let mut fp = Fingerprint::new();
            fp.update_strs(["ab", "c"]);
            fp.finish()
        };

        let fp2 = {
            let mut fp = Fingerprint::new();
            fp.update_strs(["a", "bc"]);
            fp.finish()
        };

        assert_ne!(fp1, fp2);
    }

    #[test]
    fn test_fingerprint_opt_distinguishes_none() {
        let fp1 = {
            let mut fp = Fingerprint::new();
            fp.update_opt(None);
            fp.finish()
        };

        let fp2 = {
            let mut fp = Fingerprint::new();
            fp.update_opt(Some(""));
            fp.finish()
        };

        assert_ne!(fp1, fp2);
    }
}
