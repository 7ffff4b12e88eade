// export.rs — JSON export and build provenance
//
// The JSON form is the serde serialization of the graph. Provenance pins a
// script run: SHA-256 of the source text, SHA-256 of the canonical compact
// graph JSON, and the crate version.

use sha2::{Digest, Sha256};

use crate::graph::Graph;

/// Pretty JSON for `--emit json`.
pub fn to_json(graph: &Graph) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(graph)
}

/// Compact JSON with no whitespace; the input to the graph fingerprint.
pub fn canonical_json(graph: &Graph) -> Result<String, serde_json::Error> {
    serde_json::to_string(graph)
}

/// Provenance metadata for reproducible runs.
///
/// `source_hash`: SHA-256 of the raw script text.
/// `graph_fingerprint`: SHA-256 of `canonical_json(graph)`.
/// `version`: crate version from `Cargo.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub source_hash: [u8; 32],
    pub graph_fingerprint: [u8; 32],
    pub version: &'static str,
}

impl Provenance {
    /// Hex string of the source hash (64 characters).
    pub fn source_hash_hex(&self) -> String {
        bytes_to_hex(&self.source_hash)
    }

    /// Hex string of the graph fingerprint (64 characters).
    pub fn graph_fingerprint_hex(&self) -> String {
        bytes_to_hex(&self.graph_fingerprint)
    }

    /// JSON object for `--emit build-info`.
    pub fn to_json(&self) -> String {
        let value = serde_json::json!({
            "source_hash": self.source_hash_hex(),
            "graph_fingerprint": self.graph_fingerprint_hex(),
            "version": self.version,
        });
        format!("{:#}\n", value)
    }
}

fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

fn bytes_to_hex(bytes: &[u8; 32]) -> String {
    let mut s = String::with_capacity(64);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(s, "{:02x}", b);
    }
    s
}

/// Compute provenance from the script source and the graph it built.
pub fn compute_provenance(source: &str, graph: &Graph) -> Result<Provenance, serde_json::Error> {
    Ok(Provenance {
        source_hash: sha256(source.as_bytes()),
        graph_fingerprint: sha256(canonical_json(graph)?.as_bytes()),
        version: env!("CARGO_PKG_VERSION"),
    })
}
