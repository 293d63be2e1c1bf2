//! Content hash of a network topology.

use sha2::{Digest, Sha256};

/// Hash topology entries (one line per component and connection).
///
/// Entries are sorted first, so insertion order does not matter.
pub fn topology_fingerprint<I, S>(entries: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut lines: Vec<String> = entries
        .into_iter()
        .map(|e| e.as_ref().to_string())
        .collect();
    lines.sort();

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
