use sha2::{Digest, Sha256};

/// Stable content hash of arbitrary bytes, hex-encoded.
///
/// Used to fingerprint retrieval inputs (hot-stack contents, query text) so
/// the cache layer can key on content rather than on caller-supplied ids.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Hash a sequence of string fragments as if they had been joined with a
/// `\n` separator, without allocating the joined string.
pub fn content_hash_parts<'a, I: IntoIterator<Item = &'a str>>(parts: I) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash(b"hello"), content_hash(b"hello"));
        assert_ne!(content_hash(b"hello"), content_hash(b"world"));
    }

    #[test]
    fn content_hash_parts_matches_joined_hash() {
        let joined = content_hash(b"a\nb\nc");
        let parts = content_hash_parts(["a", "b", "c"]);
        assert_eq!(joined, parts);
    }
}
