use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Used for Qdrant point ids (which must be integers or UUIDs) derived from catalog
/// record ids, and for seeding the stub embedder.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Point id for a catalog record id.
#[inline]
pub fn point_id_for(record_id: &str) -> u64 {
    hash_to_u64(record_id.as_bytes())
}

/// Fresh 24-hex-digit catalog id for a record created through the API.
pub fn new_record_id(name: &str, developer: &str) -> String {
    static SEQUENCE: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let mut hasher = blake3::Hasher::new();
    hasher.update(name.as_bytes());
    hasher.update(&[0]);
    hasher.update(developer.as_bytes());
    hasher.update(&nanos.to_le_bytes());
    hasher.update(&SEQUENCE.fetch_add(1, Ordering::Relaxed).to_le_bytes());

    let mut id = hasher.finalize().to_hex().to_string();
    id.truncate(24);
    id
}
