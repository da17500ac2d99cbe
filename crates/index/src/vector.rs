//! Vector post-processing required by some stores.

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Keep the first `dims` components of `vector`.
///
/// This is a lossy compatibility shim for an index built with fewer
/// dimensions than the embedding model emits. It is not a projection and
/// degrades retrieval quality. A vector shorter than `dims` is rejected
/// because the result must be exactly `dims` long.
pub fn truncate(mut vector: Vec<f32>, dims: usize) -> Result<Vec<f32>> {
    if vector.len() < dims {
        anyhow::bail!(
            "Embedding has {} dimensions, fewer than the {} the index expects",
            vector.len(),
            dims
        );
    }
    vector.truncate(dims);
    Ok(vector)
}

/// Pack a vector as consecutive little-endian IEEE-754 f32 values.
pub fn to_le_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Binary vector in the `{"$binary": "<base64>"}` form document stores accept.
pub fn to_binary_json(vector: &[f32]) -> serde_json::Value {
    serde_json::json!({ "$binary": STANDARD.encode(to_le_bytes(vector)) })
}
