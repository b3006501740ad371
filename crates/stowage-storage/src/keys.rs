//! Shared key and URL construction.
//!
//! Object keys are `{base_path}/{filename}`; public URLs are `{host}/{base_path}/{filename}`.
//! Segments are joined with exactly one `/` and empty segments are skipped.

/// Join URL or key segments with single slashes.
///
/// The first segment keeps its leading part (so `https://` survives); every other
/// segment is trimmed of slashes on both sides.
pub fn join_segments(segments: &[&str]) -> String {
    let mut joined = String::new();
    for (index, segment) in segments.iter().enumerate() {
        let trimmed = if index == 0 && joined.is_empty() {
            segment.trim_end_matches('/')
        } else {
            segment.trim_matches('/')
        };
        if trimmed.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(trimmed);
    }
    joined
}

/// Object key for `filename` under `base_path`.
pub fn object_key(base_path: &str, filename: &str) -> String {
    join_segments(&["", base_path, filename])
}

/// Public URL for `filename` under `base_path` on `host`.
pub fn public_url(host: &str, base_path: &str, filename: &str) -> String {
    join_segments(&[host, base_path, filename])
}

/// Content type for an object, derived from its key's extension.
pub fn content_type_for_key(key: &str) -> &'static str {
    let extension = stowage_core::filename::extension_of(key)
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
