//! File naming: random names for renamed uploads and sanitization of
//! client-declared names.

use std::path::Path;

/// Alphabet for generated names. Exactly 64 symbols, so masking a random
/// byte to 6 bits picks each one with equal probability.
const RANDOM_STRING_SOURCE: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_+";

/// Length of the random stem used when renaming uploads.
pub const GENERATED_NAME_LEN: usize = 25;

/// Return `n` characters drawn from the OS CSPRNG.
///
/// Stateless; `n == 0` yields an empty string.
pub fn random_string(n: usize) -> Result<String, getrandom::Error> {
    let mut bytes = vec![0u8; n];
    getrandom::getrandom(&mut bytes)?;

    Ok(bytes
        .into_iter()
        .map(|b| RANDOM_STRING_SOURCE[(b & 0x3F) as usize] as char)
        .collect())
}

/// Final path component of a client-declared file name.
///
/// Both `/` and `\` count as separators regardless of platform, since the
/// name comes from an arbitrary client.
pub fn base_name(declared: &str) -> &str {
    declared
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(declared)
        .trim()
}

/// Extension of `name` without the dot, case preserved. Extensions holding
/// control characters are dropped.
pub fn extension(name: &str) -> Option<&str> {
    Path::new(base_name(name))
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && !ext.chars().any(char::is_control))
}

/// Make a client name safe to join onto the destination directory.
///
/// Drops directory components, leading dots and control characters. Returns
/// `None` when nothing usable remains.
pub fn sanitize_file_name(declared: &str) -> Option<String> {
    let cleaned: String = base_name(declared)
        .trim_start_matches('.')
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// `<random>.<ext>` for renamed uploads; no trailing dot when the original
/// has no extension.
pub fn generated_file_name(original: &str) -> Result<String, getrandom::Error> {
    let stem = random_string(GENERATED_NAME_LEN)?;
    Ok(match extension(original) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    })
}
