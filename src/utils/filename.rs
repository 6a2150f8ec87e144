// src/utils/filename.rs

//! File names derived from page URLs.

use crate::error::{AppError, Result};

/// Longest file name allowed on common Linux filesystems.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Extension of cached selections.
pub const CACHE_EXTENSION: &str = ".htm";

/// Characters that cannot appear in a file name, plus `%` so the encoding
/// stays reversible.
fn is_hostile(c: char) -> bool {
    matches!(c, '/' | '\0' | '%')
}

/// Percent-encode file name hostile characters.
///
/// Fails instead of truncating when the result is longer than
/// [`MAX_FILE_NAME_LEN`] bytes.
pub fn encode(unsafe_name: &str) -> Result<String> {
    let mut clean = String::with_capacity(unsafe_name.len());
    for c in unsafe_name.chars() {
        if is_hostile(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                clean.push_str(&format!("%{byte:02X}"));
            }
        } else {
            clean.push(c);
        }
    }
    check_len(&clean)?;
    Ok(clean)
}

/// File name of the cached selection for a URL.
pub fn cache_file_name(url: &str) -> Result<String> {
    let name = format!("{}{}", encode(url)?, CACHE_EXTENSION);
    check_len(&name)?;
    Ok(name)
}

fn check_len(name: &str) -> Result<()> {
    if name.len() > MAX_FILE_NAME_LEN {
        return Err(AppError::FileName {
            len: name.len(),
            max: MAX_FILE_NAME_LEN,
        });
    }
    Ok(())
}
