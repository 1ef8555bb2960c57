//! Request validation for the proxy API
//!
//! File names arrive as a path parameter and become object keys.

use crate::error::{ProxyError, Result};

/// Longest object key accepted, matching the S3 key limit in bytes.
pub const MAX_FILE_NAME_LENGTH: usize = 1024;

/// Normalizes a requested file name into an object key.
///
/// Drops empty and `.` segments and resolves `..` against the preceding
/// segment. Names that are empty after cleaning, climb above the root, or
/// exceed [`MAX_FILE_NAME_LENGTH`] are rejected.
pub fn clean_file_name(raw: &str) -> Result<String> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ProxyError::InvalidRequest(format!(
                        "File name escapes the bucket: {}",
                        raw
                    )));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(ProxyError::InvalidRequest("File name cannot be empty".to_string()));
    }

    let cleaned = segments.join("/");
    if cleaned.len() > MAX_FILE_NAME_LENGTH {
        return Err(ProxyError::InvalidRequest(format!(
            "File name exceeds maximum length of {} bytes",
            MAX_FILE_NAME_LENGTH
        )));
    }

    Ok(cleaned)
}
