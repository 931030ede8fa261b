//! Azure Arc challenge handling.
//!
//! Arc's endpoint answers an unauthenticated probe with 401 and a
//! `WWW-Authenticate` header pointing at a key file on the local disk. The
//! file's contents become the `Authorization: Basic` secret for the real
//! token request. Because the agent rotates the file, the secret is never
//! cached; every token acquisition runs the full two-leg exchange.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CredentialError, Result};

/// Largest key file the agent is expected to write.
pub(crate) const MAX_KEY_FILE_SIZE: u64 = 4096;

/// Longest file name accepted in a challenge path.
const MAX_KEY_FILE_NAME_LEN: usize = 255;

/// Extracts the key file path from the probe's `WWW-Authenticate` header.
///
/// The header value must contain exactly one `=`; everything after it is the
/// path. Anything else is a malformed challenge.
pub(crate) fn parse_challenge(header: Option<&str>) -> Result<PathBuf> {
    let value = header.ok_or_else(|| {
        CredentialError::Challenge(
            "response is missing the WWW-Authenticate header".to_owned(),
        )
    })?;
    if value.bytes().filter(|&b| b == b'=').count() != 1 {
        return Err(CredentialError::Challenge(format!(
            "WWW-Authenticate header is malformed: '{value}'"
        )));
    }
    let path = &value[value.find('=').map(|i| i + 1).unwrap_or(value.len())..];
    if path.is_empty() {
        return Err(CredentialError::Challenge(
            "WWW-Authenticate header names an empty key file path".to_owned(),
        ));
    }
    Ok(PathBuf::from(path))
}

/// The directory the Arc agent writes key files to on this platform.
#[cfg(windows)]
pub(crate) fn default_key_directory(program_data: &str) -> PathBuf {
    Path::new(program_data)
        .join("AzureConnectedMachineAgent")
        .join("Tokens")
}

#[cfg(not(windows))]
pub(crate) fn default_key_directory(_program_data: &str) -> PathBuf {
    PathBuf::from("/var/opt/azcmagent/tokens")
}

/// Reads a challenge key file after validating it against the expected
/// directory.
///
/// The path must sit directly inside `expected_dir`, carry a `.key`
/// extension, stay within the size limit, and hold valid UTF-8. Any
/// violation means the challenge cannot be trusted.
pub(crate) fn read_key_file(path: &Path, expected_dir: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            CredentialError::Challenge(format!(
                "key file path '{}' has no valid file name",
                path.display()
            ))
        })?;
    if name.len() > MAX_KEY_FILE_NAME_LEN {
        return Err(CredentialError::Challenge(format!(
            "key file name exceeds {MAX_KEY_FILE_NAME_LEN} characters"
        )));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("key") {
        return Err(CredentialError::Challenge(format!(
            "key file '{}' does not have the .key extension",
            path.display()
        )));
    }
    if path.parent() != Some(expected_dir) {
        return Err(CredentialError::Challenge(format!(
            "key file '{}' is outside the expected directory '{}'",
            path.display(),
            expected_dir.display()
        )));
    }

    let metadata = fs::metadata(path).map_err(|e| {
        CredentialError::Challenge(format!(
            "unable to stat key file '{}': {e}",
            path.display()
        ))
    })?;
    if metadata.len() > MAX_KEY_FILE_SIZE {
        return Err(CredentialError::Challenge(format!(
            "key file '{}' is {} bytes, expected at most {MAX_KEY_FILE_SIZE}",
            path.display(),
            metadata.len()
        )));
    }

    let bytes = fs::read(path).map_err(|e| {
        CredentialError::Challenge(format!(
            "unable to read key file '{}': {e}",
            path.display()
        ))
    })?;
    String::from_utf8(bytes).map_err(|_| {
        CredentialError::Challenge(format!(
            "key file '{}' does not contain valid UTF-8",
            path.display()
        ))
    })
}
