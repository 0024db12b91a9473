//! API token resolution.
//!
//! The token comes from `CF_API_TOKEN` or, failing that, from a plain-text
//! file in the working directory. It is resolved once at startup and never
//! re-read.

use std::env;
use std::fs;
use std::io;
use std::path::Path;

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "CF_API_TOKEN";

/// Fallback token file, relative to the working directory.
pub const TOKEN_FILE: &str = "cf_token.txt";

/// Resolve the API token from the process environment and `cf_token.txt`.
pub fn resolve() -> Option<String> {
    resolve_from(env::var(TOKEN_ENV).ok(), Path::new(TOKEN_FILE))
}

/// Resolve the token from an explicit env value and token file path.
///
/// Empty values count as absent. A token file that cannot be read is logged
/// and treated as "no token".
pub fn resolve_from(env_value: Option<String>, token_file: &Path) -> Option<String> {
    if let Some(token) = non_empty(env_value) {
        return Some(token);
    }

    match fs::read_to_string(token_file) {
        Ok(contents) => non_empty(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!("Error reading {}: {}", token_file.display(), e);
            None
        }
    }
}

/// Whether a request should be answered from local fixtures.
pub fn should_use_mock(token: Option<&str>, explicit_flag: bool) -> bool {
    explicit_flag || token.is_none()
}

fn non_empty(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}
