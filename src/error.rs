//! Errors raised by the Cloudflare client.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single Cloudflare API call.
#[derive(Debug, Error)]
pub enum CloudflareError {
    /// No API token was resolved but a live call was attempted.
    #[error("Missing Cloudflare API token. Set CF_API_TOKEN or cf_token.txt")]
    MissingToken,

    /// Upstream answered with a non-2xx status.
    #[error("HTTP Error: {} - {reason}", .status.as_u16())]
    Transport { status: StatusCode, reason: String },

    /// Upstream answered 2xx but reported `success: false`.
    #[error("Cloudflare API Error: {0}")]
    Api(String),

    /// No configured account id and the user lookup did not yield one.
    #[error("Account ID is required for Workers and Pages APIs. Set CF_ACCOUNT_ID")]
    MissingAccountId,

    /// Connection, timeout, or body decoding failure.
    #[error("Cloudflare request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CloudflareError>;
