use actix_web::http::header::HeaderMap;
use anyhow::Context;

mod error;
pub use error::Error as AuthError;

/// Longest display name accepted on sign in, in characters.
pub const MAX_NAME_LEN: usize = 64;

/// Extracts the display name a peer signs in with.
///
/// Peers send it as the user part of HTTP Basic credentials; the password part
/// is ignored.
pub fn basic_authentication(headers: &HeaderMap) -> Result<String, AuthError> {
    // The header value, if present, must be a valid UTF8 string
    let header_value = headers
        .get("Authorization")
        .context("The 'Authorization' header was missing")
        .map_err(AuthError::InvalidCredentials)?
        .to_str()
        .context("The 'Authorization' header was not a valid UTF8 string.")
        .map_err(AuthError::InvalidCredentials)?;
    let base64encoded_segment = header_value
        .strip_prefix("Basic ")
        .context("The authorization scheme was not 'Basic'.")
        .map_err(AuthError::InvalidCredentials)?;
    let decoded_bytes = base64::decode_config(base64encoded_segment, base64::STANDARD)
        .context("Failed to base64-decode 'Basic' credentials.")
        .map_err(AuthError::InvalidCredentials)?;
    let decoded_credentials = String::from_utf8(decoded_bytes)
        .context("The decoded credential string is not valid UTF8.")
        .map_err(AuthError::InvalidCredentials)?;

    let name = decoded_credentials
        .split(':')
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() {
        return Err(AuthError::InvalidName("a name must be provided".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::InvalidName(format!(
            "names are limited to {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}
