//! Session cookie storage in the system keyring.
//!
//! Uses the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::debug;

use crate::error::Result;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "mailsweep";

/// Credential type identifier for session cookies.
const SESSION_CREDENTIAL: &str = "session";

/// Generates the keyring entry key for a service host.
fn credential_key(host: &str) -> String {
    format!("{SERVICE_NAME}_{SESSION_CREDENTIAL}_{host}")
}

/// Stores the session cookie for `host`.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn store_session_cookie(host: &str, cookie: &str) -> Result<()> {
    let entry = Entry::new(SERVICE_NAME, &credential_key(host))?;
    entry.set_password(cookie)?;
    debug!("Stored session cookie for {host}");
    Ok(())
}

/// Retrieves the session cookie for `host`, if one is stored.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn get_session_cookie(host: &str) -> Result<Option<String>> {
    let entry = Entry::new(SERVICE_NAME, &credential_key(host))?;
    match entry.get_password() {
        Ok(cookie) => Ok(Some(cookie)),
        Err(keyring::Error::NoEntry) => {
            debug!("No session cookie stored for {host}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Removes the session cookie for `host`. A missing entry is not an error.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn delete_session_cookie(host: &str) -> Result<()> {
    let entry = Entry::new(SERVICE_NAME, &credential_key(host))?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => {
            debug!("Removed session cookie for {host}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
