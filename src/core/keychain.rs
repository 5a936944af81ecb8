//! Keychain storage for target passwords.
//!
//! Uses the system keychain (macOS Keychain, Linux Secret Service, Windows Credential Manager).

use crate::{Error, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "recette";

fn keyring_error(e: keyring::Error) -> Error {
    Error::keychain(e.to_string())
}

/// Key format: `<role>@<host>:<port>`
pub fn entry_key(role: &str, host: &str, port: u16) -> String {
    format!("{}@{}:{}", role, host, port)
}

/// Stores a password for a role on a server.
pub fn store(role: &str, host: &str, port: u16, password: &str) -> Result<()> {
    let entry = Entry::new(SERVICE_NAME, &entry_key(role, host, port)).map_err(keyring_error)?;
    entry.set_password(password).map_err(keyring_error)?;
    Ok(())
}

/// Retrieves a stored password. Returns `None` if the key doesn't exist.
pub fn get(role: &str, host: &str, port: u16) -> Result<Option<String>> {
    let entry = Entry::new(SERVICE_NAME, &entry_key(role, host, port)).map_err(keyring_error)?;

    match entry.get_password() {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(keyring_error(e)),
    }
}

/// Deletes a stored password. Returns whether an entry existed.
pub fn delete(role: &str, host: &str, port: u16) -> Result<bool> {
    let entry = Entry::new(SERVICE_NAME, &entry_key(role, host, port)).map_err(keyring_error)?;

    match entry.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(keyring_error(e)),
    }
}
