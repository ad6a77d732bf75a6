//! Thin wrapper around the OS keyring for credential storage.
//!
//! The only secret this application stores is the CalDAV password; config
//! and everything else live in plain TOML.

const SERVICE: &str = "timeblock";

/// Keyring key under which the CalDAV password is stored.
pub const CALDAV_PASSWORD_KEY: &str = "caldav_password";

pub fn get(key: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    match entry.get_password() {
        Ok(pw) => Ok(Some(pw)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

pub fn delete(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let entry = keyring::Entry::new(SERVICE, key)?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
