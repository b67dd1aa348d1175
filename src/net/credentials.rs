//! TLS client credentials for the broker session.
//!
//! All three blobs are PEM, embedded in the firmware image and
//! NUL-terminated because mbedTLS parses them as C strings.

use core::fmt;

use log::info;

use crate::error::SessionError;

const PEM_BEGIN: &[u8] = b"-----BEGIN ";
const PEM_END: &[u8] = b"-----END ";

/// Root CA, device certificate and device private key.
#[derive(Clone, Copy)]
pub struct Credentials {
    pub root_ca: &'static [u8],
    pub client_cert: &'static [u8],
    pub client_key: &'static [u8],
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.debug_struct("Credentials")
            .field("root_ca", &self.root_ca.len())
            .field("client_cert", &self.client_cert.len())
            .field("client_key", &self.client_key.len())
            .finish()
    }
}

impl Credentials {
    /// Check each blob is non-empty, NUL-terminated and PEM-armoured.
    pub fn validate(&self) -> Result<(), SessionError> {
        check_pem("root_ca", self.root_ca, b"CERTIFICATE")?;
        check_pem("client_cert", self.client_cert, b"CERTIFICATE")?;
        check_pem("client_key", self.client_key, b"PRIVATE KEY")?;
        info!(
            "MQTT: credentials ok (ca={}B, cert={}B, key={}B)",
            self.root_ca.len(),
            self.client_cert.len(),
            self.client_key.len()
        );
        Ok(())
    }
}

fn check_pem(field: &'static str, blob: &[u8], label: &[u8]) -> Result<(), SessionError> {
    let invalid = SessionError::InvalidCredentials(field);
    let Some((&0, body)) = blob.split_last() else {
        return Err(invalid);
    };
    if body.contains(&0) {
        return Err(invalid);
    }
    let begin = find(body, PEM_BEGIN).ok_or(invalid)?;
    let end = find(body, PEM_END).ok_or(invalid)?;
    if end < begin || find(&body[begin..], label).is_none() {
        return Err(invalid);
    }
    Ok(())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
