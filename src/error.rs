//! Unified error types for the SmartParking node.
//!
//! Each subsystem owns a small `Copy` error enum; the top-level [`Error`]
//! wraps all of them so bootstrap code can report any failure uniformly.
//! Recoverable errors (sensor timeouts, publish failures) never leave the
//! component that detects them; only initialisation failures reach `main`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An ultrasonic measurement did not complete.
    Sensor(SensorError),
    /// The Wi-Fi link could not be brought up.
    Link(ConnectivityError),
    /// The MQTT session could not be created.
    Session(SessionError),
    /// A status publish was not accepted.
    Publish(PublishError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Publish(e) => write!(f, "publish: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Why a distance measurement produced no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Echo never went high within the timeout after the trigger pulse.
    EchoStartTimeout,
    /// Echo went high but did not fall back within the timeout.
    EchoEndTimeout,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EchoStartTimeout => write!(f, "timed out waiting for echo start"),
            Self::EchoEndTimeout => write!(f, "timed out waiting for echo end"),
        }
    }
}

impl core::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Connectivity errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// SSID empty, longer than 32 bytes, or not printable ASCII.
    InvalidSsid,
    /// Password neither empty (open network) nor 8..=64 bytes.
    InvalidPassword,
    /// The Wi-Fi driver rejected a configuration or start call (esp_err_t).
    Driver(i32),
    /// An association request could not be issued (esp_err_t).
    Association(i32),
    /// `connect_and_wait` gave up before the link settled.
    WaitTimedOut,
    /// The retry budget was spent without acquiring an address.
    RetriesExhausted,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::Driver(rc) => write!(f, "WiFi driver error (rc={})", rc),
            Self::Association(rc) => write!(f, "association request failed (rc={})", rc),
            Self::WaitTimedOut => write!(f, "timed out waiting for the link to settle"),
            Self::RetriesExhausted => write!(f, "retry budget exhausted"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// A TLS credential is missing, not NUL-terminated, or lacks PEM armour.
    InvalidCredentials(&'static str),
    /// The MQTT client could not be constructed (esp_err_t).
    InitFailed(i32),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials(which) => write!(f, "invalid credential: {which}"),
            Self::InitFailed(rc) => write!(f, "MQTT client init failed (rc={})", rc),
        }
    }
}

impl core::error::Error for SessionError {}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Publish errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The session has not reached (or has lost) the Connected state.
    ClientUnavailable,
    /// The client refused or failed the publish (esp_err_t).
    Rejected(i32),
    /// The status message could not be serialised.
    Encoding,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientUnavailable => write!(f, "MQTT client unavailable"),
            Self::Rejected(rc) => write!(f, "publish rejected (rc={})", rc),
            Self::Encoding => write!(f, "payload encoding failed"),
        }
    }
}

impl core::error::Error for PublishError {}

impl From<PublishError> for Error {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}
