//! Wi-Fi station-mode adapter.
//!
//! Implements [`NetworkStack`] for the link state machine and forwards
//! the three driver notifications it cares about into a link event
//! channel:
//!
//! | ESP-IDF event                 | [`LinkEvent`]                  |
//! |-------------------------------|--------------------------------|
//! | `WIFI_EVENT_STA_START`        | `Started`                      |
//! | `WIFI_EVENT_STA_DISCONNECTED` | `Disconnected`                 |
//! | `IP_EVENT_STA_GOT_IP`         | `AddressAcquired(ip)`          |
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspWifi` driver plus raw event-loop
//!   handlers.
//! - **all other targets**: a simulated station that acquires an address
//!   on every association request.

#[cfg(not(target_os = "espidf"))]
use crate::app::ports::NetworkStack;
use crate::error::ConnectivityError;
#[cfg(not(target_os = "espidf"))]
use crate::net::channels::LinkEventChannel;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

/// Empty means an open network; otherwise WPA2 needs 8..=64 bytes.
pub fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF station
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod esp {
    use core::ffi::c_void;
    use core::net::Ipv4Addr;
    use core::ptr;

    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::*;
    use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{validate_password, validate_ssid};
    use crate::app::ports::NetworkStack;
    use crate::error::ConnectivityError;
    use crate::net::channels::{LinkEventChannel, post};
    use crate::net::connectivity::LinkEvent;

    pub struct WifiStation {
        wifi: EspWifi<'static>,
    }

    impl WifiStation {
        /// Create the driver in STA mode. Does not start it.
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: Option<EspDefaultNvsPartition>,
            ssid: &str,
            password: &str,
        ) -> Result<Self, ConnectivityError> {
            validate_ssid(ssid)?;
            validate_password(password)?;

            let mut wifi = EspWifi::new(modem, sysloop, nvs)
                .map_err(|e| ConnectivityError::Driver(e.code()))?;

            let auth_method = if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let config = Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
                password: password
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidPassword)?,
                auth_method,
                ..Default::default()
            });
            wifi.set_configuration(&config)
                .map_err(|e| ConnectivityError::Driver(e.code()))?;

            info!("Link: station configured for '{}'", ssid);
            Ok(Self { wifi })
        }

        /// Start the driver. `WIFI_EVENT_STA_START` follows asynchronously.
        pub fn start(&mut self) -> Result<(), ConnectivityError> {
            self.wifi
                .start()
                .map_err(|e| ConnectivityError::Driver(e.code()))
        }
    }

    impl NetworkStack for WifiStation {
        fn initiate_association(&mut self) -> Result<(), ConnectivityError> {
            self.wifi
                .connect()
                .map_err(|e| ConnectivityError::Association(e.code()))
        }
    }

    /// Keeps the raw Wi-Fi/IP handlers registered while alive.
    pub struct LinkEventBridge {
        wifi_instance: esp_event_handler_instance_t,
        ip_instance: esp_event_handler_instance_t,
    }

    impl LinkEventBridge {
        pub fn register(events: &'static LinkEventChannel) -> Result<Self, ConnectivityError> {
            let arg = ptr::from_ref(events).cast_mut().cast::<c_void>();
            let mut wifi_instance: esp_event_handler_instance_t = ptr::null_mut();
            let mut ip_instance: esp_event_handler_instance_t = ptr::null_mut();

            // SAFETY: `events` is 'static, so the handler argument outlives
            // the registration. Both handlers only call try_send.
            unsafe {
                let ret = esp_event_handler_instance_register(
                    WIFI_EVENT,
                    ESP_EVENT_ANY_ID,
                    Some(on_wifi_event),
                    arg,
                    &mut wifi_instance,
                );
                if ret != ESP_OK as i32 {
                    return Err(ConnectivityError::Driver(ret));
                }
                let ret = esp_event_handler_instance_register(
                    IP_EVENT,
                    ip_event_t_IP_EVENT_STA_GOT_IP as i32,
                    Some(on_ip_event),
                    arg,
                    &mut ip_instance,
                );
                if ret != ESP_OK as i32 {
                    esp_event_handler_instance_unregister(WIFI_EVENT, ESP_EVENT_ANY_ID, wifi_instance);
                    return Err(ConnectivityError::Driver(ret));
                }
            }

            Ok(Self {
                wifi_instance,
                ip_instance,
            })
        }
    }

    impl Drop for LinkEventBridge {
        fn drop(&mut self) {
            // SAFETY: both instances came from a successful register().
            unsafe {
                esp_event_handler_instance_unregister(WIFI_EVENT, ESP_EVENT_ANY_ID, self.wifi_instance);
                esp_event_handler_instance_unregister(
                    IP_EVENT,
                    ip_event_t_IP_EVENT_STA_GOT_IP as i32,
                    self.ip_instance,
                );
            }
        }
    }

    unsafe extern "C" fn on_wifi_event(
        arg: *mut c_void,
        _base: esp_event_base_t,
        id: i32,
        _data: *mut c_void,
    ) {
        // SAFETY: `arg` is the &'static channel passed to register().
        let events = unsafe { &*arg.cast::<LinkEventChannel>() };
        match id as u32 {
            wifi_event_t_WIFI_EVENT_STA_START => {
                post(events, LinkEvent::Started);
            }
            wifi_event_t_WIFI_EVENT_STA_DISCONNECTED => {
                post(events, LinkEvent::Disconnected);
            }
            _ => {}
        }
    }

    unsafe extern "C" fn on_ip_event(
        arg: *mut c_void,
        _base: esp_event_base_t,
        _id: i32,
        data: *mut c_void,
    ) {
        // SAFETY: `arg` is the &'static channel passed to register().
        let events = unsafe { &*arg.cast::<LinkEventChannel>() };
        if data.is_null() {
            warn!("Link: GOT_IP without payload");
            return;
        }
        // SAFETY: IP_EVENT_STA_GOT_IP carries an ip_event_got_ip_t.
        let got_ip = unsafe { &*data.cast::<ip_event_got_ip_t>() };
        let ip = Ipv4Addr::from(got_ip.ip_info.ip.addr.to_le_bytes());
        post(events, LinkEvent::AddressAcquired(ip));
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{LinkEventBridge, WifiStation};

// ───────────────────────────────────────────────────────────────
// Simulated station
// ───────────────────────────────────────────────────────────────

/// Host stand-in: `start` reports `Started`; each association request
/// either acquires an address or, while `drop_next` is non-zero,
/// reports a disconnect.
#[cfg(not(target_os = "espidf"))]
pub struct WifiStation {
    events: &'static LinkEventChannel,
    associations: u32,
    drop_next: u32,
}

#[cfg(not(target_os = "espidf"))]
impl WifiStation {
    pub fn new(
        ssid: &str,
        password: &str,
        events: &'static LinkEventChannel,
    ) -> Result<Self, ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        log::info!("Link(sim): station configured for '{}'", ssid);
        Ok(Self {
            events,
            associations: 0,
            drop_next: 0,
        })
    }

    /// Make the next `n` association attempts end in a disconnect.
    pub fn fail_next(&mut self, n: u32) {
        self.drop_next = n;
    }

    pub fn associations(&self) -> u32 {
        self.associations
    }

    pub fn start(&mut self) -> Result<(), ConnectivityError> {
        crate::net::channels::post(self.events, crate::net::connectivity::LinkEvent::Started);
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl NetworkStack for WifiStation {
    fn initiate_association(&mut self) -> Result<(), ConnectivityError> {
        use crate::net::channels::post;
        use crate::net::connectivity::LinkEvent;

        self.associations += 1;
        let event = if self.drop_next > 0 {
            self.drop_next -= 1;
            LinkEvent::Disconnected
        } else {
            LinkEvent::AddressAcquired(core::net::Ipv4Addr::new(10, 0, 0, 2))
        };
        post(self.events, event);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
