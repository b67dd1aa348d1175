//! Inter-task event channels.
//!
//! Network callbacks run on the ESP-IDF event loop and must not block, so
//! they only `try_send` into these bounded `embassy-sync` channels. A
//! dispatch task per channel drains them into the state owners.
//!
//! ```text
//! ┌──────────────┐ LinkEvent    ┌───────────────────────┐
//! │ Wi-Fi / IP   │────────────▶│ link dispatch         │──▶ ConnectivityManager
//! │ callbacks    │              └───────────────────────┘
//! ├──────────────┤ SessionEvent ┌───────────────────────┐
//! │ MQTT client  │────────────▶│ session dispatch      │──▶ TransportSession
//! └──────────────┘              └───────────────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::config::MAX_LINK_RETRIES;

use super::connectivity::LinkEvent;
use super::session::SessionEvent;

/// Channel depth for link events. Holds a whole bring-up even if the
/// dispatch task never ran: `Started`, every retried disconnect, the final
/// disconnect that fails the link, and the acquired address.
pub const LINK_DEPTH: usize = MAX_LINK_RETRIES as usize + 3;

/// Channel depth for session events.
const SESSION_DEPTH: usize = 8;

pub type LinkEventChannel = Channel<CriticalSectionRawMutex, LinkEvent, LINK_DEPTH>;
pub type SessionEventChannel = Channel<CriticalSectionRawMutex, SessionEvent, SESSION_DEPTH>;

/// Wi-Fi/IP callbacks → link dispatch.
pub static LINK_EVENTS: LinkEventChannel = Channel::new();

/// MQTT client callbacks → session dispatch.
pub static SESSION_EVENTS: SessionEventChannel = Channel::new();

/// Non-blocking post from callback context. Returns `false` if the event
/// was dropped because the channel is full.
pub fn post<E: core::fmt::Debug, const N: usize>(
    channel: &Channel<CriticalSectionRawMutex, E, N>,
    event: E,
) -> bool {
    match channel.try_send(event) {
        Ok(()) => true,
        Err(embassy_sync::channel::TrySendError::Full(dropped)) => {
            warn!("event channel full, dropping {:?}", dropped);
            false
        }
    }
}
