//! Fuzz target: `connectivity::step` over arbitrary event sequences.
//!
//! First byte picks the retry budget; each following byte is one event.
//!
//! Invariants checked:
//! - No panics under any sequence
//! - The retry counter never exceeds the budget
//! - An address always resets the counter (unless already Failed)
//! - Failed is absorbing
//!
//! cargo fuzz run fuzz_link_events

#![no_main]

use core::net::Ipv4Addr;

use libfuzzer_sys::fuzz_target;
use smartpark::net::connectivity::{LinkEvent, LinkState, LinkStatus, step};

fuzz_target!(|data: &[u8]| {
    let Some((&max, events)) = data.split_first() else {
        return;
    };
    let max = max % 16;

    let mut status = LinkStatus::default();
    for &b in events {
        let event = match b % 3 {
            0 => LinkEvent::Started,
            1 => LinkEvent::Disconnected,
            _ => LinkEvent::AddressAcquired(Ipv4Addr::new(10, 0, 0, b)),
        };
        let (next, action) = step(status, event, max);

        assert!(next.retries <= max, "retry counter over budget");
        if status.state == LinkState::Failed {
            assert_eq!(next, status, "Failed must be absorbing");
            assert!(action.is_none());
        } else if matches!(event, LinkEvent::AddressAcquired(_)) {
            assert_eq!(next.retries, 0);
            assert_eq!(next.state, LinkState::Connected);
        }
        status = next;
    }
});
