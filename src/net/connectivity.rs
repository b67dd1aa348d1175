//! Network link lifecycle.
//!
//! ```text
//!                Started            AddressAcquired
//! Disconnected ──────────▶ Connecting ─────────────▶ Connected
//!                           │   ▲ Disconnected          │
//!                           │   └─ (retries < max) ◀────┘
//!                           │ Disconnected (retries == max)
//!                           ▼
//!                         Failed   (absorbing)
//! ```
//!
//! The transition function [`step`] is pure. [`ConnectivityManager`] owns
//! the network stack and applies it to events from the dispatch task;
//! bootstrap blocks on [`LinkHandle::connect_and_wait`] until the link
//! settles in `Connected` or `Failed`.

use core::net::Ipv4Addr;
use core::time::Duration;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::app::ports::NetworkStack;
use crate::error::ConnectivityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl LinkState {
    /// `Connected` or `Failed`: what bootstrap waits for.
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Connected | Self::Failed)
    }
}

/// What the network stack reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Started,
    Disconnected,
    AddressAcquired(Ipv4Addr),
}

/// Link state and the retry counter, always updated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkStatus {
    pub state: LinkState,
    /// Disconnects since the last acquired address.
    pub retries: u8,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Associate,
}

/// Apply one event.
///
/// A disconnect is retried while `retries < max_retries`; the one after
/// that moves to `Failed`, which ignores every later event.
pub fn step(status: LinkStatus, event: LinkEvent, max_retries: u8) -> (LinkStatus, Option<LinkAction>) {
    if status.state == LinkState::Failed {
        return (status, None);
    }
    match event {
        LinkEvent::Started => (
            LinkStatus {
                state: LinkState::Connecting,
                ..status
            },
            Some(LinkAction::Associate),
        ),
        LinkEvent::Disconnected if status.retries < max_retries => (
            LinkStatus {
                state: LinkState::Connecting,
                retries: status.retries + 1,
            },
            Some(LinkAction::Associate),
        ),
        LinkEvent::Disconnected => (
            LinkStatus {
                state: LinkState::Failed,
                ..status
            },
            None,
        ),
        LinkEvent::AddressAcquired(_) => (
            LinkStatus {
                state: LinkState::Connected,
                retries: 0,
            },
            None,
        ),
    }
}

#[derive(Default)]
struct LinkShared {
    status: Mutex<LinkStatus>,
    settled: Condvar,
}

impl LinkShared {
    fn lock(&self) -> MutexGuard<'_, LinkStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns the network stack and the link state.
pub struct ConnectivityManager<N> {
    net: N,
    max_retries: u8,
    shared: Arc<LinkShared>,
}

impl<N: NetworkStack> ConnectivityManager<N> {
    pub fn new(net: N, max_retries: u8) -> Self {
        Self {
            net,
            max_retries,
            shared: Arc::default(),
        }
    }

    /// Cloneable read side for waiters.
    pub fn handle(&self) -> LinkHandle {
        LinkHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn status(&self) -> LinkStatus {
        *self.shared.lock()
    }

    pub fn network(&self) -> &N {
        &self.net
    }

    /// Apply `event`. Returns the new state when the link has just settled
    /// (entered `Connected` or `Failed`); waiters are woken at that point.
    pub fn handle_event(&mut self, event: LinkEvent) -> Option<LinkState> {
        let (prev, next, action) = {
            let mut status = self.shared.lock();
            let prev = *status;
            let (next, action) = step(prev, event, self.max_retries);
            *status = next;
            (prev, next, action)
        };

        match event {
            LinkEvent::AddressAcquired(ip) if next.state == LinkState::Connected => {
                info!("Link: got IP {}", ip);
            }
            LinkEvent::Disconnected if next.state == LinkState::Connecting => {
                info!("Link: disconnected, retry {}/{}", next.retries, self.max_retries);
            }
            _ => {}
        }

        let settled = next.state != prev.state && next.state.is_settled();
        if settled {
            if next.state == LinkState::Failed {
                warn!("Link: {}", ConnectivityError::RetriesExhausted);
            }
            self.shared.settled.notify_all();
        }

        if action == Some(LinkAction::Associate) {
            if let Err(e) = self.net.initiate_association() {
                // A failed request counts as a disconnect so the budget still bounds it.
                warn!("Link: {}", e);
                return self.handle_event(LinkEvent::Disconnected).or(settled.then_some(next.state));
            }
        }

        settled.then_some(next.state)
    }
}

/// Waits on the link state owned by a [`ConnectivityManager`].
#[derive(Clone)]
pub struct LinkHandle {
    shared: Arc<LinkShared>,
}

impl LinkHandle {
    pub fn state(&self) -> LinkState {
        self.shared.lock().state
    }

    /// Block until the link is `Connected` or `Failed`. Never returns
    /// `Connecting`. `None` waits indefinitely.
    pub fn connect_and_wait(&self, timeout: Option<Duration>) -> Result<LinkState, ConnectivityError> {
        let guard = self.shared.lock();
        match timeout {
            None => {
                let guard = self
                    .shared
                    .settled
                    .wait_while(guard, |s| !s.state.is_settled())
                    .unwrap_or_else(PoisonError::into_inner);
                Ok(guard.state)
            }
            Some(limit) => {
                let (guard, _) = self
                    .shared
                    .settled
                    .wait_timeout_while(guard, limit, |s| !s.state.is_settled())
                    .unwrap_or_else(PoisonError::into_inner);
                if guard.state.is_settled() {
                    Ok(guard.state)
                } else {
                    Err(ConnectivityError::WaitTimedOut)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const MAX: u8 = 5;
    const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 40);

    #[derive(Default)]
    struct CountingStack {
        calls: u32,
        fail: bool,
    }

    impl NetworkStack for CountingStack {
        fn initiate_association(&mut self) -> Result<(), ConnectivityError> {
            self.calls += 1;
            if self.fail {
                Err(ConnectivityError::Association(-1))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn start_then_address_connects() {
        let mut m = ConnectivityManager::new(CountingStack::default(), MAX);
        assert_eq!(m.handle_event(LinkEvent::Started), None);
        assert_eq!(m.status().state, LinkState::Connecting);
        assert_eq!(m.network().calls, 1);
        assert_eq!(m.handle_event(LinkEvent::AddressAcquired(IP)), Some(LinkState::Connected));
    }

    #[test]
    fn retry_budget_then_failed_once() {
        let mut m = ConnectivityManager::new(CountingStack::default(), MAX);
        m.handle_event(LinkEvent::Started);
        for n in 1..=MAX {
            assert_eq!(m.handle_event(LinkEvent::Disconnected), None);
            assert_eq!(m.status(), LinkStatus { state: LinkState::Connecting, retries: n });
        }
        assert_eq!(m.handle_event(LinkEvent::Disconnected), Some(LinkState::Failed));
        assert_eq!(m.network().calls, 1 + u32::from(MAX));

        // Absorbing: no new attempts, no second signal.
        assert_eq!(m.handle_event(LinkEvent::Disconnected), None);
        assert_eq!(m.handle_event(LinkEvent::Started), None);
        assert_eq!(m.handle_event(LinkEvent::AddressAcquired(IP)), None);
        assert_eq!(m.status().state, LinkState::Failed);
        assert_eq!(m.network().calls, 1 + u32::from(MAX));
    }

    #[test]
    fn address_resets_retries() {
        let s = LinkStatus { state: LinkState::Connecting, retries: 3 };
        let (next, action) = step(s, LinkEvent::AddressAcquired(IP), MAX);
        assert_eq!(next, LinkStatus { state: LinkState::Connected, retries: 0 });
        assert_eq!(action, None);
    }

    #[test]
    fn link_loss_while_connected_retries() {
        let s = LinkStatus { state: LinkState::Connected, retries: 0 };
        let (next, action) = step(s, LinkEvent::Disconnected, MAX);
        assert_eq!(next, LinkStatus { state: LinkState::Connecting, retries: 1 });
        assert_eq!(action, Some(LinkAction::Associate));
    }

    #[test]
    fn failing_association_spends_the_budget() {
        let stack = CountingStack { calls: 0, fail: true };
        let mut m = ConnectivityManager::new(stack, MAX);
        assert_eq!(m.handle_event(LinkEvent::Started), Some(LinkState::Failed));
        assert_eq!(m.network().calls, 1 + u32::from(MAX));
    }

    #[test]
    fn wait_wakes_on_connect() {
        let mut m = ConnectivityManager::new(CountingStack::default(), MAX);
        let link = m.handle();
        let waiter = thread::spawn(move || link.connect_and_wait(None));

        m.handle_event(LinkEvent::Started);
        thread::sleep(Duration::from_millis(20));
        m.handle_event(LinkEvent::AddressAcquired(IP));
        assert_eq!(waiter.join().unwrap(), Ok(LinkState::Connected));
    }

    #[test]
    fn wait_times_out_while_connecting() {
        let mut m = ConnectivityManager::new(CountingStack::default(), MAX);
        m.handle_event(LinkEvent::Started);
        assert_eq!(
            m.handle().connect_and_wait(Some(Duration::from_millis(20))),
            Err(ConnectivityError::WaitTimedOut)
        );
    }

    #[test]
    fn wait_returns_immediately_once_failed() {
        let mut m = ConnectivityManager::new(CountingStack::default(), 0);
        m.handle_event(LinkEvent::Started);
        m.handle_event(LinkEvent::Disconnected);
        assert_eq!(
            m.handle().connect_and_wait(Some(Duration::ZERO)),
            Ok(LinkState::Failed)
        );
    }
}
