//! Event dispatch tasks.
//!
//! One task per channel awaits the next event and hands it to the owner's
//! handler. Handlers run on the dispatch task, never in the callback that
//! posted the event, so they may take locks and notify waiters.

use std::io;
use std::thread::JoinHandle;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::drivers::task_pin::{Core, spawn_on_core};

/// Dispatch runs next to the network stack.
const DISPATCH_CORE: Core = Core::Pro;
const DISPATCH_PRIORITY: u8 = 6;
const DISPATCH_STACK_KB: usize = 4;

/// Spawn a task that feeds every event on `channel` to `handler`, forever.
///
/// `name` must be NUL-terminated.
pub fn spawn_dispatch<E, const N: usize>(
    name: &'static str,
    channel: &'static Channel<CriticalSectionRawMutex, E, N>,
    mut handler: impl FnMut(E) + Send + 'static,
) -> io::Result<JoinHandle<()>>
where
    E: Send + 'static,
{
    spawn_on_core(
        DISPATCH_CORE,
        DISPATCH_PRIORITY,
        DISPATCH_STACK_KB,
        name,
        move || {
            futures_lite::future::block_on(async move {
                loop {
                    let event = channel.receive().await;
                    handler(event);
                }
            });
        },
    )
}

/// Feed every event currently queued on `channel` to `handler` without
/// waiting. Returns how many were handled.
pub fn drain<E, const N: usize>(
    channel: &Channel<CriticalSectionRawMutex, E, N>,
    mut handler: impl FnMut(E),
) -> usize {
    let mut handled = 0;
    while let Ok(event) = channel.try_receive() {
        handler(event);
        handled += 1;
    }
    handled
}
