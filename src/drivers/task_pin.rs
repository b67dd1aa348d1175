//! Core-pinned thread spawning and scheduler suspension.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task pinned to a specific CPU core with explicit priority
//! and stack size. On non-ESP targets, falls back to plain thread spawn.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread, so the config→spawn pair must not be interleaved
//! with other thread creation on the same thread.

use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): protocol stacks (Wi-Fi, lwIP, MQTT) and every
    /// task this firmware spawns.
    Pro = 0,
}

/// Spawn a thread pinned to a specific core with explicit priority and stack.
///
/// The `name` parameter must be NUL-terminated (e.g. `"publisher\0"`).
/// On non-ESP targets, `core` and `priority` are ignored.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // SAFETY: the config struct outlives the call; `name` is 'static and
    // NUL-terminated.
    let ret = unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core as i32;
        cfg.prio = i32::from(priority);
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = name.as_ptr().cast();
        esp_idf_sys::esp_pthread_set_cfg(&cfg)
    };
    if ret != esp_idf_sys::ESP_OK as i32 {
        return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
}

/// Simulation fallback: ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        display_name,
        stack_kb
    );

    std::thread::Builder::new()
        .name(display_name.into())
        // Host threads need more headroom than the firmware budget.
        .stack_size((stack_kb * 1024).max(64 * 1024))
        .spawn(f)
}

// ── Scheduler suspension ──────────────────────────────────────

/// Suspends task switching on the current core until dropped.
///
/// Interrupts keep running. Do not block, allocate, or log while held.
#[must_use = "the scheduler resumes as soon as the guard is dropped"]
pub struct SchedulerLock {
    _not_send: core::marker::PhantomData<*const ()>,
}

impl SchedulerLock {
    #[cfg(target_os = "espidf")]
    pub fn acquire() -> Self {
        // SAFETY: paired with xTaskResumeAll in Drop on the same task.
        unsafe { esp_idf_sys::vTaskSuspendAll() };
        Self {
            _not_send: core::marker::PhantomData,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn acquire() -> Self {
        Self {
            _not_send: core::marker::PhantomData,
        }
    }
}

impl Drop for SchedulerLock {
    #[cfg(target_os = "espidf")]
    fn drop(&mut self) {
        // SAFETY: the guard was created by vTaskSuspendAll on this task.
        unsafe {
            esp_idf_sys::xTaskResumeAll();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn drop(&mut self) {}
}
