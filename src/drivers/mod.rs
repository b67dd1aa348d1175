//! Low-level drivers: one-shot GPIO setup and task placement.

pub mod hw_init;
pub mod task_pin;
