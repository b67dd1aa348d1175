//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against simulated adapters. All tests run on the host with no real
//! hardware required.

#![cfg(not(target_os = "espidf"))]

use critical_section as _;

mod bootstrap_flow_tests;
mod mock_hw;
mod publisher_tests;
