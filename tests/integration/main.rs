//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock drivers. All tests run on the host (x86_64) with no
//! real hardware required.

mod coordinator_tests;
mod mock_hw;
mod recorder_tests;
mod service_tests;
mod sim_bridge_tests;
