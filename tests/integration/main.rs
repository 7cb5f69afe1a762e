//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the loopback session, the simulated radar and mock outputs.
//! All tests run on the host (x86_64) with no real hardware required.

mod config_flow_tests;
mod mock_hw;
mod pattern_tests;
mod runtime_tests;
