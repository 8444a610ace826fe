//! # Cross-Module Test Suite
//!
//! End-to-end tests of the public library API and the simulator binary:
//! full processing cycles, chart output on real surfaces, and property tests
//! of the history buffer.

mod pipeline_tests;
mod ring_buffer_props;
mod sim_tests;
