//! Test Fixtures Module
//!
//! Programmatically generated audio for the relay tests.

// Not every test binary uses every fixture
#![allow(dead_code)]

pub mod audio_fixtures;

pub use audio_fixtures::*;
