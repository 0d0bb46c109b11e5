//! Shared infrastructure for cloud providers.

pub mod azure;
