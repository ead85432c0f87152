//! JobPulse CLI shell
//!
//! Screen catalog, boundary-contract providers, and terminal rendering on
//! top of the feed adapter. Exposed as a library for integration testing.

pub mod errors;
pub mod render;
pub mod screens;
pub mod session;
