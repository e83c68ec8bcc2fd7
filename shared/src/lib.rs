//! Plain data shared by the containment plugin and its harness.
//!
//! Nothing here talks to a host: vector math, tunable configuration and the
//! serializable snapshot types.

pub mod config;
pub mod protocol;
pub mod vec3;
