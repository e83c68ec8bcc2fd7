//! LetMeOut: confines player bodies to the charging zone of an extraction
//! event.
//!
//! The host game is reached only through the traits in [`host`]. The
//! [`world::SimWorld`] reference host and [`game_loop`] drive the plugin
//! without an engine, for tests and the harness binary.

pub mod artifact;
pub mod boundary;
pub mod config;
pub mod containment;
pub mod error;
pub mod game_loop;
pub mod gate;
pub mod host;
pub mod icons;
pub mod icosphere;
pub mod lifecycle;
pub mod plugin;
pub mod signals;
pub mod world;

pub use error::{LetMeOutError, Result};
pub use plugin::LetMeOut;
