//! # Contracts
//!
//! Frozen interface contracts shared by the bridge crates.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Ownership Model
//! - Work parameters are owned by exactly one party at a time
//! - Audio bytes cross threads only through the ring buffer

mod bridge_config;
mod error;
mod event;
mod sink;
mod work;

pub use bridge_config::*;
pub use error::*;
pub use event::*;
pub use sink::*;
pub use work::*;
