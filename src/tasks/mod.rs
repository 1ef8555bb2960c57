//! Background Tasks Module
//!
//! Contains background tasks that run alongside request handling.
//!
//! # Tasks
//! - TTL Sweeper: Expires idle cache entries at a configured interval

mod sweeper;

pub use sweeper::{spawn_sweeper, SweepConfig, SweeperHandle};
