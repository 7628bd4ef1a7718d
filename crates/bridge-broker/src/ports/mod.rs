//! Ports connecting the broker to the outside world.

pub mod outbound;
