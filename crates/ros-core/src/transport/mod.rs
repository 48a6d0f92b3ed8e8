//! Transport implementations shipped with the core library
//!
//! Network transports live in their own crates (`ros-transport-rest`).

pub mod memory;

pub use memory::{MemoryTransport, MemoryTransportFactory};
