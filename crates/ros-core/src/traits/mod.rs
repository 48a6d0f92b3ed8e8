//! Core traits for the reconciliation client
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Transport`]: Execute one command against a device

pub mod transport;

pub use transport::{
    MOVE_DESTINATION, MOVE_NUMBERS, Operation, RET_KEY, Request, Transport, TransportFactory,
};
