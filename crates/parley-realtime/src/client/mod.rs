//! Client-side helpers for consumers of the event stream.

pub mod ready_gate;

pub use ready_gate::{GatedEvent, ReadyGate};
