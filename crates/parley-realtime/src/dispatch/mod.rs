//! Domain event emission.

pub mod fanout;

pub use fanout::EventFanout;
