pub mod sink;
pub mod source;

pub use sink::{AlertSink, EmissionError};
pub use source::{FetchError, TelemetrySource};
