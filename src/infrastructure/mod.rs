pub mod mqtt;
pub mod sinks;
pub mod sources;
