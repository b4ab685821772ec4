pub mod alert;
pub mod condition;
pub mod reading;
pub mod window;

pub use alert::{AlertEvent, EventKind};
pub use condition::{Condition, ConditionKey, ConditionParseError};
pub use reading::{IngestionError, RawReading, Reading, SensorField, UnknownFieldError};
pub use window::Window;
