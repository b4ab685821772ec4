pub mod detectors;
pub mod entities;
pub mod ports;
pub mod value_objects;
