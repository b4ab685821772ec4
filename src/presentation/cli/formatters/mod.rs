pub mod event_fmt;
