pub mod evaluator;
pub mod lifecycle;
pub mod window_store;
