pub mod engine;
pub mod spec;

pub use engine::matches;
pub use spec::{AccessSelector, FilterSpec, KindSelector};
