//! Property listing search: filtering, proximity ordering and AI-assisted
//! location checks for uploads.

pub mod config;
pub mod display;
pub mod filters;
pub mod geo;
pub mod geolocation;
pub mod listings;
pub mod models;
pub mod validation;

pub use display::{compute_display_list, DisplayList};
pub use filters::{matches, FilterSpec};
pub use geolocation::{LocationStatus, ViewerLocation};
pub use models::{Coordinates, Feature, Listing};
pub use validation::{LocationValidator, ValidationInput, ValidationResult};
