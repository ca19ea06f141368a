pub mod json_file;
pub mod placeholder;
pub mod traits;

pub use json_file::JsonFileCatalog;
pub use placeholder::PlaceholderCatalog;
pub use traits::ListingSource;
