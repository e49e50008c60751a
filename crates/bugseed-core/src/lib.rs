pub mod config_manager;
pub mod error;
pub mod files;
pub mod metadata;
pub mod pattern;
pub mod record;
pub mod target;

pub use config_manager::*;
pub use error::*;
pub use files::*;
pub use metadata::*;
pub use pattern::*;
pub use record::*;
pub use target::*;
