pub mod analogy;
pub mod embedding;
pub mod error;
pub mod ops;

pub use analogy::*;
pub use embedding::*;
pub use error::*;
pub use ops::*;
