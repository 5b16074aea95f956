pub mod annotations;
pub mod engine;
pub mod error;
pub mod thesaurus;
pub mod util;

pub use crate::error::ConfigError;
pub use crate::thesaurus::Thesaurus;
