//! Transaction module - molecule encoding, entities and the signing builder

pub mod molecule;
mod builder;
mod types;

pub use builder::*;
pub use types::*;
