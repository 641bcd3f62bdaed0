//! getforget - A volatile associative memory that forgets
//!
//! Text fragments are remembered under the keywords extracted from them.
//! Each entry carries an importance score that decays with age and grows
//! with reuse, and a background process probabilistically evicts entries
//! whose importance has faded.

pub mod config;
pub mod error;
pub mod memory;
pub mod server;
pub mod service;
pub mod testing;
pub mod tokenizer;

pub use error::ForgetError;
