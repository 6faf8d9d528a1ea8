pub mod config;
pub mod designs;
pub mod error;
pub mod inference;
pub mod server;
pub mod tryon;

pub use error::{Error, Result};
