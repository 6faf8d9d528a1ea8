mod client;
mod retry;
mod types;

pub use client::{HttpInferenceClient, InferenceClient};
pub use retry::RetryPolicy;
pub use types::*;
