mod orchestrator;
pub mod staged;
mod types;
mod validator;

pub use orchestrator::Orchestrator;
pub use staged::{StagedEvent, StagedRun, StagedState};
pub use types::{Photo, TryOnParams, TryOnRequest};
pub use validator::RequestValidator;
