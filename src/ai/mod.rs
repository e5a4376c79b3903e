mod cloud_api;
mod generation;
mod prompt;

pub use cloud_api::*;
pub use generation::*;
pub use prompt::*;
