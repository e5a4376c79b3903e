mod bootstrap;
mod query;

pub use bootstrap::*;
pub use query::*;
