pub mod config;
pub mod error;
pub mod model;
pub mod checks;
pub mod parser;
pub mod report;
pub mod store;
pub mod server;

pub use error::{PlanError, PlanResult};
