pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod organizer;
pub mod report;
pub mod store;

pub use catalog::*;
pub use config::*;
pub use error::*;
pub use models::*;
pub use organizer::*;
pub use report::*;
pub use store::*;
