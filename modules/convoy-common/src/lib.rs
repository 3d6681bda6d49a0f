pub mod config;
pub mod error;
pub mod resource;
pub mod types;

pub use config::Config;
pub use error::CommonError;
pub use resource::Resource;
pub use types::{Connection, Flavor};
