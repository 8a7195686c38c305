pub mod config;
pub mod encoding;
pub mod error;
pub mod load;
pub mod memory;
pub mod prepare;
pub mod records;
pub mod scaler;
pub mod session;
pub mod views;

pub use error::{PrepareError, Result};
pub use session::Session;
