pub mod config;
pub mod error;
pub mod gateway;
pub mod io;
pub mod lock;
pub mod participation;
pub mod paths;
pub mod resolver;
pub mod service;
pub mod types;
pub mod window;

pub use error::{BbrError, Result};
