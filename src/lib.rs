pub mod catalog;
pub mod clients;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod http;
pub mod prompts;

pub use config::Config;
pub use error::{RelayError, Result};
pub use handler::{GenerationRequest, GenerationResult, Generator};
