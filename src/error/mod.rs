mod app;
mod config;
mod http;
mod load;
mod sink;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::HttpError;
pub use load::LoadError;
pub use sink::SinkError;
pub use validation::ValidationError;
