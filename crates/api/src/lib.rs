pub mod config;
pub mod logging;
pub mod providers;
pub mod server;

pub use config::AppConfig;
pub use providers::build_pipeline;
