pub mod agent;
pub mod config;
pub mod context;
pub mod cycle;
pub mod errors;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod systems;
pub mod tool_executor;
