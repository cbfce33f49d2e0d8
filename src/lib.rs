pub mod clipboard;
pub mod config;
pub mod coordinator;
pub mod dsl;
pub mod logging;
pub mod orchestrator;
pub mod request;
pub mod state;
pub mod surface;
pub mod variants;
pub mod view;
pub mod x11;
