pub mod app;
pub mod config;
pub mod dataplatform;
pub mod discovery;
pub mod flow;
pub mod readiness;
pub mod shared;
