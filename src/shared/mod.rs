pub mod http;
pub mod logging;
pub mod resolution;
pub mod subprocess;

pub use logging::{DiagnosticLog, LogLevel, LogRecord};
pub use resolution::Resolution;
