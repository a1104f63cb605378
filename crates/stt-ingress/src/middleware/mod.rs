//! Request-processing middleware: logging and CORS. Authentication, rate
//! limiting and schema administration are excluded (Non-goals).

pub mod cors;
pub mod logging;
