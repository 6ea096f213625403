pub mod classify;
pub mod sanitize;

pub use classify::{parse_subject, Subject};
pub use sanitize::{sanitize, sanitize_response, SanitizeOptions};
