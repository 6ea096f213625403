//! Process exit statuses

/// Message accepted: no error-severity violations remain
pub const OK: i32 = 0;
/// Message printed, but error-severity violations remain
pub const UNRESOLVED_ERRORS: i32 = 1;
/// No message produced (agent failure, timeout, bad contract or input)
pub const FATAL: i32 = 2;
/// Interrupted by Ctrl-C
pub const CANCELLED: i32 = 130;
