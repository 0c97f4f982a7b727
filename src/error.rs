//! Shared error-reporting contract.
//!
//! Every module owns its own `thiserror` enum. The shell only needs a
//! grepable code and a retryable hint to render a failure, so each enum
//! implements [`ErrorCode`] instead of being folded into one crate error.

/// Grepable error code and retryable flag for user-facing error lines.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Render an error as `[E_CODE] message`, with a retry hint when relevant.
#[must_use]
pub fn render_error(err: &dyn ErrorCode) -> String {
    if err.retryable() {
        format!("[{}] {err} (try again)", err.error_code())
    } else {
        format!("[{}] {err}", err.error_code())
    }
}
