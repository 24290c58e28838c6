//! Exit-code mapping for the Trawler CLI.

use trawler_types::CrawlError;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0).
    Success = 0,
    /// User error: unknown source or job, bad configuration (1).
    UserError = 1,
    /// Internal error: fetch, extraction, or indexing failure (2).
    InternalError = 2,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Classify an error chain into an exit code.
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<CrawlError>() {
            Some(CrawlError::Configuration { .. }) | Some(CrawlError::Validation { .. }) => {
                ExitCode::UserError
            }
            Some(_) => ExitCode::InternalError,
            None => ExitCode::InternalError,
        }
    }
}
