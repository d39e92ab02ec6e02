#![forbid(unsafe_code)]

use clickaway_dom::FontLoadError;
use thiserror::Error;

/// Why an idle font load did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontLoaderError {
    /// The first font that failed to load.
    #[error(transparent)]
    Font(#[from] FontLoadError),

    /// The load was dropped before it settled: the idle callback was
    /// cancelled, the window went away, or the load could not be queued.
    #[error("font load was dropped before completing")]
    Dropped,
}

pub type Result<T, E = FontLoaderError> = std::result::Result<T, E>;
