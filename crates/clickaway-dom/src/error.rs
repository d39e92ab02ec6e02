#![forbid(unsafe_code)]

use thiserror::Error;

/// Why a [`FontFace`](crate::FontFace) failed to load.
///
/// `Clone` because one load is shared by every caller of
/// [`FontFace::load`](crate::FontFace::load).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontLoadError {
    #[error("invalid font src descriptor: {src:?}")]
    Syntax { src: String },

    #[error("failed to fetch font from {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("font data for {family:?} is not a recognised font format")]
    InvalidData { family: String },

    #[error("no usable source for font {family:?}")]
    NoUsableSource { family: String },
}

impl FontLoadError {
    #[must_use]
    pub fn syntax(src: impl Into<String>) -> Self {
        Self::Syntax { src: src.into() }
    }

    #[must_use]
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Invalid tree mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HierarchyError {
    #[error("a document node cannot be inserted into a tree")]
    DocumentInsertion,

    #[error("a shadow root cannot be inserted into a tree")]
    ShadowRootInsertion,

    #[error("the node would become its own ancestor")]
    Cycle,

    #[error("the node belongs to a different document")]
    WrongDocument,

    #[error("the node is not a child of this parent")]
    NotAChild,

    #[error("only elements can host a shadow root")]
    NotAnElement,

    #[error("the element already hosts a shadow root")]
    ShadowRootExists,
}

/// Failure reported by a [`FontFetcher`](crate::FontFetcher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct FetchError {
    reason: String,
}

impl FetchError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
