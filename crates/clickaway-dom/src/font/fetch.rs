#![forbid(unsafe_code)]

//! Host hook for retrieving font bytes.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};

use crate::error::FetchError;

/// Retrieves font data for `url()` and `local()` sources.
///
/// The model performs no I/O of its own; a browser binding would forward to
/// `fetch`, a test supplies canned bytes.
pub trait FontFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Rc<[u8]>, FetchError>>;

    /// Bytes of an installed font, looked up by full name.
    fn local(&self, name: &str) -> Option<Rc<[u8]>> {
        let _ = name;
        None
    }
}

impl<T: FontFetcher + ?Sized> FontFetcher for Rc<T> {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Rc<[u8]>, FetchError>> {
        (**self).fetch(url)
    }

    fn local(&self, name: &str) -> Option<Rc<[u8]>> {
        (**self).local(name)
    }
}

/// In-memory fetcher over a fixed set of URLs and installed fonts.
#[derive(Debug, Default)]
pub struct StaticFontFetcher {
    urls: HashMap<String, Rc<[u8]>>,
    locals: HashMap<String, Rc<[u8]>>,
    fetches: Cell<usize>,
}

impl StaticFontFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>, bytes: impl Into<Rc<[u8]>>) -> Self {
        self.urls.insert(url.into(), bytes.into());
        self
    }

    #[must_use]
    pub fn with_local(mut self, name: impl Into<String>, bytes: impl Into<Rc<[u8]>>) -> Self {
        self.locals.insert(name.into(), bytes.into());
        self
    }

    /// Number of `fetch` calls served so far, hits and misses alike.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl FontFetcher for StaticFontFetcher {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Rc<[u8]>, FetchError>> {
        self.fetches.set(self.fetches.get() + 1);
        let result = self
            .urls
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::new("404 Not Found"));
        future::ready(result).boxed_local()
    }

    fn local(&self, name: &str) -> Option<Rc<[u8]>> {
        self.locals.get(name).cloned()
    }
}
