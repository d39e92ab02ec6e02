#![forbid(unsafe_code)]

//! `FontFace`: one font face and its load state.
//!
//! # State machine
//!
//! ```text
//! Css source:     Unloaded --load()--> Loading --> Loaded | Error
//! Binary source:  Loaded | Error   (decided at construction)
//! Bad src syntax: Error            (decided at construction)
//! ```
//!
//! # Invariants
//!
//! 1. A face loads at most once: every `load()` call returns a clone of the
//!    same shared future.
//! 2. `status()` is `Loaded` exactly when `data()` is `Some`.
//! 3. `src` entries are tried in order; the first whose bytes carry a known
//!    font signature wins.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture, Shared};
use tracing::{debug, trace};

use crate::error::FontLoadError;
use crate::font::fetch::FontFetcher;
use crate::font::src::{SrcEntry, parse_src};
use crate::font::{FontFaceDescriptors, FontFormat, FontSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFaceLoadStatus {
    Unloaded,
    Loading,
    Loaded,
    Error,
}

/// The shared load of a face; clone it freely.
pub type FontFaceLoad = Shared<LocalBoxFuture<'static, Result<(), FontLoadError>>>;

struct FontFaceInner {
    family: String,
    source: FontSource,
    descriptors: FontFaceDescriptors,
    fetcher: Option<Rc<dyn FontFetcher>>,
    /// Parsed `src` list; empty for binary sources.
    entries: Vec<SrcEntry>,
    status: Cell<FontFaceLoadStatus>,
    format: Cell<Option<FontFormat>>,
    data: RefCell<Option<Rc<[u8]>>>,
    load: RefCell<Option<FontFaceLoad>>,
}

/// Shared handle to a font face. Equality is identity.
#[derive(Clone)]
pub struct FontFace {
    inner: Rc<FontFaceInner>,
}

impl FontFace {
    /// A face without a fetcher: `url()` sources fail to load.
    #[must_use]
    pub fn new(
        family: impl Into<String>,
        source: FontSource,
        descriptors: FontFaceDescriptors,
    ) -> Self {
        Self::with_fetcher(family, source, descriptors, None)
    }

    #[must_use]
    pub fn with_fetcher(
        family: impl Into<String>,
        source: FontSource,
        descriptors: FontFaceDescriptors,
        fetcher: Option<Rc<dyn FontFetcher>>,
    ) -> Self {
        let family = family.into();
        let mut entries = Vec::new();
        let mut status = FontFaceLoadStatus::Unloaded;
        let mut format = None;
        let mut data = None;
        let mut settled = None;

        match &source {
            FontSource::Binary(bytes) => match FontFormat::sniff(bytes) {
                Some(sniffed) => {
                    status = FontFaceLoadStatus::Loaded;
                    format = Some(sniffed);
                    data = Some(Rc::clone(bytes));
                    settled = Some(Ok(()));
                }
                None => {
                    status = FontFaceLoadStatus::Error;
                    settled = Some(Err(FontLoadError::InvalidData {
                        family: family.clone(),
                    }));
                }
            },
            FontSource::Css(src) => match parse_src(src) {
                Ok(parsed) => entries = parsed,
                Err(error) => {
                    status = FontFaceLoadStatus::Error;
                    settled = Some(Err(error));
                }
            },
        }

        Self {
            inner: Rc::new(FontFaceInner {
                family,
                source,
                descriptors,
                fetcher,
                entries,
                status: Cell::new(status),
                format: Cell::new(format),
                data: RefCell::new(data),
                load: RefCell::new(settled.map(|result| future::ready(result).boxed_local().shared())),
            }),
        }
    }

    #[must_use]
    pub fn family(&self) -> &str {
        &self.inner.family
    }

    #[must_use]
    pub fn source(&self) -> &FontSource {
        &self.inner.source
    }

    #[must_use]
    pub fn descriptors(&self) -> &FontFaceDescriptors {
        &self.inner.descriptors
    }

    #[must_use]
    pub fn status(&self) -> FontFaceLoadStatus {
        self.inner.status.get()
    }

    /// Detected container format once loaded.
    #[must_use]
    pub fn format(&self) -> Option<FontFormat> {
        self.inner.format.get()
    }

    /// Font bytes once loaded.
    #[must_use]
    pub fn data(&self) -> Option<Rc<[u8]>> {
        self.inner.data.borrow().clone()
    }

    /// Start loading (if not started) and return the shared load.
    pub fn load(&self) -> FontFaceLoad {
        if let Some(load) = self.inner.load.borrow().as_ref() {
            return load.clone();
        }

        self.inner.status.set(FontFaceLoadStatus::Loading);
        debug!(family = %self.inner.family, "font face load started");

        let weak: Weak<FontFaceInner> = Rc::downgrade(&self.inner);
        let family = self.inner.family.clone();
        let entries = self.inner.entries.clone();
        let fetcher = self.inner.fetcher.clone();
        let load = async move {
            let outcome = fetch_first(&family, &entries, fetcher.as_deref()).await;
            if let Some(inner) = weak.upgrade() {
                match &outcome {
                    Ok((format, bytes)) => {
                        inner.format.set(Some(*format));
                        *inner.data.borrow_mut() = Some(Rc::clone(bytes));
                        inner.status.set(FontFaceLoadStatus::Loaded);
                    }
                    Err(_) => inner.status.set(FontFaceLoadStatus::Error),
                }
            }
            outcome.map(|_| ())
        }
        .boxed_local()
        .shared();

        *self.inner.load.borrow_mut() = Some(load.clone());
        load
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &FontFace) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

async fn fetch_first(
    family: &str,
    entries: &[SrcEntry],
    fetcher: Option<&dyn FontFetcher>,
) -> Result<(FontFormat, Rc<[u8]>), FontLoadError> {
    let mut last_error = None;
    for entry in entries {
        let attempt = match entry {
            SrcEntry::Url { url, format } => {
                if format
                    .as_deref()
                    .is_some_and(|hint| FontFormat::from_css_format(hint).is_none())
                {
                    trace!(%url, ?format, "skipping source with unsupported format");
                    continue;
                }
                match fetcher {
                    Some(fetcher) => fetcher
                        .fetch(url)
                        .await
                        .map_err(|error| FontLoadError::network(url, error.reason())),
                    None => Err(FontLoadError::network(url, "no font fetcher installed")),
                }
            }
            SrcEntry::Local(name) => match fetcher.and_then(|fetcher| fetcher.local(name)) {
                Some(bytes) => Ok(bytes),
                None => {
                    trace!(%name, "local font not installed");
                    continue;
                }
            },
        };

        match attempt {
            Ok(bytes) => match FontFormat::sniff(&bytes) {
                Some(format) => return Ok((format, bytes)),
                None => {
                    last_error = Some(FontLoadError::InvalidData {
                        family: family.to_owned(),
                    });
                }
            },
            Err(error) => {
                debug!(%family, %error, "font source failed, trying next");
                last_error = Some(error);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| FontLoadError::NoUsableSource {
        family: family.to_owned(),
    }))
}

impl PartialEq for FontFace {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for FontFace {}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.inner.family)
            .field("status", &self.inner.status.get())
            .field("format", &self.inner.format.get())
            .finish()
    }
}
