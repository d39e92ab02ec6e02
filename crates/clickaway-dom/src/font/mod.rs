#![forbid(unsafe_code)]

//! Web fonts: `FontFace`, the document font set, `src` parsing and fetching.

pub mod face;
pub mod fetch;
pub mod set;
pub mod src;

pub use face::{FontFace, FontFaceLoad, FontFaceLoadStatus};
pub use fetch::{FontFetcher, StaticFontFetcher};
pub use set::FontFaceSet;
pub use src::{SrcEntry, parse_src};

use std::rc::Rc;

/// Where a font face gets its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(untagged))]
pub enum FontSource {
    /// A CSS `src` descriptor such as `url("/a.woff2") format("woff2")`.
    Css(String),
    /// Raw font file bytes.
    Binary(Rc<[u8]>),
}

impl FontSource {
    /// `url("...")` source for a single location.
    #[must_use]
    pub fn url(url: &str) -> Self {
        Self::Css(format!("url(\"{url}\")"))
    }

    #[must_use]
    pub fn binary(bytes: impl Into<Rc<[u8]>>) -> Self {
        Self::Binary(bytes.into())
    }
}

impl From<&str> for FontSource {
    fn from(src: &str) -> Self {
        Self::Css(src.to_owned())
    }
}

impl From<String> for FontSource {
    fn from(src: String) -> Self {
        Self::Css(src)
    }
}

impl From<Vec<u8>> for FontSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes.into())
    }
}

/// Optional descriptors of the `FontFace` constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(default, rename_all = "camelCase")
)]
pub struct FontFaceDescriptors {
    pub style: String,
    pub weight: String,
    pub stretch: String,
    pub unicode_range: String,
    pub display: String,
}

impl FontFaceDescriptors {
    #[must_use]
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    #[must_use]
    pub fn weight(mut self, weight: impl Into<String>) -> Self {
        self.weight = weight.into();
        self
    }

    #[must_use]
    pub fn display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }
}

impl Default for FontFaceDescriptors {
    fn default() -> Self {
        Self {
            style: "normal".to_owned(),
            weight: "normal".to_owned(),
            stretch: "normal".to_owned(),
            unicode_range: "U+0-10FFFF".to_owned(),
            display: "auto".to_owned(),
        }
    }
}

/// Container format of font data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFormat {
    TrueType,
    OpenType,
    Collection,
    Woff,
    Woff2,
}

impl FontFormat {
    /// Identify font data by its leading signature.
    #[must_use]
    pub fn sniff(data: &[u8]) -> Option<Self> {
        let tag: [u8; 4] = data.get(..4)?.try_into().ok()?;
        match &tag {
            [0x00, 0x01, 0x00, 0x00] | b"true" | b"typ1" => Some(Self::TrueType),
            b"OTTO" => Some(Self::OpenType),
            b"ttcf" => Some(Self::Collection),
            b"wOFF" => Some(Self::Woff),
            b"wOF2" => Some(Self::Woff2),
            _ => None,
        }
    }

    /// Map a `format()` hint; `None` for formats this host cannot use.
    #[must_use]
    pub fn from_css_format(hint: &str) -> Option<Self> {
        match hint.to_ascii_lowercase().as_str() {
            "truetype" => Some(Self::TrueType),
            "opentype" => Some(Self::OpenType),
            "collection" => Some(Self::Collection),
            "woff" => Some(Self::Woff),
            "woff2" => Some(Self::Woff2),
            _ => None,
        }
    }
}
