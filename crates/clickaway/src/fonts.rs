#![forbid(unsafe_code)]

//! Idle-time web font loading.
//!
//! [`IdleFontLoader::trigger`] queues an idle callback and returns at once.
//! When the callback runs, every descriptor becomes a [`FontFace`] that is
//! added to `document.fonts` and loaded. The aggregate fails on the first
//! failing load and succeeds once every load has succeeded.
//!
//! # Invariants
//!
//! 1. Faces are registered before any of them loads. A failure never
//!    unregisters a face, and nothing is retried.
//! 2. Every face load is driven by the window's microtask queue on its own,
//!    so a failing sibling does not stall the other loads.
//! 3. The returned [`FontLoadCompletion`] is optional to observe: dropping
//!    it leaves the scheduled work untouched.
//!
//! [`FontFace`]: clickaway_dom::FontFace

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use clickaway_dom::{
    FontFaceDescriptors, FontFaceLoad, FontSource, IdleCallbackHandle, IdleDeadline,
    IdleRequestOptions, Window,
};
use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::try_join_all;
use tracing::{debug, warn};
use web_time::Duration;

use crate::error::{FontLoaderError, Result};

/// One font to load: the arguments of the `FontFace` constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct FontDescriptor {
    pub font_family: String,
    pub source: FontSource,
    #[cfg_attr(feature = "serde", serde(default))]
    pub descriptors: FontFaceDescriptors,
}

impl FontDescriptor {
    pub fn new(font_family: impl Into<String>, source: impl Into<FontSource>) -> Self {
        Self {
            font_family: font_family.into(),
            source: source.into(),
            descriptors: FontFaceDescriptors::default(),
        }
    }

    #[must_use]
    pub fn with_descriptors(mut self, descriptors: FontFaceDescriptors) -> Self {
        self.descriptors = descriptors;
        self
    }
}

/// One descriptor or a list of them, in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(from = "OneOrMany"))]
pub struct FontBatch(Vec<FontDescriptor>);

impl FontBatch {
    #[must_use]
    pub fn as_slice(&self) -> &[FontDescriptor] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FontDescriptor> {
        self.0.iter()
    }
}

impl From<FontDescriptor> for FontBatch {
    fn from(font: FontDescriptor) -> Self {
        Self(vec![font])
    }
}

impl From<Vec<FontDescriptor>> for FontBatch {
    fn from(fonts: Vec<FontDescriptor>) -> Self {
        Self(fonts)
    }
}

impl<const N: usize> From<[FontDescriptor; N]> for FontBatch {
    fn from(fonts: [FontDescriptor; N]) -> Self {
        Self(fonts.into())
    }
}

impl FromIterator<FontDescriptor> for FontBatch {
    fn from_iter<I: IntoIterator<Item = FontDescriptor>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<FontDescriptor>),
    One(FontDescriptor),
}

#[cfg(feature = "serde")]
impl From<OneOrMany> for FontBatch {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::Many(fonts) => Self(fonts),
            OneOrMany::One(font) => Self(vec![font]),
        }
    }
}

/// Loads a batch of fonts in the next idle period of a window.
#[derive(Debug, Clone)]
pub struct IdleFontLoader {
    window: Window,
    fonts: FontBatch,
    options: IdleRequestOptions,
}

impl IdleFontLoader {
    pub fn new(window: &Window, fonts: impl Into<FontBatch>) -> Self {
        Self {
            window: window.clone(),
            fonts: fonts.into(),
            options: IdleRequestOptions::default(),
        }
    }

    /// Run the load after `timeout` even if no idle period came.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.options = IdleRequestOptions::with_timeout(timeout);
        self
    }

    #[must_use]
    pub fn fonts(&self) -> &FontBatch {
        &self.fonts
    }

    /// Schedule the load. Every call schedules a new one.
    pub fn trigger(&self) -> FontLoadCompletion {
        let (sender, receiver) = oneshot::channel();
        let window = self.window.clone();
        let fonts = self.fonts.clone();
        let handle = self.window.request_idle_callback(
            move |deadline| load_batch(&window, &fonts, deadline, sender),
            self.options,
        );
        debug!(fonts = self.fonts.len(), ?handle, "font load scheduled");
        FontLoadCompletion {
            receiver,
            handle,
            settled: None,
        }
    }
}

fn load_batch(
    window: &Window,
    fonts: &FontBatch,
    deadline: IdleDeadline,
    sender: oneshot::Sender<Result<()>>,
) {
    debug!(
        fonts = fonts.len(),
        did_timeout = deadline.did_timeout(),
        "registering fonts"
    );
    let registry = window.document().fonts();
    let loads: Vec<FontFaceLoad> = fonts
        .iter()
        .map(|font| {
            let face = window.create_font_face(
                font.font_family.clone(),
                font.source.clone(),
                font.descriptors.clone(),
            );
            registry.add(&face);
            let load = face.load();
            if let Err(error) = window.spawn_local(load.clone().map(|_| ())) {
                warn!(family = %font.font_family, %error, "could not queue font load");
            }
            load
        })
        .collect();

    let aggregate = try_join_all(loads);
    let queued = window.spawn_local(async move {
        let outcome = aggregate.await.map(|_| ()).map_err(FontLoaderError::from);
        if let Err(error) = &outcome {
            warn!(%error, "font load failed");
        }
        // The caller may have dropped the completion.
        let _ = sender.send(outcome);
    });
    if let Err(error) = queued {
        warn!(%error, "could not queue font load");
    }
}

/// Completion of one [`IdleFontLoader::trigger`] call.
///
/// Resolves to `Ok(())` once every font loaded, to the first load error
/// otherwise, and to [`FontLoaderError::Dropped`] if the scheduled work was
/// discarded (for example by cancelling its idle callback).
#[must_use = "drop the completion to fire and forget"]
pub struct FontLoadCompletion {
    receiver: oneshot::Receiver<Result<()>>,
    handle: IdleCallbackHandle,
    settled: Option<Result<()>>,
}

impl FontLoadCompletion {
    /// The idle callback that will run the load.
    #[must_use]
    pub fn idle_handle(&self) -> IdleCallbackHandle {
        self.handle
    }

    /// The outcome, if settled. Once settled, every call returns it.
    pub fn try_take(&mut self) -> Option<Result<()>> {
        if self.settled.is_none() {
            self.settled = match self.receiver.try_recv() {
                Ok(outcome) => outcome,
                Err(oneshot::Canceled) => Some(Err(FontLoaderError::Dropped)),
            };
        }
        self.settled.clone()
    }
}

impl Future for FontLoadCompletion {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = &self.settled {
            return Poll::Ready(outcome.clone());
        }
        let outcome =
            ready!(self.receiver.poll_unpin(cx)).unwrap_or(Err(FontLoaderError::Dropped));
        self.settled = Some(outcome.clone());
        Poll::Ready(outcome)
    }
}

impl fmt::Debug for FontLoadCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontLoadCompletion")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clickaway_dom::{FontFaceLoadStatus, FontLoadError, StaticFontFetcher};

    const WOFF2: &[u8] = b"wOF2\0\0\0\0";
    const IDLE: Duration = Duration::from_millis(16);

    fn window() -> Window {
        Window::new().with_font_fetcher(
            StaticFontFetcher::new()
                .with_url("/inter.woff2", WOFF2.to_vec())
                .with_url("/roboto.woff2", WOFF2.to_vec()),
        )
    }

    #[test]
    fn nothing_happens_before_the_idle_period() {
        let window = window();
        let loader = IdleFontLoader::new(&window, FontDescriptor::new("Inter", "url(/inter.woff2)"));
        let mut completion = loader.trigger();
        assert!(window.document().fonts().is_empty());
        assert_eq!(window.pending_idle_callbacks(), 1);
        assert!(completion.try_take().is_none());
    }

    #[test]
    fn loads_every_font_in_the_idle_period() {
        let window = window();
        let loader = IdleFontLoader::new(
            &window,
            [
                FontDescriptor::new("Inter", "url(/inter.woff2)"),
                FontDescriptor::new("Roboto", FontSource::url("/roboto.woff2")),
            ],
        );
        let mut completion = loader.trigger();
        assert_eq!(window.run_idle_period(IDLE), 1);

        assert_eq!(completion.try_take(), Some(Ok(())));
        let fonts = window.document().fonts();
        assert_eq!(fonts.len(), 2);
        assert!(fonts.check("Inter"));
        assert!(fonts.check("Roboto"));
    }

    #[test]
    fn first_failure_rejects_and_keeps_registrations() {
        let window = window();
        let loader = IdleFontLoader::new(
            &window,
            vec![
                FontDescriptor::new("Missing", "url(/missing.woff2)"),
                FontDescriptor::new("Inter", "url(/inter.woff2)"),
            ],
        );
        let mut completion = loader.trigger();
        window.run_idle_period(IDLE);

        assert_eq!(
            completion.try_take(),
            Some(Err(FontLoaderError::Font(FontLoadError::network(
                "/missing.woff2",
                "404 Not Found"
            ))))
        );
        let faces = window.document().fonts().faces();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].status(), FontFaceLoadStatus::Error);
        assert_eq!(faces[1].status(), FontFaceLoadStatus::Loaded);
    }

    #[test]
    fn dropped_completion_still_loads() {
        let window = window();
        let loader = IdleFontLoader::new(&window, FontDescriptor::new("Inter", "url(/inter.woff2)"));
        drop(loader.trigger());
        window.run_idle_period(IDLE);
        assert!(window.document().fonts().check("Inter"));
    }

    #[test]
    fn cancelled_idle_callback_reports_dropped() {
        let window = window();
        let loader = IdleFontLoader::new(&window, FontDescriptor::new("Inter", "url(/inter.woff2)"));
        let mut completion = loader.trigger();
        assert!(window.cancel_idle_callback(completion.idle_handle()));
        assert_eq!(completion.try_take(), Some(Err(FontLoaderError::Dropped)));
        assert!(window.document().fonts().is_empty());
    }

    #[test]
    fn idle_timeout_forces_the_load() {
        let window = window();
        let loader = IdleFontLoader::new(&window, FontDescriptor::new("Inter", "url(/inter.woff2)"))
            .with_idle_timeout(Duration::from_millis(200));
        let mut completion = loader.trigger();
        assert_eq!(window.advance_time(Duration::from_millis(200)), 1);
        assert_eq!(completion.try_take(), Some(Ok(())));
    }

    #[test]
    fn binary_sources_load_without_a_fetcher() {
        let window = Window::new();
        let loader = IdleFontLoader::new(&window, FontDescriptor::new("Inline", WOFF2.to_vec()));
        let mut completion = loader.trigger();
        window.run_idle_period(IDLE);
        assert_eq!(completion.try_take(), Some(Ok(())));
    }

    #[test]
    fn empty_batch_resolves() {
        let window = window();
        let mut completion = IdleFontLoader::new(&window, FontBatch::default()).trigger();
        window.run_idle_period(IDLE);
        assert_eq!(completion.try_take(), Some(Ok(())));
    }

    #[test]
    fn settled_outcome_is_stable_across_reads() {
        let window = window();
        let loader = IdleFontLoader::new(&window, FontDescriptor::new("Inter", "url(/inter.woff2)"));
        let mut completion = loader.trigger();
        window.run_idle_period(IDLE);
        assert_eq!(completion.try_take(), Some(Ok(())));
        assert_eq!(completion.try_take(), Some(Ok(())));
        assert_eq!(futures::executor::block_on(completion), Ok(()));
    }

    #[test]
    fn failed_outcome_is_stable_across_reads() {
        let window = window();
        let loader = IdleFontLoader::new(&window, FontDescriptor::new("Lost", "url(/lost.woff2)"));
        let mut completion = loader.trigger();
        window.run_idle_period(IDLE);
        let first = completion.try_take();
        assert!(matches!(first, Some(Err(FontLoaderError::Font(_)))), "{first:?}");
        assert_eq!(completion.try_take(), first);
        assert_eq!(Some(futures::executor::block_on(completion)), first);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn batches_deserialize_from_one_or_many() {
        let one: FontBatch =
            serde_json::from_str(r#"{"fontFamily":"Inter","source":"url(/inter.woff2)"}"#).unwrap();
        assert_eq!(one.len(), 1);
        let many: FontBatch = serde_json::from_str(
            r#"[{"fontFamily":"Inter","source":"url(/inter.woff2)"},
                {"fontFamily":"Bold","source":"url(/b.woff2)","descriptors":{"weight":"700"}}]"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many.as_slice()[1].descriptors.weight, "700");
    }
}
