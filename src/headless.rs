// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
An in-memory host.

[HeadlessVideo] implements [VideoResource] and [VideoElement] without any media stack: the
owner sets readiness and dimensions and delivers signals by hand.  [HeadlessDocument] creates
headless elements and remembers them so they can be inspected afterwards.

This is how native programs without a browser drive a [crate::VideoTexture] from their own
decoder, and how the crate's tests exercise every ordering of host signals.

```
use std::rc::Rc;
use video_texture::headless::HeadlessVideo;
use video_texture::{ManualScheduler, MediaSignal, ReadyState, VideoTexture, VideoTextureConfig};

let video = Rc::new(HeadlessVideo::new());
let scheduler = Rc::new(ManualScheduler::new());
let texture = VideoTexture::new(video.clone(), scheduler.clone(), VideoTextureConfig::default());
assert!(!texture.has_loaded());

video.become_ready(ReadyState::HaveEnoughData, 640, 360);
video.deliver(MediaSignal::CanPlay);
assert_eq!((texture.width(), texture.height()), (640, 360));
```
*/

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::resource::{
    IdentityTag, Listener, MediaDocument, MediaSignal, ReadyState, SourceDeclaration,
    VideoElement, VideoResource,
};
use crate::signals::{Emitter, ListenerId};

#[derive(Debug)]
pub struct HeadlessVideo {
    ready_state: Cell<ReadyState>,
    width: Cell<u32>,
    height: Cell<u32>,
    paused: Cell<bool>,
    plays_synchronously: Cell<bool>,
    play_requests: Cell<u32>,
    load_requests: Cell<u32>,
    signals: [Emitter<()>; 4],
    tag: Cell<Option<IdentityTag>>,
    sources: RefCell<Vec<SourceDeclaration>>,
}

impl Default for HeadlessVideo {
    fn default() -> Self {
        HeadlessVideo {
            ready_state: Cell::new(ReadyState::HaveNothing),
            width: Cell::new(0),
            height: Cell::new(0),
            paused: Cell::new(true),
            plays_synchronously: Cell::new(false),
            play_requests: Cell::new(0),
            load_requests: Cell::new(0),
            signals: std::array::from_fn(|_| Emitter::new()),
            tag: Cell::new(None),
            sources: RefCell::new(Vec::new()),
        }
    }
}

impl HeadlessVideo {
    /// A resource with no data and unknown dimensions.
    pub fn new() -> Self {
        Self::default()
    }

    /// A resource that has buffered enough to play through and knows its size.
    pub fn ready(width: u32, height: u32) -> Self {
        let video = Self::default();
        video.become_ready(ReadyState::HaveEnoughData, width, height);
        video
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.ready_state.set(ready_state);
    }

    pub fn set_video_size(&self, width: u32, height: u32) {
        self.width.set(width);
        self.height.set(height);
    }

    /// Sets readiness and size together without delivering any signal.
    pub fn become_ready(&self, ready_state: ReadyState, width: u32, height: u32) {
        self.set_ready_state(ready_state);
        self.set_video_size(width, height);
    }

    /**
    When set, [VideoResource::play] on a paused resource delivers [MediaSignal::Play] before
    returning, the way some hosts do.
    */
    pub fn set_plays_synchronously(&self, plays_synchronously: bool) {
        self.plays_synchronously.set(plays_synchronously);
    }

    /// Delivers `signal` to its listeners.  Returns how many ran.
    pub fn deliver(&self, signal: MediaSignal) -> usize {
        match signal {
            MediaSignal::Play => self.paused.set(false),
            MediaSignal::Pause => self.paused.set(true),
            MediaSignal::CanPlay | MediaSignal::CanPlayThrough => {}
        }
        self.signals[signal.index()].emit(&())
    }

    /// Pauses playback, delivering [MediaSignal::Pause] if it was playing.
    pub fn pause(&self) {
        if !self.paused.get() {
            self.deliver(MediaSignal::Pause);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    pub fn listener_count(&self, signal: MediaSignal) -> usize {
        self.signals[signal.index()].len()
    }

    /// Total listeners across all signals.
    pub fn total_listeners(&self) -> usize {
        self.signals.iter().map(Emitter::len).sum()
    }

    pub fn play_requests(&self) -> u32 {
        self.play_requests.get()
    }

    pub fn load_requests(&self) -> u32 {
        self.load_requests.get()
    }

    pub fn sources(&self) -> Vec<SourceDeclaration> {
        self.sources.borrow().clone()
    }
}

impl VideoResource for HeadlessVideo {
    fn ready_state(&self) -> ReadyState {
        self.ready_state.get()
    }

    fn video_width(&self) -> u32 {
        self.width.get()
    }

    fn video_height(&self) -> u32 {
        self.height.get()
    }

    fn is_playing(&self) -> bool {
        !self.paused.get()
    }

    fn play(&self) {
        self.play_requests.set(self.play_requests.get() + 1);
        if self.plays_synchronously.get() && self.paused.get() {
            self.deliver(MediaSignal::Play);
        }
    }

    fn add_listener(&self, signal: MediaSignal, listener: Listener) -> ListenerId {
        self.signals[signal.index()].add(move |_| listener())
    }

    fn remove_listener(&self, signal: MediaSignal, id: ListenerId) -> bool {
        self.signals[signal.index()].remove(id)
    }

    fn identity_tag(&self) -> Option<IdentityTag> {
        self.tag.get()
    }

    fn set_identity_tag(&self, tag: Option<IdentityTag>) {
        self.tag.set(tag);
    }
}

impl VideoElement for HeadlessVideo {
    fn append_source(&self, source: SourceDeclaration) {
        self.sources.borrow_mut().push(source);
    }

    fn load(&self) {
        self.load_requests.set(self.load_requests.get() + 1);
    }
}

/// Creates [HeadlessVideo] elements.
#[derive(Debug)]
pub struct HeadlessDocument {
    available: bool,
    created: RefCell<Vec<Rc<HeadlessVideo>>>,
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        HeadlessDocument {
            available: true,
            created: RefCell::new(Vec::new()),
        }
    }
}

impl HeadlessDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document that cannot create elements.
    pub fn unavailable() -> Self {
        HeadlessDocument {
            available: false,
            created: RefCell::new(Vec::new()),
        }
    }

    pub fn created(&self) -> Vec<Rc<HeadlessVideo>> {
        self.created.borrow().clone()
    }

    pub fn last_created(&self) -> Option<Rc<HeadlessVideo>> {
        self.created.borrow().last().cloned()
    }
}

impl MediaDocument for HeadlessDocument {
    fn create_video_element(&self) -> Option<Rc<dyn VideoElement>> {
        if !self.available {
            return None;
        }
        let video = Rc::new(HeadlessVideo::new());
        self.created.borrow_mut().push(video.clone());
        Some(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn listeners_follow_signals() {
        let video = HeadlessVideo::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = video.add_listener(MediaSignal::Pause, Rc::new(move || h.set(h.get() + 1)));
        assert_eq!(video.deliver(MediaSignal::Play), 0);
        video.pause();
        video.pause();
        assert_eq!(hits.get(), 1);
        assert!(video.remove_listener(MediaSignal::Pause, id));
        assert!(!video.remove_listener(MediaSignal::Pause, id));
        assert_eq!(video.total_listeners(), 0);
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn synchronous_play_delivers_once() {
        let video = HeadlessVideo::new();
        video.set_plays_synchronously(true);
        let plays = Rc::new(Cell::new(0));
        let p = plays.clone();
        video.add_listener(MediaSignal::Play, Rc::new(move || p.set(p.get() + 1)));
        video.play();
        video.play();
        assert_eq!(plays.get(), 1);
        assert_eq!(video.play_requests(), 2);
        assert!(!video.is_paused());
        assert!(video.is_playing());
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn document_tracks_created_elements() {
        let document = HeadlessDocument::new();
        assert!(document.create_video_element().is_some());
        assert_eq!(document.created().len(), 1);
        assert!(HeadlessDocument::unavailable().create_video_element().is_none());
    }
}
