// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Browser bindings.

* [WebVideo] adapts an `HTMLVideoElement` to [VideoResource] and [VideoElement].
* [WebDocument] creates `<video>` and `<source>` elements.
* [AnimationFrameScheduler] schedules frames with `window.requestAnimationFrame`.

The identity tag is stored as a property on the element itself, so two [WebVideo] wrappers of
the same element share it.
*/

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use web_sys::js_sys;
use web_sys::wasm_bindgen::closure::Closure;
use web_sys::wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlSourceElement, HtmlVideoElement};

use crate::resource::{
    IdentityTag, Listener, MediaDocument, MediaSignal, ReadyState, SourceDeclaration,
    VideoElement, VideoResource,
};
use crate::scheduler::{FrameCallback, FrameScheduler};
use crate::signals::ListenerId;

const TAG_PROPERTY: &str = "__videoTextureId";

pub struct WebVideo {
    element: HtmlVideoElement,
    next_id: Cell<u64>,
    listeners: RefCell<HashMap<ListenerId, (MediaSignal, Closure<dyn FnMut()>)>>,
    //shared by every play() promise this wrapper creates
    play_rejected: Closure<dyn FnMut(JsValue)>,
}

impl WebVideo {
    pub fn new(element: HtmlVideoElement) -> Self {
        let play_rejected = Closure::<dyn FnMut(JsValue)>::new(|reason: JsValue| {
            logwise::warn_sync!(
                "WebVideo::play rejected: {reason}",
                reason = logwise::privacy::LogIt(&reason)
            );
        });
        WebVideo {
            element,
            next_id: Cell::new(1),
            listeners: RefCell::new(HashMap::new()),
            play_rejected,
        }
    }

    fn remove_dom_listener(&self, signal: MediaSignal, closure: &Closure<dyn FnMut()>) {
        if let Err(err) = self
            .element
            .remove_event_listener_with_callback(signal.event_name(), closure.as_ref().unchecked_ref())
        {
            logwise::error_sync!(
                "WebVideo::remove_listener failed: {err}",
                err = logwise::privacy::LogIt(&err)
            );
        }
    }

    pub fn element(&self) -> &HtmlVideoElement {
        &self.element
    }
}

impl std::fmt::Debug for WebVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebVideo")
            .field("listeners", &self.listeners.borrow().len())
            .finish_non_exhaustive()
    }
}

impl VideoResource for WebVideo {
    fn ready_state(&self) -> ReadyState {
        ReadyState::from_raw(self.element.ready_state())
    }

    fn video_width(&self) -> u32 {
        self.element.video_width()
    }

    fn video_height(&self) -> u32 {
        self.element.video_height()
    }

    fn is_playing(&self) -> bool {
        !self.element.paused()
    }

    fn play(&self) {
        //autoplay and decode failures reject the promise; no "play" event follows
        match self.element.play() {
            Ok(promise) => {
                promise.catch(&self.play_rejected);
            }
            Err(err) => {
                logwise::warn_sync!(
                    "WebVideo::play threw: {err}",
                    err = logwise::privacy::LogIt(&err)
                );
            }
        }
    }

    fn add_listener(&self, signal: MediaSignal, listener: Listener) -> ListenerId {
        let id = ListenerId::from_raw(self.next_id.get());
        self.next_id.set(id.raw() + 1);
        let closure = Closure::<dyn FnMut()>::new(move || listener());
        if let Err(err) = self
            .element
            .add_event_listener_with_callback(signal.event_name(), closure.as_ref().unchecked_ref())
        {
            logwise::error_sync!(
                "WebVideo::add_listener failed: {err}",
                err = logwise::privacy::LogIt(&err)
            );
        }
        self.listeners.borrow_mut().insert(id, (signal, closure));
        id
    }

    fn remove_listener(&self, signal: MediaSignal, id: ListenerId) -> bool {
        let registered = self
            .listeners
            .borrow()
            .get(&id)
            .is_some_and(|(registered, _)| *registered == signal);
        if !registered {
            return false;
        }
        let Some((_, closure)) = self.listeners.borrow_mut().remove(&id) else {
            return false;
        };
        self.remove_dom_listener(signal, &closure);
        true
    }

    fn identity_tag(&self) -> Option<IdentityTag> {
        js_sys::Reflect::get(&self.element, &JsValue::from_str(TAG_PROPERTY))
            .ok()
            .and_then(|value| value.as_f64())
            .map(|raw| IdentityTag::from_raw(raw as u64))
    }

    fn set_identity_tag(&self, tag: Option<IdentityTag>) {
        let key = JsValue::from_str(TAG_PROPERTY);
        let result = match tag {
            Some(tag) => {
                js_sys::Reflect::set(&self.element, &key, &JsValue::from_f64(tag.raw() as f64))
            }
            None => js_sys::Reflect::delete_property(self.element.unchecked_ref(), &key),
        };
        if let Err(err) = result {
            logwise::error_sync!(
                "WebVideo::set_identity_tag failed: {err}",
                err = logwise::privacy::LogIt(&err)
            );
        }
    }
}

impl VideoElement for WebVideo {
    fn append_source(&self, source: SourceDeclaration) {
        let Some(document) = self.element.owner_document() else {
            logwise::error_sync!("WebVideo::append_source: element has no document");
            return;
        };
        let created = document
            .create_element("source")
            .map(|element| element.unchecked_into::<HtmlSourceElement>());
        match created {
            Ok(element) => {
                element.set_src(&source.url);
                if let Some(mime_type) = &source.mime_type {
                    element.set_type(mime_type);
                }
                if let Err(err) = self.element.append_child(&element) {
                    logwise::error_sync!(
                        "WebVideo::append_source failed: {err}",
                        err = logwise::privacy::LogIt(&err)
                    );
                }
            }
            Err(err) => {
                logwise::error_sync!(
                    "WebVideo::append_source could not create <source>: {err}",
                    err = logwise::privacy::LogIt(&err)
                );
            }
        }
    }

    fn load(&self) {
        self.element.load();
    }
}

impl Drop for WebVideo {
    fn drop(&mut self) {
        let listeners = std::mem::take(self.listeners.get_mut());
        for (signal, closure) in listeners.into_values() {
            self.remove_dom_listener(signal, &closure);
        }
    }
}

/// Creates [WebVideo] elements in a DOM document.
#[derive(Debug, Clone)]
pub struct WebDocument {
    document: Document,
}

impl WebDocument {
    pub fn new(document: Document) -> Self {
        WebDocument { document }
    }

    /// The document of the global `window`, if there is one.
    pub fn from_window() -> Option<Self> {
        web_sys::window()
            .and_then(|window| window.document())
            .map(WebDocument::new)
    }
}

impl WebDocument {
    /// Creates a detached `<video>` ready to receive sources.
    pub fn create_web_video(&self) -> Option<Rc<WebVideo>> {
        let element = match self.document.create_element("video") {
            Ok(element) => element,
            Err(err) => {
                logwise::error_sync!(
                    "WebDocument could not create <video>: {err}",
                    err = logwise::privacy::LogIt(&err)
                );
                return None;
            }
        };
        let element: HtmlVideoElement = element.dyn_into().ok()?;
        //sources added later are what the element loads
        element.set_preload("auto");
        element.set_cross_origin(Some("anonymous"));
        Some(Rc::new(WebVideo::new(element)))
    }
}

impl MediaDocument for WebDocument {
    fn create_video_element(&self) -> Option<Rc<dyn VideoElement>> {
        let video: Rc<dyn VideoElement> = self.create_web_video()?;
        Some(video)
    }
}

/// Schedules frames with `window.requestAnimationFrame`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnimationFrameScheduler;

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) {
        let Some(window) = web_sys::window() else {
            logwise::error_sync!("AnimationFrameScheduler: no window");
            return;
        };
        let context = logwise::context::Context::current();
        let closure = Closure::once_into_js(move |timestamp: f64| {
            context.set_current();
            callback(timestamp);
        });
        if let Err(err) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            logwise::error_sync!(
                "requestAnimationFrame failed: {err}",
                err = logwise::privacy::LogIt(&err)
            );
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::cache::TextureCache;
    use crate::config::VideoTextureConfig;
    use crate::scheduler::ManualScheduler;
    use crate::video_texture::{TextureHost, VideoTexture};
    use web_sys::Event;

    wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> WebDocument {
        WebDocument::from_window().expect("browser document")
    }

    fn declared_sources(video: &WebVideo) -> Vec<(Option<String>, Option<String>)> {
        let sources = video.element().get_elements_by_tag_name("source");
        (0..sources.length())
            .filter_map(|index| sources.item(index))
            .map(|source| (source.get_attribute("src"), source.get_attribute("type")))
            .collect()
    }

    struct RecordingDocument {
        document: WebDocument,
        created: RefCell<Option<Rc<WebVideo>>>,
    }

    impl MediaDocument for RecordingDocument {
        fn create_video_element(&self) -> Option<Rc<dyn VideoElement>> {
            let video = self.document.create_web_video()?;
            self.created.replace(Some(video.clone()));
            Some(video)
        }
    }

    #[wasm_bindgen_test::wasm_bindgen_test]
    fn identity_tag_lives_on_the_element() {
        let video = document().create_web_video().unwrap();
        assert_eq!(video.identity_tag(), None);

        let tag = IdentityTag::next();
        video.set_identity_tag(Some(tag));
        assert_eq!(video.identity_tag(), Some(tag));
        let other_wrapper = WebVideo::new(video.element().clone());
        assert_eq!(other_wrapper.identity_tag(), Some(tag));

        video.set_identity_tag(None);
        assert_eq!(other_wrapper.identity_tag(), None);
        let key = JsValue::from_str(TAG_PROPERTY);
        assert_eq!(js_sys::Reflect::has(video.element(), &key), Ok(false));
    }

    #[wasm_bindgen_test::wasm_bindgen_test]
    fn removed_listeners_stop_receiving_events() {
        let video = document().create_web_video().unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = video.add_listener(MediaSignal::Pause, Rc::new(move || h.set(h.get() + 1)));

        let pause = Event::new("pause").unwrap();
        video.element().dispatch_event(&pause).unwrap();
        assert_eq!(hits.get(), 1);

        assert!(!video.remove_listener(MediaSignal::Play, id));
        assert!(video.remove_listener(MediaSignal::Pause, id));
        assert!(!video.remove_listener(MediaSignal::Pause, id));

        let pause = Event::new("pause").unwrap();
        video.element().dispatch_event(&pause).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[wasm_bindgen_test::wasm_bindgen_test]
    fn from_sources_appends_typed_source_children() {
        let document = RecordingDocument {
            document: document(),
            created: RefCell::new(None),
        };
        let host = TextureHost::new(Rc::new(TextureCache::new()), Rc::new(ManualScheduler::new()));
        let config = VideoTextureConfig::new().with_auto_play(false);

        let texture = VideoTexture::from_sources(&host, &document, ["a.webm", "a.mp4"], config).unwrap();

        let video = document.created.borrow().clone().unwrap();
        assert_eq!(
            declared_sources(&video),
            [
                (Some("a.webm".to_string()), Some("video/webm".to_string())),
                (Some("a.mp4".to_string()), Some("video/mp4".to_string())),
            ]
        );
        assert_eq!(video.identity_tag(), texture.resource().and_then(|r| r.identity_tag()));
        texture.destroy();
    }

    #[wasm_bindgen_test::wasm_bindgen_test]
    fn play_without_sources_reports_through_the_promise() {
        let video = document().create_web_video().unwrap();
        //the rejection arrives later, on the shared handler
        video.play();
        video.play();
        assert_eq!(video.is_playing(), !video.element().paused());
    }

    #[wasm_bindgen_test::wasm_bindgen_test]
    fn untyped_source_has_no_type_attribute() {
        let video = document().create_web_video().unwrap();
        video.append_source(SourceDeclaration {
            url: "live/".to_string(),
            mime_type: None,
        });
        assert_eq!(declared_sources(&video), [(Some("live/".to_string()), None)]);
    }
}
