// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The host-side collaborators a [crate::VideoTexture] consumes.

A video resource is owned by the host (a DOM `<video>` element on the web, a decoder
session elsewhere).  The texture only observes it: it reads readiness and native
dimensions, listens for four lifecycle signals, asks it to start playback, and stores an
opaque [IdentityTag] on it so the same resource is never wrapped twice.

All methods take `&self`; hosts use interior mutability the way DOM bindings do.
*/

use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::signals::{ListenerId, Subscription};

/**
How much media data the resource has buffered.

The discriminants match the values hosts report for `HTMLMediaElement.readyState`.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u16)]
pub enum ReadyState {
    #[default]
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    /// Converts a host-reported value.  Values past the end of the ladder saturate.
    pub const fn from_raw(raw: u16) -> Self {
        match raw {
            0 => ReadyState::HaveNothing,
            1 => ReadyState::HaveMetadata,
            2 => ReadyState::HaveCurrentData,
            3 => ReadyState::HaveFutureData,
            _ => ReadyState::HaveEnoughData,
        }
    }

    /// True once the host can begin playback without waiting for more data.
    pub const fn can_play(self) -> bool {
        matches!(self, ReadyState::HaveFutureData | ReadyState::HaveEnoughData)
    }
}

/// Lifecycle signals a video resource delivers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MediaSignal {
    /// Enough data to begin playback.
    CanPlay,
    /// Enough data to play to the end without stalling.
    CanPlayThrough,
    /// Playback started.
    Play,
    /// Playback paused.
    Pause,
}

impl MediaSignal {
    pub const ALL: [MediaSignal; 4] = [
        MediaSignal::CanPlay,
        MediaSignal::CanPlayThrough,
        MediaSignal::Play,
        MediaSignal::Pause,
    ];

    /// The event name hosts use for this signal.
    pub const fn event_name(self) -> &'static str {
        match self {
            MediaSignal::CanPlay => "canplay",
            MediaSignal::CanPlayThrough => "canplaythrough",
            MediaSignal::Play => "play",
            MediaSignal::Pause => "pause",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            MediaSignal::CanPlay => 0,
            MediaSignal::CanPlayThrough => 1,
            MediaSignal::Play => 2,
            MediaSignal::Pause => 3,
        }
    }
}

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/**
Opaque marker attached to a resource the first time it is wrapped.

Tags are unique for the life of the process.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IdentityTag(u64);

impl IdentityTag {
    /// Mints a fresh tag.
    pub fn next() -> Self {
        IdentityTag(NEXT_UID.fetch_add(1, Ordering::Relaxed))
    }
    pub const fn from_raw(raw: u64) -> Self {
        IdentityTag(raw)
    }
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for IdentityTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "video_{}", self.0)
    }
}

/// A signal handler registered on a resource.
pub type Listener = Rc<dyn Fn()>;

/**
An external video resource.

The resource owns its own lifetime; a texture holds an `Rc` to it until destroyed.
*/
pub trait VideoResource {
    fn ready_state(&self) -> ReadyState;
    /// Native width in pixels, or 0 while unknown.
    fn video_width(&self) -> u32;
    /// Native height in pixels, or 0 while unknown.
    fn video_height(&self) -> u32;
    /// Asks the host to begin playback.  Failure surfaces only as the absence of a `Play` signal.
    fn play(&self);

    fn add_listener(&self, signal: MediaSignal, listener: Listener) -> ListenerId;
    /// Returns false if `id` was not registered for `signal`.
    fn remove_listener(&self, signal: MediaSignal, id: ListenerId) -> bool;

    fn identity_tag(&self) -> Option<IdentityTag>;
    fn set_identity_tag(&self, tag: Option<IdentityTag>);

    /**
    True when the resource can be treated as ready without waiting for a signal:
    it can begin playback and both native dimensions are known.
    */
    fn is_usable(&self) -> bool {
        self.ready_state().can_play() && self.video_width() > 0 && self.video_height() > 0
    }

    /// True if playback is already underway.  Hosts that cannot tell report false.
    fn is_playing(&self) -> bool {
        false
    }
}

/// A child source declaration on a video element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDeclaration {
    pub url: String,
    /// `None` leaves the type for the host to sniff.
    pub mime_type: Option<String>,
}

/// A video resource created by this crate, which accepts source declarations before loading.
pub trait VideoElement: VideoResource {
    fn append_source(&self, source: SourceDeclaration);
    /// Starts resource selection and loading.
    fn load(&self);
}

/// Creates video elements.
pub trait MediaDocument {
    /// Returns `None` when the host cannot create an element.
    fn create_video_element(&self) -> Option<Rc<dyn VideoElement>>;
}

/// Registers `listener` on `resource` and returns a subscription that removes it.
pub(crate) fn subscribe(
    resource: &Rc<dyn VideoResource>,
    signal: MediaSignal,
    listener: Listener,
) -> Subscription {
    let id = resource.add_listener(signal, listener);
    let resource = resource.clone();
    Subscription::new(move || {
        resource.remove_listener(signal, id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn ready_state_ladder() {
        assert_eq!(ReadyState::from_raw(0), ReadyState::HaveNothing);
        assert_eq!(ReadyState::from_raw(3), ReadyState::HaveFutureData);
        assert_eq!(ReadyState::from_raw(9), ReadyState::HaveEnoughData);
        assert!(!ReadyState::HaveCurrentData.can_play());
        assert!(ReadyState::HaveFutureData.can_play());
        assert!(ReadyState::HaveEnoughData.can_play());
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn tags_are_unique() {
        let a = IdentityTag::next();
        let b = IdentityTag::next();
        assert_ne!(a, b);
        assert_eq!(format!("{}", IdentityTag::from_raw(7)), "video_7");
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn signal_names() {
        let names: Vec<&str> = MediaSignal::ALL.iter().map(|s| s.event_name()).collect();
        assert_eq!(names, ["canplay", "canplaythrough", "play", "pause"]);
        for (i, s) in MediaSignal::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }
}
