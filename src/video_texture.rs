// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
A texture backed by a playing video resource.

# Readiness

A [VideoTexture] starts out waiting for its resource.  If the resource can already play and
reports non-zero dimensions, the texture is ready immediately.  Otherwise it listens for
`canplay` and `canplaythrough`; whichever arrives first runs [VideoTexture::on_can_play],
which detaches both listeners, copies the native dimensions, asks the resource to play and
emits [TextureEvent::Loaded] exactly once.

# Refresh loop

While the resource plays, the texture requests a frame callback from its [FrameScheduler]
every display refresh and pushes the current frame into its [BaseTexture].  Pausing clears
`auto_update`; the next tick observes the flag and does not reschedule.  No cancellation
handle is kept.

Signals can arrive in any order.  A `play` that precedes any readiness signal forces the
readiness transition first.

# Sharing

[VideoTexture] is a cheap handle; clones refer to the same texture.  Use
[VideoTexture::from_resource] with a [TextureCache] to guarantee one texture per resource.
*/

use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

use crate::base_texture::{BaseTexture, ScaleMode, TextureEvent};
use crate::cache::TextureCache;
use crate::config::VideoTextureConfig;
use crate::error::Error;
use crate::resource::{self, IdentityTag, Listener, MediaDocument, MediaSignal, VideoResource};
use crate::scheduler::FrameScheduler;
use crate::signals::Subscription;
use crate::sources::SourceList;

/**
The shared collaborators texture constructors need: the registry and the frame scheduler.
*/
#[derive(Clone)]
pub struct TextureHost {
    cache: Rc<TextureCache>,
    scheduler: Rc<dyn FrameScheduler>,
}

impl TextureHost {
    pub fn new(cache: Rc<TextureCache>, scheduler: Rc<dyn FrameScheduler>) -> Self {
        TextureHost { cache, scheduler }
    }
    pub fn cache(&self) -> &Rc<TextureCache> {
        &self.cache
    }
    pub fn scheduler(&self) -> &Rc<dyn FrameScheduler> {
        &self.scheduler
    }
}

impl Debug for TextureHost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureHost")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

struct Inner {
    //None once destroyed
    resource: Option<Rc<dyn VideoResource>>,
    base: BaseTexture,
    config: VideoTextureConfig,
    scheduler: Rc<dyn FrameScheduler>,
    //set when registered through from_resource
    cache: Option<Weak<TextureCache>>,
    auto_update: bool,
    has_loaded: bool,
    loaded_dispatched: bool,
    //a frame callback is queued and has not run yet
    frame_pending: bool,
    last_pushed_at: Option<f64>,
    readiness: Vec<Subscription>,
    playback: Vec<Subscription>,
}

impl Inner {
    fn should_push(&self, timestamp: f64) -> bool {
        match (self.config.frame_interval_ms(), self.last_pushed_at) {
            (Some(interval), Some(last)) => timestamp - last >= interval,
            _ => true,
        }
    }
}

#[derive(Clone)]
pub struct VideoTexture {
    inner: Rc<RefCell<Inner>>,
}

impl VideoTexture {
    /**
    Wraps `resource` without consulting any cache.

    Play/pause listeners are always registered.  Readiness listeners are registered only if the
    resource is not usable yet; a usable resource runs the readiness transition before this
    returns, so check [VideoTexture::has_loaded] before waiting on [VideoTexture::on_loaded].

    A resource that is already playing never delivers another `Play`, so the readiness
    transition starts the refresh loop itself when [VideoResource::is_playing] reports true.
    Resources that do not implement `is_playing` wait for their next `Play`.
    */
    pub fn new(
        resource: Rc<dyn VideoResource>,
        scheduler: Rc<dyn FrameScheduler>,
        config: VideoTextureConfig,
    ) -> Self {
        let mut base = BaseTexture::new(config.scale_mode());
        base.set_dimensions(resource.video_width(), resource.video_height());
        let usable = resource.is_usable();
        let texture = VideoTexture {
            inner: Rc::new(RefCell::new(Inner {
                resource: Some(resource.clone()),
                base,
                config,
                scheduler,
                cache: None,
                auto_update: false,
                has_loaded: false,
                loaded_dispatched: false,
                frame_pending: false,
                last_pushed_at: None,
                readiness: Vec::new(),
                playback: Vec::new(),
            })),
        };

        let playback = vec![
            texture.listen(&resource, MediaSignal::Play, VideoTexture::on_play_start),
            texture.listen(&resource, MediaSignal::Pause, VideoTexture::on_play_stop),
        ];
        texture.inner.borrow_mut().playback = playback;

        logwise::info_sync!(
            "VideoTexture::new tag={tag} usable={usable}",
            tag = logwise::privacy::LogIt(&resource.identity_tag()),
            usable = logwise::privacy::LogIt(&usable)
        );
        if usable {
            texture.on_can_play();
        } else {
            let readiness = vec![
                texture.listen(&resource, MediaSignal::CanPlay, VideoTexture::on_can_play),
                texture.listen(&resource, MediaSignal::CanPlayThrough, VideoTexture::on_can_play),
            ];
            texture.inner.borrow_mut().readiness = readiness;
        }
        texture
    }

    /**
    Returns the texture for `resource`, creating and caching one if needed.

    The resource is tagged on first use.  On a cache hit `config` is ignored and the existing
    texture is returned unchanged.
    */
    pub fn from_resource(
        host: &TextureHost,
        resource: Rc<dyn VideoResource>,
        config: VideoTextureConfig,
    ) -> Self {
        let tag = match resource.identity_tag() {
            Some(tag) => tag,
            None => {
                let tag = IdentityTag::next();
                resource.set_identity_tag(Some(tag));
                tag
            }
        };
        if let Some(existing) = host.cache.get(&tag) {
            logwise::trace_sync!(
                "VideoTexture::from_resource cache hit {tag}",
                tag = logwise::privacy::LogIt(&tag)
            );
            return existing;
        }
        let texture = VideoTexture::new(resource, host.scheduler.clone(), config);
        texture.inner.borrow_mut().cache = Some(Rc::downgrade(&host.cache));
        host.cache.insert(tag, texture.clone());
        texture
    }

    /**
    Creates a new video element from `sources` and wraps it.

    One source declaration is appended per descriptor, in order.  The element is loaded and,
    unless `config` disables auto-play, asked to play.  A fresh element is created on every
    call, so this never returns an existing texture.
    */
    pub fn from_sources(
        host: &TextureHost,
        document: &dyn MediaDocument,
        sources: impl Into<SourceList>,
        config: VideoTextureConfig,
    ) -> Result<Self, Error> {
        let sources = sources.into();
        if sources.is_empty() {
            return Err(Error::NoSources);
        }
        let element = document
            .create_video_element()
            .ok_or(Error::MissingResource)?;
        for source in &sources {
            element.append_source(source.declaration());
        }
        element.load();
        if config.auto_play() {
            element.play();
        }
        let resource: Rc<dyn VideoResource> = element;
        Ok(Self::from_resource(host, resource, config))
    }

    fn listen(
        &self,
        resource: &Rc<dyn VideoResource>,
        signal: MediaSignal,
        handler: fn(&VideoTexture),
    ) -> Subscription {
        let weak = Rc::downgrade(&self.inner);
        let listener: Listener = Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                handler(&VideoTexture { inner });
            }
        });
        resource::subscribe(resource, signal, listener)
    }

    /**
    Readiness transition.  Safe to call any number of times, before or after playback starts.

    Emits [TextureEvent::Loaded] on the first call that finds the resource present.
    */
    pub fn on_can_play(&self) {
        let (resource, readiness, auto_play) = {
            let mut inner = self.inner.borrow_mut();
            inner.has_loaded = true;
            let Some(resource) = inner.resource.clone() else {
                logwise::trace_sync!("VideoTexture::on_can_play after destroy; ignoring");
                return;
            };
            (
                resource,
                std::mem::take(&mut inner.readiness),
                inner.config.auto_play(),
            )
        };
        for subscription in readiness {
            subscription.unsubscribe();
        }

        let (width, height) = (resource.video_width(), resource.video_height());
        if width == 0 || height == 0 {
            logwise::warn_sync!(
                "VideoTexture ready with empty dimensions {width}x{height}",
                width = width,
                height = height
            );
        }
        self.inner.borrow_mut().base.set_dimensions(width, height);

        if auto_play {
            resource.play();
        }

        let loaded = {
            let mut inner = self.inner.borrow_mut();
            if inner.loaded_dispatched {
                None
            } else {
                inner.loaded_dispatched = true;
                Some(inner.base.notification(TextureEvent::Loaded))
            }
        };
        if let Some(loaded) = loaded {
            logwise::info_sync!(
                "VideoTexture loaded {width}x{height}",
                width = width,
                height = height
            );
            loaded.dispatch();
        }

        //a resource that is already playing will not signal Play again
        if resource.is_playing() && !self.is_destroyed() {
            self.start_refresh();
        }
    }

    /// Playback started.  Forces readiness if no readiness signal has arrived, then starts the refresh loop.
    pub fn on_play_start(&self) {
        if !self.has_loaded() {
            self.on_can_play();
        }
        if self.inner.borrow().resource.is_none() {
            return;
        }
        self.start_refresh();
    }

    /// Playback paused.  The refresh loop stops at its next tick.
    pub fn on_play_stop(&self) {
        logwise::trace_sync!("VideoTexture::on_play_stop");
        self.inner.borrow_mut().auto_update = false;
    }

    /**
    Turns the refresh loop on or off directly.

    Turning it on behaves like a play-start without the readiness check.
    */
    pub fn set_auto_update(&self, auto_update: bool) -> Result<(), Error> {
        if !auto_update {
            self.on_play_stop();
            return Ok(());
        }
        if self.is_destroyed() {
            return Err(Error::Destroyed);
        }
        self.start_refresh();
        Ok(())
    }

    fn start_refresh(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.auto_update {
                return;
            }
            inner.auto_update = true;
            inner.last_pushed_at = None;
        }
        logwise::trace_sync!("VideoTexture refresh loop started");
        self.schedule_frame();
    }

    fn schedule_frame(&self) {
        let scheduler = {
            let mut inner = self.inner.borrow_mut();
            //the queued tick will see auto_update and keep the loop going
            if inner.frame_pending {
                return;
            }
            inner.frame_pending = true;
            inner.scheduler.clone()
        };
        let weak = Rc::downgrade(&self.inner);
        scheduler.request_frame(Box::new(move |timestamp| {
            if let Some(inner) = weak.upgrade() {
                VideoTexture { inner }.on_update(timestamp);
            }
        }));
    }

    fn on_update(&self, timestamp: f64) {
        let pushed = {
            let mut inner = self.inner.borrow_mut();
            inner.frame_pending = false;
            if !inner.auto_update {
                None
            } else if inner.should_push(timestamp) {
                inner.last_pushed_at = Some(timestamp);
                Some(inner.base.update())
            } else {
                Some(None)
            }
        };
        let Some(pushed) = pushed else {
            logwise::trace_sync!("VideoTexture refresh loop stopped");
            return;
        };
        self.schedule_frame();
        if let Some(notification) = pushed {
            notification.dispatch();
        }
    }

    /**
    Releases the texture.

    For a texture obtained from [VideoTexture::from_resource], removes its cache entry and clears
    the identity tag from the resource.  Then stops the refresh loop, detaches every resource
    listener and destroys the base texture.  Idempotent.
    */
    pub fn destroy(&self) {
        let (resource, subscriptions, cache, disposed) = {
            let mut inner = self.inner.borrow_mut();
            let Some(disposed) = inner.base.destroy() else {
                return;
            };
            inner.auto_update = false;
            let mut subscriptions = std::mem::take(&mut inner.readiness);
            subscriptions.append(&mut inner.playback);
            (inner.resource.take(), subscriptions, inner.cache.clone(), disposed)
        };
        drop(subscriptions);

        if let (Some(resource), Some(cache)) = (resource, cache)
            && let Some(tag) = resource.identity_tag()
        {
            self.release_tag(&resource, tag, cache.upgrade().as_deref());
        }
        logwise::info_sync!("VideoTexture destroyed");
        disposed.dispatch();
    }

    fn release_tag(
        &self,
        resource: &Rc<dyn VideoResource>,
        tag: IdentityTag,
        cache: Option<&TextureCache>,
    ) {
        //another texture may have been registered for this resource since
        let owned = match cache.and_then(|cache| cache.get(&tag)) {
            Some(cached) => cached.ptr_eq(self),
            None => true,
        };
        if !owned {
            return;
        }
        if let Some(cache) = cache {
            cache.remove(&tag);
        }
        //textures in other registries still find the resource by this tag
        if crate::cache::is_registered(&tag) {
            logwise::trace_sync!(
                "VideoTexture keeps tag {tag}; still registered elsewhere",
                tag = logwise::privacy::LogIt(&tag)
            );
            return;
        }
        resource.set_identity_tag(None);
    }

    /// Calls `listener` when the texture becomes ready.  Never fires if it already has.
    pub fn on_loaded<F: Fn(&VideoTexture) + 'static>(&self, listener: F) -> Subscription {
        self.subscribe(move |texture, event| {
            if event == TextureEvent::Loaded {
                listener(texture);
            }
        })
    }

    /// Calls `listener` for every [TextureEvent] on this texture.
    pub fn subscribe<F: Fn(&VideoTexture, TextureEvent) + 'static>(&self, listener: F) -> Subscription {
        let weak = Rc::downgrade(&self.inner);
        let events = self.inner.borrow().base.events().clone();
        events.subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                listener(&VideoTexture { inner }, *event);
            }
        })
    }

    pub fn has_loaded(&self) -> bool {
        self.inner.borrow().has_loaded
    }

    pub fn auto_update(&self) -> bool {
        self.inner.borrow().auto_update
    }

    pub fn width(&self) -> u32 {
        self.inner.borrow().base.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.borrow().base.height()
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.inner.borrow().base.scale_mode()
    }

    pub fn set_scale_mode(&self, scale_mode: ScaleMode) {
        self.inner.borrow_mut().base.set_scale_mode(scale_mode);
    }

    /// Generation of the most recently pushed frame.
    pub fn update_id(&self) -> u64 {
        self.inner.borrow().base.update_id()
    }

    pub fn config(&self) -> VideoTextureConfig {
        self.inner.borrow().config
    }

    /// The wrapped resource, or `None` once destroyed.
    pub fn resource(&self) -> Option<Rc<dyn VideoResource>> {
        self.inner.borrow().resource.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().base.is_destroyed()
    }

    /// True if both handles refer to the same texture.
    pub fn ptr_eq(&self, other: &VideoTexture) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Debug for VideoTexture {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("VideoTexture")
                .field("width", &inner.base.width())
                .field("height", &inner.base.height())
                .field("has_loaded", &inner.has_loaded)
                .field("auto_update", &inner.auto_update)
                .field("destroyed", &inner.base.is_destroyed())
                .finish(),
            Err(_) => f.write_str("VideoTexture { <borrowed> }"),
        }
    }
}
