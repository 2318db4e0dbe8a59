// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! video_texture turns a playing video resource into a texture a renderer can consume.

The host (a browser, or your own decoder) owns the video.  A [VideoTexture] watches it:

* it waits until the video can play, then adopts the video's native dimensions and emits a
  one-time [TextureEvent::Loaded];
* while the video plays, it pushes a new frame into its [BaseTexture] on every display refresh
  (bumping the update generation a renderer uploads against), and stops when the video pauses;
* through [VideoTexture::from_resource] and a shared [TextureCache], the same video never
  produces two textures.

Everything here is single-threaded and callback-driven.  Nothing blocks; handlers run when the
host delivers a signal or a frame tick.

# Collaborators

| Concern               | Trait              | Browser                          | Elsewhere                     |
|-----------------------|--------------------|----------------------------------|-------------------------------|
| Video resource        | [VideoResource]    | `web::WebVideo`                  | [headless::HeadlessVideo]     |
| Element creation      | [MediaDocument]    | `web::WebDocument`               | [headless::HeadlessDocument]  |
| Per-frame scheduling  | [FrameScheduler]   | `web::AnimationFrameScheduler`   | [ManualScheduler]             |

# Example

```
use std::rc::Rc;
use video_texture::headless::HeadlessDocument;
use video_texture::{ManualScheduler, MediaSignal, ReadyState, TextureCache, TextureHost,
    VideoTexture, VideoTextureConfig};

let scheduler = Rc::new(ManualScheduler::new());
let host = TextureHost::new(Rc::new(TextureCache::new()), scheduler.clone());
let document = HeadlessDocument::new();

let texture = VideoTexture::from_sources(&host, &document, ["intro.webm", "intro.mp4"],
    VideoTextureConfig::default()).unwrap();

//the host finishes buffering and starts playing
let video = document.last_created().unwrap();
video.become_ready(ReadyState::HaveEnoughData, 1920, 1080);
video.deliver(MediaSignal::CanPlay);
video.deliver(MediaSignal::Play);

scheduler.run_frame(16.0);
assert_eq!(texture.width(), 1920);
assert_eq!(texture.update_id(), 1);
```
*/

pub mod base_texture;
mod cache;
mod config;
mod error;
pub mod headless;
mod resource;
mod scheduler;
pub mod signals;
mod sources;
mod video_texture;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use base_texture::{BaseTexture, Notification, ScaleMode, TextureEvent};
pub use cache::TextureCache;
pub use config::VideoTextureConfig;
pub use error::Error;
pub use resource::{
    IdentityTag, Listener, MediaDocument, MediaSignal, ReadyState, SourceDeclaration,
    VideoElement, VideoResource,
};
pub use scheduler::{FrameCallback, FrameScheduler, ManualScheduler};
pub use signals::{Emitter, ListenerId, Subscription};
pub use sources::{SourceDescriptor, SourceList, infer_mime_type};
pub use video_texture::{TextureHost, VideoTexture};
