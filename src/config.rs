// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Construction options for [crate::VideoTexture].

use crate::base_texture::ScaleMode;

/**
Options for a video texture, built fluently.

```
use video_texture::{ScaleMode, VideoTextureConfig};

let config = VideoTextureConfig::new()
    .with_scale_mode(ScaleMode::Nearest)
    .with_update_fps(30.0);
assert!(config.auto_play());
assert_eq!(config.update_fps(), 30.0);
```
*/
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VideoTextureConfig {
    scale_mode: ScaleMode,
    auto_play: bool,
    update_fps: f64,
}

impl Default for VideoTextureConfig {
    fn default() -> Self {
        VideoTextureConfig {
            scale_mode: ScaleMode::Linear,
            auto_play: true,
            update_fps: 0.0,
        }
    }
}

impl VideoTextureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale_mode(mut self, scale_mode: ScaleMode) -> Self {
        self.scale_mode = scale_mode;
        self
    }

    /// Whether the texture asks the resource to play once it becomes ready.
    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }

    /**
    Caps how often frames are pushed while playing.

    0 (or any non-positive or non-finite value) pushes on every display frame.
    */
    pub fn with_update_fps(mut self, update_fps: f64) -> Self {
        self.update_fps = if update_fps.is_finite() && update_fps > 0.0 {
            update_fps
        } else {
            0.0
        };
        self
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    pub fn update_fps(&self) -> f64 {
        self.update_fps
    }

    /// Minimum milliseconds between pushed frames, if throttled.
    pub(crate) fn frame_interval_ms(&self) -> Option<f64> {
        if self.update_fps > 0.0 {
            Some(1000.0 / self.update_fps)
        } else {
            None
        }
    }
}
