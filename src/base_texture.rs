// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
CPU-side state shared by every texture kind.

A [BaseTexture] records dimensions, the scale mode, and an update generation.  A renderer
compares the generation against the one it last uploaded and re-uploads when they differ;
the upload itself happens outside this crate.

Operations that notify listeners return a [Notification] instead of emitting directly, so an
owner that keeps the base texture behind a `RefCell` can release its borrow before listeners
run.
*/

use crate::signals::Emitter;

/// Filtering applied when the texture is sampled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ScaleMode {
    #[default]
    Linear,
    Nearest,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureEvent {
    /// The source became ready and dimensions are known.  Delivered at most once.
    Loaded,
    /// New pixel data is available for upload.
    Updated,
    /// The texture was destroyed.  Listeners are removed after this is delivered.
    Disposed,
}

/// An event waiting to be delivered.
#[derive(Debug)]
#[must_use = "a Notification does nothing until dispatched"]
pub struct Notification {
    events: Emitter<TextureEvent>,
    event: TextureEvent,
}

impl Notification {
    pub fn event(&self) -> TextureEvent {
        self.event
    }

    pub fn dispatch(self) {
        self.events.emit(&self.event);
        if self.event == TextureEvent::Disposed {
            self.events.clear();
        }
    }
}

#[derive(Debug)]
pub struct BaseTexture {
    width: u32,
    height: u32,
    scale_mode: ScaleMode,
    update_id: u64,
    destroyed: bool,
    events: Emitter<TextureEvent>,
}

impl BaseTexture {
    pub fn new(scale_mode: ScaleMode) -> Self {
        BaseTexture {
            width: 0,
            height: 0,
            scale_mode,
            update_id: 0,
            destroyed: false,
            events: Emitter::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    pub fn set_scale_mode(&mut self, scale_mode: ScaleMode) {
        self.scale_mode = scale_mode;
    }

    /// Generation of the most recent pushed frame.  0 until the first update.
    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    pub fn events(&self) -> &Emitter<TextureEvent> {
        &self.events
    }

    /// Marks new pixel data.  A destroyed texture ignores updates.
    pub fn update(&mut self) -> Option<Notification> {
        if self.destroyed {
            return None;
        }
        self.update_id += 1;
        Some(self.notification(TextureEvent::Updated))
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Releases the texture.  Returns `None` if it was already destroyed.
    pub fn destroy(&mut self) -> Option<Notification> {
        if self.destroyed {
            return None;
        }
        self.destroyed = true;
        self.width = 0;
        self.height = 0;
        Some(self.notification(TextureEvent::Disposed))
    }

    pub(crate) fn notification(&self, event: TextureEvent) -> Notification {
        Notification {
            events: self.events.clone(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn update_bumps_generation() {
        let mut base = BaseTexture::new(ScaleMode::Nearest);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        base.events().add(move |e| s.borrow_mut().push(*e));

        for _ in 0..2 {
            if let Some(notification) = base.update() {
                notification.dispatch();
            }
        }
        assert_eq!(base.update_id(), 2);
        assert_eq!(*seen.borrow(), [TextureEvent::Updated, TextureEvent::Updated]);
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn destroy_once_then_inert() {
        let mut base = BaseTexture::new(ScaleMode::default());
        base.set_dimensions(640, 360);
        let disposed = Rc::new(RefCell::new(0));
        let d = disposed.clone();
        base.events().add(move |e| {
            if *e == TextureEvent::Disposed {
                *d.borrow_mut() += 1;
            }
        });

        let notification = base.destroy().expect("first destroy");
        assert_eq!(notification.event(), TextureEvent::Disposed);
        notification.dispatch();
        assert!(base.destroy().is_none());
        assert!(base.update().is_none());
        assert_eq!(*disposed.borrow(), 1);
        assert!(base.events().is_empty());
        assert_eq!((base.width(), base.height()), (0, 0));
    }
}
