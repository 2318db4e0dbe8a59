// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Per-frame scheduling.

A [FrameScheduler] invokes a callback once, before the next display refresh.  Requests are
one-shot: a callback that wants to run every frame requests itself again.

On the web, [crate::web::AnimationFrameScheduler] maps this to `requestAnimationFrame`.
Native render loops and tests use [ManualScheduler] and tick it themselves.
*/

use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};

/// Receives the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

pub trait FrameScheduler {
    /**
    Runs `callback` before the next display refresh.

    Implementations must not invoke `callback` from inside this call.
    */
    fn request_frame(&self, callback: FrameCallback);
}

/**
A scheduler whose frames are driven by the host.

Callbacks requested while a frame is running are deferred to the next frame.
*/
#[derive(Default)]
pub struct ManualScheduler {
    pending: RefCell<Vec<FrameCallback>>,
    frames: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Number of frames run so far.
    pub fn frames_run(&self) -> u64 {
        self.frames.get()
    }

    /// Runs every callback requested before this call.  Returns how many ran.
    pub fn run_frame(&self, timestamp: f64) -> usize {
        let due = std::mem::take(&mut *self.pending.borrow_mut());
        self.frames.set(self.frames.get() + 1);
        logwise::trace_sync!(
            "ManualScheduler::run_frame {frame}: {due} callbacks",
            frame = self.frames.get(),
            due = due.len()
        );
        let ran = due.len();
        for callback in due {
            callback(timestamp);
        }
        ran
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self, callback: FrameCallback) {
        self.pending.borrow_mut().push(callback);
    }
}

impl Debug for ManualScheduler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .field("frames", &self.frames.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn runs_requests_once() {
        let scheduler = ManualScheduler::new();
        let seen = Rc::new(Cell::new(0.0));
        let s = seen.clone();
        scheduler.request_frame(Box::new(move |t| s.set(t)));
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.run_frame(16.0), 1);
        assert_eq!(seen.get(), 16.0);
        assert_eq!(scheduler.run_frame(32.0), 0);
        assert_eq!(scheduler.frames_run(), 2);
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn rerequest_lands_on_next_frame() {
        let scheduler = Rc::new(ManualScheduler::new());
        let inner = scheduler.clone();
        scheduler.request_frame(Box::new(move |_| {
            inner.request_frame(Box::new(|_| {}));
        }));
        assert_eq!(scheduler.run_frame(0.0), 1);
        assert_eq!(scheduler.pending(), 1);
    }
}
