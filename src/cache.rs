// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Registry of live video textures, keyed by the [IdentityTag] on their resource.

The registry is shared (`Rc<TextureCache>`) and passed to the constructors that use it.
Textures hold only a weak reference back, so dropping the registry does not keep anything
alive, and a destroyed texture removes its own entry.

Several registries may hold textures for the same resource.  The tag stays on the resource
until the last registry holding it lets go, which [is_registered] reports.
*/

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use crate::resource::IdentityTag;
use crate::video_texture::VideoTexture;

thread_local! {
    //number of registries holding an entry under each tag
    static REGISTRATIONS: RefCell<HashMap<IdentityTag, usize>> = RefCell::new(HashMap::new());
}

fn register(tag: IdentityTag) {
    REGISTRATIONS.with(|registrations| {
        *registrations.borrow_mut().entry(tag).or_insert(0) += 1;
    });
}

fn unregister(tag: &IdentityTag) {
    //may run from a registry dropped during thread teardown
    let _ = REGISTRATIONS.try_with(|registrations| {
        let mut registrations = registrations.borrow_mut();
        if let Some(count) = registrations.get_mut(tag) {
            *count -= 1;
            if *count == 0 {
                registrations.remove(tag);
            }
        }
    });
}

/// True while any registry on this thread holds an entry under `tag`.
pub(crate) fn is_registered(tag: &IdentityTag) -> bool {
    REGISTRATIONS.with(|registrations| registrations.borrow().contains_key(tag))
}

#[derive(Default)]
pub struct TextureCache {
    entries: RefCell<HashMap<IdentityTag, VideoTexture>>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: &IdentityTag) -> Option<VideoTexture> {
        self.entries.borrow().get(tag).cloned()
    }

    /// Inserts `texture`, returning any entry it replaced.
    pub fn insert(&self, tag: IdentityTag, texture: VideoTexture) -> Option<VideoTexture> {
        let replaced = self.entries.borrow_mut().insert(tag, texture);
        if replaced.is_none() {
            register(tag);
        }
        replaced
    }

    pub fn remove(&self, tag: &IdentityTag) -> Option<VideoTexture> {
        let removed = self.entries.borrow_mut().remove(tag);
        if removed.is_some() {
            unregister(tag);
        }
        removed
    }

    pub fn contains(&self, tag: &IdentityTag) -> bool {
        self.entries.borrow().contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Drop for TextureCache {
    fn drop(&mut self) {
        for tag in self.entries.get_mut().keys() {
            unregister(tag);
        }
    }
}

impl Debug for TextureCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.borrow();
        f.debug_struct("TextureCache")
            .field("tags", &entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessVideo;
    use crate::scheduler::ManualScheduler;
    use crate::VideoTextureConfig;
    use std::rc::Rc;

    fn texture() -> VideoTexture {
        VideoTexture::new(
            Rc::new(HeadlessVideo::new()),
            Rc::new(ManualScheduler::new()),
            VideoTextureConfig::default(),
        )
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn registrations_follow_entries_across_registries() {
        let tag = IdentityTag::next();
        let first = TextureCache::new();
        let second = TextureCache::new();
        assert!(!is_registered(&tag));

        first.insert(tag, texture());
        //replacing an entry is not a second registration
        first.insert(tag, texture());
        second.insert(tag, texture());
        assert!(is_registered(&tag));

        assert!(first.remove(&tag).is_some());
        assert!(first.remove(&tag).is_none());
        assert!(is_registered(&tag));

        drop(second);
        assert!(!is_registered(&tag));
    }
}
