// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Source descriptors accepted by [crate::VideoTexture::from_sources].

A descriptor is a URL with an optional mime type.  When the mime type is omitted it is
inferred from the URL's file extension as `video/<extension>`.  A URL with nothing to infer
from is declared without a type, and the host sniffs the content.
*/

use crate::resource::SourceDeclaration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceDescriptor {
    url: String,
    mime_type: Option<String>,
}

impl SourceDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        SourceDescriptor {
            url: url.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// The declared mime type, or the one inferred from the URL.
    pub fn resolved_mime_type(&self) -> Option<String> {
        match &self.mime_type {
            Some(mime_type) => Some(mime_type.clone()),
            None => infer_mime_type(&self.url),
        }
    }

    pub(crate) fn declaration(&self) -> SourceDeclaration {
        SourceDeclaration {
            url: self.url.clone(),
            mime_type: self.resolved_mime_type(),
        }
    }
}

impl From<&str> for SourceDescriptor {
    fn from(url: &str) -> Self {
        SourceDescriptor::new(url)
    }
}

impl From<String> for SourceDescriptor {
    fn from(url: String) -> Self {
        SourceDescriptor::new(url)
    }
}

impl<U: Into<String>, M: Into<String>> From<(U, M)> for SourceDescriptor {
    fn from((url, mime_type): (U, M)) -> Self {
        SourceDescriptor::new(url).with_mime_type(mime_type)
    }
}

/**
Infers `video/<extension>` from a URL.

The extension is the text after the last `.` of the final path segment, ignoring any query
string or fragment.  A segment without a `.` is used whole.  Returns `None` when the final
segment or its extension is empty, as in `clips/` or `clip.`.
*/
pub fn infer_mime_type(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let extension = match segment.rfind('.') {
        Some(dot) => &segment[dot + 1..],
        None => segment,
    };
    if extension.is_empty() {
        return None;
    }
    Some(format!("video/{}", extension.to_ascii_lowercase()))
}

/// One or more source descriptors, in preference order.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SourceList(Vec<SourceDescriptor>);

impl SourceList {
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, SourceDescriptor> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a SourceList {
    type Item = &'a SourceDescriptor;
    type IntoIter = std::slice::Iter<'a, SourceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<SourceDescriptor> for SourceList {
    fn from(source: SourceDescriptor) -> Self {
        SourceList(vec![source])
    }
}

impl From<&str> for SourceList {
    fn from(url: &str) -> Self {
        SourceList(vec![url.into()])
    }
}

impl From<String> for SourceList {
    fn from(url: String) -> Self {
        SourceList(vec![url.into()])
    }
}

impl<T: Into<SourceDescriptor>> From<Vec<T>> for SourceList {
    fn from(sources: Vec<T>) -> Self {
        SourceList(sources.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SourceDescriptor>, const N: usize> From<[T; N]> for SourceList {
    fn from(sources: [T; N]) -> Self {
        SourceList(sources.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<SourceDescriptor>> FromIterator<T> for SourceList {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        SourceList(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn infers_from_extension() {
        assert_eq!(infer_mime_type("a.webm").as_deref(), Some("video/webm"));
        assert_eq!(infer_mime_type("clips/intro.MP4").as_deref(), Some("video/mp4"));
        assert_eq!(
            infer_mime_type("https://cdn.example/v1.2/clip.ogv?t=3#frag").as_deref(),
            Some("video/ogv")
        );
        assert_eq!(infer_mime_type("stream").as_deref(), Some("video/stream"));
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn nothing_to_infer_from() {
        assert_eq!(infer_mime_type("https://cdn.example/live/"), None);
        assert_eq!(infer_mime_type("clip."), None);
        assert_eq!(infer_mime_type("clips/?id=4"), None);
        assert_eq!(infer_mime_type(""), None);
        assert_eq!(SourceDescriptor::new("live/").declaration().mime_type, None);
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn explicit_mime_type_wins() {
        let source: SourceDescriptor = ("movie.mkv", "video/x-matroska").into();
        assert_eq!(source.resolved_mime_type().as_deref(), Some("video/x-matroska"));
        assert_eq!(source.declaration().url, "movie.mkv");
    }

    #[test]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn list_conversions_keep_order() {
        let single: SourceList = "a.webm".into();
        assert_eq!(single.len(), 1);

        let many: SourceList = ["a.webm", "a.mp4"].into();
        let urls: Vec<&str> = many.iter().map(SourceDescriptor::url).collect();
        assert_eq!(urls, ["a.webm", "a.mp4"]);

        let mixed: SourceList = vec![
            SourceDescriptor::new("a.webm"),
            SourceDescriptor::new("a.mov").with_mime_type("video/quicktime"),
        ]
        .into();
        assert_eq!(mixed.iter().nth(1).and_then(SourceDescriptor::mime_type), Some("video/quicktime"));

        let empty: SourceList = Vec::<&str>::new().into();
        assert!(empty.is_empty());
    }
}
