// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0

/// Errors returned when constructing or driving a [crate::VideoTexture].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("no video resource was supplied")]
    MissingResource,
    #[error("no video sources were supplied")]
    NoSources,
    #[error("the video texture has been destroyed")]
    Destroyed,
}
