//! Frame files on disk: naming, writing, stale cleanup, and the ordered sequence handed to the encoder.

pub mod store;

pub use store::{FrameFormat, FrameSequence, FrameStore};
