//! Encrypt-and-send flow.
//!
//! Each upload reads the settings, seals the payload for the recipient,
//! wraps it in an [`UploadRequest`](sealdrop_types::UploadRequest) and makes a
//! single POST to the target URL. Nothing is cached between calls.

pub mod client;
pub mod request;

pub use client::UploadClient;
pub use request::{audio_plaintext, build_request, iso_timestamp};
