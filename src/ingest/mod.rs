//! Receiving side of the upload protocol.
//!
//! Accepts upload requests over HTTP, checks the shared secret and stores the
//! still-encrypted body on disk. Decryption happens later and elsewhere, with
//! [`crate::crypto::open_upload`].

pub mod routes;

pub use routes::{ingest_router, IngestError, IngestState};
