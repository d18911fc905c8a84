//! Data models for the multipart upload bridge.
//!
//! Nothing here is persisted: the object store is the only keeper of upload
//! state, so these types describe the JSON exchanged between browser (or
//! upload client) and server.

pub mod upload;
