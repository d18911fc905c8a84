//! Multipart upload bridge.
//!
//! The server half orchestrates an object store's three-phase multipart
//! protocol (initiate, presign per part, complete) without ever touching
//! file bytes. The client half splits a file, uploads each part directly to
//! its signed URL and asks the server to commit the result.

pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
