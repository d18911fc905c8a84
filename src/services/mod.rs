pub mod object_store;
pub mod upload_service;
