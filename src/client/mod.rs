//! Upload client: the half of the protocol that runs next to the file.
//!
//! The server only hands out upload ids and signed URLs; this side splits
//! the file, PUTs every part straight to the object store and asks the
//! server to finalize.

pub mod api;
pub mod coordinator;
pub mod error;
pub mod source;
pub mod splitter;
pub mod status;
pub mod uploader;

pub use api::{ApiError, BridgeApi};
pub use coordinator::{FileInfo, SessionCoordinator, UploadOutcome};
pub use error::ClientError;
pub use source::{FileSource, PartSource, PartStream};
pub use splitter::{MAX_PART_SIZE, PartRange, split_parts};
pub use status::{OverallStatus, PartEvent, PartStatus, StatusBoard, UploadSnapshot};
pub use uploader::{PartUploadError, PartUploader};
