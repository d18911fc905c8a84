//! Shared fixtures: an in-memory object store whose signed URLs point at a
//! tiny local "bucket" server, plus helpers to run the bridge over TCP.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::ETAG},
    routing::put,
};
use bulk_bridge::{
    models::upload::{CompletedPartInfo, CompletedUpload},
    routes::routes::routes,
    services::{
        object_store::{ObjectStore, StoreError, StoreResult},
        upload_service::UploadService,
    },
};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;

pub const BUCKET: &str = "test-bucket";

#[derive(Clone, Debug)]
pub struct BeginCall {
    pub key: String,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct CompleteCall {
    pub key: String,
    pub upload_id: String,
    pub parts: Vec<CompletedPartInfo>,
}

/// Everything the fake store and the bucket server observed.
#[derive(Default, Debug)]
pub struct StoreState {
    pub begun: Vec<BeginCall>,
    pub signed: Vec<u32>,
    pub completed: Vec<CompleteCall>,
    /// Every PUT the bucket server saw, failed or not.
    pub put_attempts: usize,
    /// part number -> (unquoted ETag, bytes received)
    pub stored_parts: BTreeMap<u32, (String, usize)>,
}

/// Knobs for injecting failures.
#[derive(Default, Clone, Debug)]
pub struct Faults {
    pub fail_begin: bool,
    pub fail_sign_part: Option<u32>,
    /// Bucket answers 500 for this part.
    pub fail_put_part: Option<u32>,
    /// Bucket answers 200 without an ETag header for this part.
    pub omit_etag_part: Option<u32>,
    /// This part's signed URL points at a port nothing listens on.
    pub unreachable_part: Option<u32>,
    pub fail_complete: bool,
}

/// In-memory `ObjectStore`. Signed URLs target the bucket server at
/// `bucket_url`; completion succeeds only for the exact set of stored
/// parts, ascending, with matching ETags.
#[derive(Clone)]
pub struct FakeStore {
    pub upload_id: String,
    pub bucket_url: String,
    pub faults: Faults,
    pub state: Arc<Mutex<StoreState>>,
    pub unreachable_url: Option<String>,
}

impl FakeStore {
    pub fn new(upload_id: &str, bucket_url: &str, state: Arc<Mutex<StoreState>>) -> Self {
        Self {
            upload_id: upload_id.to_string(),
            bucket_url: bucket_url.to_string(),
            faults: Faults::default(),
            state,
            unreachable_url: None,
        }
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn begin_multipart_upload(
        &self,
        _bucket: &str,
        key: &str,
        content_type: &str,
        metadata: &HashMap<String, String>,
    ) -> StoreResult<String> {
        if self.faults.fail_begin {
            return Err(StoreError::Sdk("service unavailable".into()));
        }
        self.state.lock().unwrap().begun.push(BeginCall {
            key: key.to_string(),
            content_type: content_type.to_string(),
            metadata: metadata.clone(),
        });
        Ok(self.upload_id.clone())
    }

    async fn sign_part_upload_url(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        _ttl: Duration,
    ) -> StoreResult<String> {
        if self.faults.fail_sign_part == Some(part_number) {
            return Err(StoreError::Sdk("signing key unavailable".into()));
        }
        self.state.lock().unwrap().signed.push(part_number);
        let base = match (&self.unreachable_url, self.faults.unreachable_part) {
            (Some(dead), Some(n)) if n == part_number => dead,
            _ => &self.bucket_url,
        };
        Ok(format!(
            "{}/{}/{}?uploadId={}&partNumber={}",
            base, bucket, key, upload_id, part_number
        ))
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPartInfo],
    ) -> StoreResult<CompletedUpload> {
        let mut state = self.state.lock().unwrap();
        state.completed.push(CompleteCall {
            key: key.to_string(),
            upload_id: upload_id.to_string(),
            parts: parts.to_vec(),
        });

        if self.faults.fail_complete {
            return Err(StoreError::Rejected("InternalError".into()));
        }
        if upload_id != self.upload_id {
            return Err(StoreError::Rejected("NoSuchUpload".into()));
        }
        if parts.windows(2).any(|w| w[0].part_number >= w[1].part_number) {
            return Err(StoreError::Rejected("InvalidPartOrder".into()));
        }
        let given: Vec<(u32, &str)> = parts
            .iter()
            .map(|p| (p.part_number, p.e_tag.as_str()))
            .collect();
        let stored: Vec<(u32, &str)> = state
            .stored_parts
            .iter()
            .map(|(n, (tag, _))| (*n, tag.as_str()))
            .collect();
        if parts.is_empty() || given != stored {
            return Err(StoreError::Rejected("InvalidPart".into()));
        }

        Ok(CompletedUpload {
            location: Some(format!("{}/{}/{}", self.bucket_url, bucket, key)),
            bucket: Some(bucket.to_string()),
            key: Some(key.to_string()),
            e_tag: Some(format!("\"final-{}\"", parts.len())),
            version_id: None,
        })
    }
}

#[derive(Deserialize)]
struct PartQuery {
    #[serde(rename = "uploadId")]
    _upload_id: String,
    #[serde(rename = "partNumber")]
    part_number: u32,
}

#[derive(Clone)]
struct BucketState {
    faults: Faults,
    state: Arc<Mutex<StoreState>>,
}

async fn put_part(
    State(bucket): State<BucketState>,
    Path((_bucket, _key)): Path<(String, String)>,
    Query(query): Query<PartQuery>,
    body: Bytes,
) -> (StatusCode, HeaderMap) {
    let n = query.part_number;
    bucket.state.lock().unwrap().put_attempts += 1;
    if bucket.faults.fail_put_part == Some(n) {
        return (StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new());
    }

    let tag = format!("e{}", n);
    bucket
        .state
        .lock()
        .unwrap()
        .stored_parts
        .insert(n, (tag.clone(), body.len()));

    let mut headers = HeaderMap::new();
    if bucket.faults.omit_etag_part != Some(n) {
        headers.insert(ETAG, HeaderValue::from_str(&format!("\"{}\"", tag)).unwrap());
    }
    (StatusCode::OK, headers)
}

pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A running bridge plus the bucket server its signed URLs point at.
pub struct Harness {
    pub bridge_url: String,
    pub bucket_url: String,
    pub state: Arc<Mutex<StoreState>>,
}

impl Harness {
    pub async fn start(upload_id: &str, faults: Faults) -> Self {
        let state = Arc::new(Mutex::new(StoreState::default()));

        let bucket_app = Router::new()
            .route("/{bucket}/{*key}", put(put_part))
            .layer(DefaultBodyLimit::disable())
            .with_state(BucketState {
                faults: faults.clone(),
                state: state.clone(),
            });
        let bucket_url = serve(bucket_app).await;

        let mut store = FakeStore::new(upload_id, &bucket_url, state.clone())
            .with_faults(faults);
        store.unreachable_url = Some(closed_port_url().await);
        let service = UploadService::new(Arc::new(store), BUCKET);
        let bridge_url = serve(routes().with_state(service)).await;

        Self {
            bridge_url,
            bucket_url,
            state,
        }
    }

    pub fn completions(&self) -> Vec<CompleteCall> {
        self.state.lock().unwrap().completed.clone()
    }

    pub fn begun(&self) -> Vec<BeginCall> {
        self.state.lock().unwrap().begun.clone()
    }
}

/// Base URL of a local port that was just released, so connecting fails.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// A bridge router backed by a fake store, for `oneshot` tests.
pub fn bridge_router(faults: Faults) -> (Router, Arc<Mutex<StoreState>>) {
    let state = Arc::new(Mutex::new(StoreState::default()));
    let store = FakeStore::new("upload-1", "http://bucket.test", state.clone())
        .with_faults(faults);
    let service = UploadService::new(Arc::new(store), BUCKET);
    (routes().with_state(service), state)
}

/// Deterministic, non-repeating-ish payload so part boundaries matter.
pub fn payload(len: usize) -> Bytes {
    Bytes::from((0..len).map(|i| (i % 251) as u8).collect::<Vec<u8>>())
}
