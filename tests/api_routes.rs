mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use common::{BUCKET, Faults, bridge_router};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn call(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_reports_liveness() {
    let (router, _) = bridge_router(Faults::default());
    let resp = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Bulk Bridge Server is running");
}

#[tokio::test]
async fn healthz_is_json() {
    let (router, _) = bridge_router(Faults::default());
    let (status, body) = call(router, Request::get("/healthz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn initiate_returns_session_envelope() {
    let (router, state) = bridge_router(Faults::default());
    let (status, body) = call(
        router,
        post_json(
            "/api/upload",
            json!({
                "fileName": "my report.pdf",
                "fileType": "application/pdf",
                "fileSize": 12_582_912
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["uploadId"], "upload-1");
    assert_eq!(body["bucket"], BUCKET);
    let key = body["key"].as_str().unwrap();
    assert!(key.starts_with("uploads/"), "{key}");
    assert!(key.ends_with("-my_report.pdf"), "{key}");

    let begun = state.lock().unwrap().begun.clone();
    assert_eq!(begun.len(), 1);
    assert_eq!(begun[0].key, key);
    assert_eq!(begun[0].content_type, "application/pdf");
    assert_eq!(begun[0].metadata["originalFileName"], "my_report.pdf");
    assert_eq!(begun[0].metadata["fileSize"], "12582912");
    assert_eq!(begun[0].metadata["upload-type"], "multipart");
}

#[tokio::test]
async fn initiate_honours_explicit_key() {
    let (router, _) = bridge_router(Faults::default());
    let (status, body) = call(
        router,
        post_json(
            "/api/upload",
            json!({
                "fileName": "file.txt",
                "fileType": "text/plain",
                "fileSize": 3,
                "key": "uploads/2024-01-01/xyz-file.txt"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "uploads/2024-01-01/xyz-file.txt");
}

#[tokio::test]
async fn zero_file_size_is_rejected() {
    let (router, state) = bridge_router(Faults::default());
    let (status, body) = call(
        router,
        post_json(
            "/api/upload",
            json!({"fileName": "empty.bin", "fileType": "application/octet-stream", "fileSize": 0}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request data");
    assert_eq!(body["details"][0]["field"], "fileSize");
    assert!(state.lock().unwrap().begun.is_empty());
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let (router, _) = bridge_router(Faults::default());
    let req = Request::post("/api/upload")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request data");
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn initiate_store_failure_is_a_generic_500() {
    let (router, _) = bridge_router(Faults {
        fail_begin: true,
        ..Faults::default()
    });
    let (status, body) = call(
        router,
        post_json(
            "/api/upload",
            json!({"fileName": "a.bin", "fileType": "application/octet-stream", "fileSize": 10}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(body["message"].as_str().unwrap().starts_with("Failed to"));
}

#[tokio::test]
async fn presign_issues_one_url_per_part() {
    let (router, state) = bridge_router(Faults::default());
    let (status, body) = call(
        router,
        post_json(
            "/api/generate-presigned-url",
            json!({"uploadId": "upload-1", "key": "k/obj.bin", "parts": 3}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let urls = body["url"].as_array().unwrap();
    let mut numbers: Vec<u64> = urls
        .iter()
        .map(|u| u["partNumber"].as_u64().unwrap())
        .collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2, 3]);
    for entry in urls {
        let n = entry["partNumber"].as_u64().unwrap();
        let url = entry["url"].as_str().unwrap();
        assert!(url.contains(&format!("partNumber={n}")), "{url}");
        assert!(url.contains("uploadId=upload-1"), "{url}");
    }
    assert_eq!(state.lock().unwrap().signed.len(), 3);
}

#[tokio::test]
async fn presign_zero_parts_is_rejected() {
    let (router, state) = bridge_router(Faults::default());
    let (status, body) = call(
        router,
        post_json(
            "/api/generate-presigned-url",
            json!({"uploadId": "upload-1", "key": "k", "parts": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "parts");
    assert!(state.lock().unwrap().signed.is_empty());
}

#[tokio::test]
async fn presign_is_all_or_nothing() {
    let (router, _) = bridge_router(Faults {
        fail_sign_part: Some(2),
        ..Faults::default()
    });
    let (status, body) = call(
        router,
        post_json(
            "/api/generate-presigned-url",
            json!({"uploadId": "upload-1", "key": "k", "parts": 3}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate presigned URL");
    assert!(body.get("url").is_none());
}

#[tokio::test]
async fn complete_failure_uses_its_own_label() {
    // Nothing was ever stored, so the fake store rejects any part list.
    let (router, state) = bridge_router(Faults::default());
    let (status, body) = call(
        router,
        post_json(
            "/api/complete-upload",
            json!({"uploadId": "upload-1", "key": "k", "parts": [{"ETag": "e1", "PartNumber": 1}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to complete multipart upload");

    let completed = state.lock().unwrap().completed.clone();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].parts[0].e_tag, "e1");
}

#[tokio::test]
async fn complete_requires_part_fields() {
    let (router, state) = bridge_router(Faults::default());
    let (status, _) = call(
        router,
        post_json(
            "/api/complete-upload",
            json!({"uploadId": "upload-1", "key": "k", "parts": [{"PartNumber": 1}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(state.lock().unwrap().completed.is_empty());
}
