use std::time::Duration;

use semantic::{Embedder, EmbeddingClient, EmbeddingConfig, SemanticError, EMBEDDING_DIM};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> EmbeddingClient {
    let cfg = EmbeddingConfig::default()
        .with_base_url(format!("{}/v1", server.uri()))
        .with_api_key("sk-test")
        .with_timeout(Duration::from_millis(500));
    EmbeddingClient::new(cfg).expect("client")
}

fn embedding_body(len: usize) -> serde_json::Value {
    let values: Vec<f32> = (0..len).map(|i| ((i % 10) as f32) / 10.0).collect();
    json!({
        "object": "list",
        "data": [{ "object": "embedding", "index": 0, "embedding": values }],
        "model": "text-embedding-3-small"
    })
}

#[tokio::test]
async fn embeds_with_pinned_model_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": "will this feeling ever pass?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(EMBEDDING_DIM)))
        .expect(1)
        .mount(&server)
        .await;

    let vector = client_for(&server)
        .embed("will this feeling ever pass?")
        .await
        .unwrap();
    assert_eq!(vector.len(), EMBEDDING_DIM);

    let norm: f32 = vector.as_slice().iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn wrong_dimension_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(embedding_body(384)))
        .mount(&server)
        .await;

    let err = client_for(&server).embed("hello").await.unwrap_err();
    assert_eq!(
        err,
        SemanticError::DimensionMismatch {
            expected: EMBEDDING_DIM,
            actual: 384
        }
    );
}

#[tokio::test]
async fn upstream_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).embed("hello").await.unwrap_err();
    assert!(matches!(err, SemanticError::Http { status: 500, .. }));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(embedding_body(EMBEDDING_DIM))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).embed("hello").await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server).embed("hello").await.unwrap_err();
    assert!(matches!(err, SemanticError::InvalidResponse(_)));
}
