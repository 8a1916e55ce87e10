mod common;

use std::net::SocketAddr;

use axum::{
    Extension,
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use common::*;
use desa_wisata_backend::routes::with_edge_layers;

#[tokio::test]
async fn test_edge_layers_rate_limit_per_ip() {
    let app = setup().await;
    let client: SocketAddr = "203.0.113.7:40000".parse().unwrap();
    let router = with_edge_layers(app.router).layer(Extension(ConnectInfo(client)));

    // Burst of 100; a few extra requests outrun the 600ms refill
    let mut statuses = Vec::new();
    for _ in 0..105 {
        let request = Request::builder()
            .uri("/api/img")
            .body(Body::empty())
            .unwrap();
        statuses.push(router.clone().oneshot(request).await.unwrap().status());
    }

    assert!(statuses[..100].iter().all(|s| *s == StatusCode::BAD_REQUEST));
    assert!(statuses[100..].contains(&StatusCode::TOO_MANY_REQUESTS));
}
