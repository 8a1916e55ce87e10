#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use serde_json::{json, Value};
use tower::ServiceExt;

use desa_wisata_backend::{
    config::{Config, DEFAULT_AVATAR, DEFAULT_UPLOAD_MAX_BYTES},
    entities::{
        payment_available::{self, PaymentMethodType},
        role::RoleKey,
        tour,
    },
    routes,
    utils::jwt::Claims,
    AppState,
};

pub const JWT_SECRET: &str = "test-secret";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

/// Router over a fresh in-memory SQLite database with every migration applied
pub async fn setup() -> TestApp {
    // One connection: each in-memory connection is its own database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        default_avatar: DEFAULT_AVATAR.to_string(),
    };

    let router = routes::create_router(AppState {
        db: db.clone(),
        config,
    });

    TestApp { router, db }
}

pub async fn seed_tour(db: &DatabaseConnection, slug: &str, price: i64) -> tour::Model {
    tour::ActiveModel {
        title: Set(format!("Tour {}", slug)),
        slug: Set(slug.to_string()),
        price: Set(price),
        duration_days: Set(3),
        active: Set(true),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed tour")
}

pub async fn seed_payment_method(
    db: &DatabaseConnection,
    name: &str,
    method_type: PaymentMethodType,
    active: bool,
) -> payment_available::Model {
    let now = Utc::now();
    payment_available::ActiveModel {
        name: Set(name.to_string()),
        account_number: Set("1234567890".to_string()),
        account_holder: Set("Desa Wisata Sukamaju".to_string()),
        image: Set(None),
        description: Set(Some(format!("Transfer via {}", name))),
        method_type: Set(method_type),
        active: Set(active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to seed payment method")
}

/// Token as the external credential provider would sign it
pub fn token_for(user_id: i32, email: &str, role: RoleKey) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}

pub fn admin_token() -> String {
    token_for(1, "admin@desawisata.id", RoleKey::Admin)
}

/// Customer who owns `booking_payload` bookings
pub fn customer_token() -> String {
    token_for(2, "siti@example.com", RoleKey::Customer)
}

/// The booking from the reference scenario, for the given tour
pub fn booking_payload(tour_id: i32) -> Value {
    json!({
        "tourId": tour_id,
        "firstName": "Siti",
        "lastName": "Aminah",
        "gender": "female",
        "birthYear": 1995,
        "birthMonth": 6,
        "birthDay": 12,
        "nationality": "Indonesia",
        "email": "siti@example.com",
        "phoneCode": "+62",
        "phoneNumber": "81234567890",
        "adults": 2,
        "children": 1,
        "startDate": "02 Jun 2026",
        "endDate": "05 Jun 2026",
        "findUs": "Instagram",
        "totalPrice": 3000000
    })
}

pub async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is not JSON")
    };
    (status, body)
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

pub async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(router, Method::POST, uri, Some(body), None).await
}

pub async fn create_booking(router: &Router, payload: Value) -> i32 {
    let (status, body) = post_json(router, "/api/bookings", payload).await;
    assert_eq!(status, StatusCode::CREATED, "booking failed: {}", body);
    body["data"]["id"].as_i64().unwrap() as i32
}

pub async fn create_payment(router: &Router, booking_id: i32, method_id: i32, amount: i64) -> Value {
    let (status, body) = post_json(
        router,
        "/api/bookings/create-payment",
        json!({ "bookingId": booking_id, "paymentAvailableId": method_id, "amount": amount }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create-payment failed: {}", body);
    body["data"].clone()
}

pub const BOUNDARY: &str = "desa-wisata-boundary";

pub fn multipart_body(filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn upload(
    router: &Router,
    uri: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder
        .body(Body::from(multipart_body(filename, content_type, data)))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    read_json(response).await
}
