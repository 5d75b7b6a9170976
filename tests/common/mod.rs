#![allow(dead_code)]

use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;

use hotel_api::{config::Config, AppState};

/// A running server on an ephemeral port. The client directory points back
/// at the server's own `/clients`, so bookings enrich from real rows.
pub struct TestApp {
    pub base: String,
    pub http: reqwest::Client,
    pub pool: PgPool,
}

/// `None` when no database is configured; callers return early.
pub async fn spawn_app() -> Option<TestApp> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database-backed test");
        return None;
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    let config = Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some(database_url.clone()),
        "CLIENTS_API_URL" => Some(format!("http://{addr}/clients")),
        "DB_POOL_SIZE" => Some("20".to_string()),
        "RUST_LOG" => Some("hotel_api=warn".to_string()),
        _ => None,
    })
    .expect("test config");

    let state = AppState::new(config).await.expect("app state");
    let pool = state.db.pool.clone();

    tokio::spawn(async move {
        axum::serve(listener, hotel_api::app(state))
            .await
            .expect("test server");
    });

    Some(TestApp {
        base: format!("http://{addr}"),
        http: reqwest::Client::new(),
        pool,
    })
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.http.get(self.url(path)).send().await.expect("GET")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.http.post(self.url(path)).json(body).send().await.expect("POST")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.http.put(self.url(path)).json(body).send().await.expect("PUT")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.http.delete(self.url(path)).send().await.expect("DELETE")
    }

    pub async fn create_client(&self) -> Value {
        let name: String = Name().fake();
        let email: String = SafeEmail().fake();
        let res = self
            .post("/clients", &json!({ "full_name": name, "email": email, "phone": "+1 555 0100" }))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.expect("client json")
    }

    pub async fn create_room(&self) -> Value {
        let number = format!("T-{}", uuid::Uuid::new_v4().simple());
        let res = self
            .post(
                "/rooms",
                &json!({ "number": number, "type": "double", "capacity": 2, "price_per_night": "99.90" }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.expect("room json")
    }

    pub async fn book(&self, client_id: i64, room_id: i64, start: &str, end: &str) -> Response {
        self.post(
            "/bookings",
            &json!({ "client_id": client_id, "room_id": room_id, "start_date": start, "end_date": end }),
        )
        .await
    }

    pub async fn bookings_for_room(&self, room_id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE room_id = $1")
            .bind(room_id)
            .fetch_one(&self.pool)
            .await
            .expect("count bookings")
    }
}

pub fn id(v: &Value) -> i64 {
    v["id"].as_i64().expect("id field")
}
