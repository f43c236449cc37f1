#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use stockroom::authz::Role;
use stockroom::config::Config;
use stockroom::db;
use stockroom::infrastructure::AppState;
use stockroom::infrastructure::auth::create_jwt;
use stockroom::server::build_router;
use stockroom::services::auth_service::insert_user;
use tower::util::ServiceExt; // for `oneshot`

pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct Response {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

// Helper to create a test app over an in-memory database
pub async fn setup_app() -> TestApp {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let state = AppState::new(db, &Config::default())
        .await
        .expect("Failed to build state");
    TestApp {
        router: build_router(state.clone(), &[]),
        state,
    }
}

impl TestApp {
    pub fn db(&self) -> &DatabaseConnection {
        self.state.db()
    }

    /// Create a user directly and return (id, access token)
    pub async fn user(&self, username: &str, role: Role) -> (i32, String) {
        let user = insert_user(
            self.db(),
            username,
            &format!("{}@example.com", username),
            PASSWORD,
            role,
        )
        .await
        .expect("Failed to create user");
        let token = create_jwt(&self.state.keys, user.id, &user.username, &user.role)
            .expect("Failed to create token");
        (user.id, token)
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Response {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.request("POST", uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Response {
        self.request("PUT", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.request("DELETE", uri, token, None).await
    }
}

/// Ids of a small catalog: one product with a single variant
pub struct Catalog {
    pub product_id: i32,
    pub variant_id: i32,
    pub color_id: i32,
    pub size_id: i32,
}

pub async fn seed_catalog(app: &TestApp, token: &str, stock: i32) -> Catalog {
    let color = app
        .post(
            "/api/colors",
            Some(token),
            json!({"name": "Black", "hex_code": "#000000"}),
        )
        .await;
    assert_eq!(color.status, StatusCode::CREATED, "{}", color.body);
    let color_id = color.body["color"]["id"].as_i64().unwrap() as i32;

    let size = app
        .post(
            "/api/sizes",
            Some(token),
            json!({"label": "M", "sort_order": 20}),
        )
        .await;
    assert_eq!(size.status, StatusCode::CREATED, "{}", size.body);
    let size_id = size.body["size"]["id"].as_i64().unwrap() as i32;

    let product = app
        .post(
            "/api/products",
            Some(token),
            json!({"name": "Classic Tee", "sku": "TEE-1", "category": "tops", "base_price": 19.99}),
        )
        .await;
    assert_eq!(product.status, StatusCode::CREATED, "{}", product.body);
    let product_id = product.body["product"]["id"].as_i64().unwrap() as i32;

    let variant = app
        .post(
            &format!("/api/products/{}/variants", product_id),
            Some(token),
            json!({"color_id": color_id, "size_id": size_id, "sku": "TEE-1-BLK-M", "stock_quantity": stock}),
        )
        .await;
    assert_eq!(variant.status, StatusCode::CREATED, "{}", variant.body);
    let variant_id = variant.body["variant"]["id"].as_i64().unwrap() as i32;

    Catalog {
        product_id,
        variant_id,
        color_id,
        size_id,
    }
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}
