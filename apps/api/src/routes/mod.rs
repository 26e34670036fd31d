//! # Routes
//!
//! ```text
//! /api/v3
//! ├── GET    /health
//! ├── POST   /pet                        staff
//! ├── GET    /pet/findByStatus           bearer
//! ├── GET    /pet/findByTags             bearer
//! ├── GET    /pet/{petId}                bearer
//! ├── PUT    /pet/{petId}                staff
//! ├── DELETE /pet/{petId}                staff      (engine)
//! ├── GET    /store/inventory            staff
//! ├── POST   /store/order                bearer     (engine)
//! ├── GET    /store/order/{orderId}      owner | staff
//! ├── PUT    /store/order/{orderId}      staff      (engine)
//! ├── DELETE /store/order/{orderId}      owner | staff (engine)
//! ├── POST   /user                       public
//! ├── POST   /user/createWithList        admin
//! ├── GET    /user/login                 public
//! ├── GET    /user/logout                public
//! ├── GET    /user/{username}            self | admin
//! ├── PUT    /user/{username}            self | admin
//! ├── DELETE /user/{username}            admin      (engine)
//! └── GET    /user/{username}/orders     self | staff
//! ```

pub mod pet;
pub mod store;
pub mod user;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::AppState;

/// All API routes, without the `/api/v3` prefix.
pub fn api() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/pet", post(pet::add_pet))
        .route("/pet/findByStatus", get(pet::find_by_status))
        .route("/pet/findByTags", get(pet::find_by_tags))
        .route(
            "/pet/{petId}",
            get(pet::get_pet).put(pet::update_pet).delete(pet::delete_pet),
        )
        .route("/store/inventory", get(store::inventory))
        .route("/store/order", post(store::place_order))
        .route(
            "/store/order/{orderId}",
            get(store::get_order)
                .put(store::update_order)
                .delete(store::cancel_order),
        )
        .route("/user", post(user::register))
        .route("/user/createWithList", post(user::create_with_list))
        .route("/user/login", get(user::login))
        .route("/user/logout", get(user::logout))
        .route(
            "/user/{username}",
            get(user::get_user).put(user::update_user).delete(user::delete_user),
        )
        .route("/user/{username}/orders", get(user::list_orders))
}

/// `GET /health`
async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok", "database": true })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": false })),
        )
    }
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::JwtManager;
    use crate::{router, AppState};
    use petstore_core::{NewUser, Role};
    use petstore_db::{Database, DbConfig};

    struct TestApp {
        app: Router,
        state: AppState,
    }

    impl TestApp {
        async fn new() -> Self {
            let db = Database::new(DbConfig::in_memory()).await.unwrap();
            let state = AppState::new(db, JwtManager::new("test-secret".to_string(), 3600));
            TestApp {
                app: router(state.clone()),
                state,
            }
        }

        /// Creates a user directly in the store and returns a bearer token.
        async fn user(&self, username: &str, role: Role) -> String {
            let user = self
                .state
                .db
                .users()
                .insert(
                    &NewUser {
                        username: username.to_string(),
                        password: "not-used".to_string(),
                        role: Some(role),
                        ..Default::default()
                    },
                    "not-a-phc-hash",
                )
                .await
                .unwrap();
            self.state.jwt.issue(&user).unwrap().0
        }

        async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(format!("/api/v3{uri}"));
            if let Some(token) = token {
                request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
                None => request.body(Body::empty()).unwrap(),
            };

            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn add_pet(&self, token: &str, name: &str) -> i64 {
            let (status, body) = self
                .call(
                    Method::POST,
                    "/pet",
                    Some(token),
                    Some(json!({ "name": name, "category": { "id": 1, "name": "Dogs" }, "tags": [{ "name": "friendly" }] })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            body["id"].as_i64().unwrap()
        }
    }

    #[tokio::test]
    async fn test_health() {
        let t = TestApp::new().await;
        let (status, body) = t.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_authentication_required() {
        let t = TestApp::new().await;

        let (status, body) = t.call(Method::GET, "/pet/1", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");

        let (status, _) = t.call(Method::GET, "/pet/1", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_pet_management_is_staff_only() {
        let t = TestApp::new().await;
        let owner = t.user("owner", Role::StoreOwner).await;
        let alice = t.user("alice", Role::Customer).await;

        let (status, body) = t
            .call(Method::POST, "/pet", Some(&alice), Some(json!({ "name": "Rex" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let pet_id = t.add_pet(&owner, "Rex").await;

        let (status, body) = t.call(Method::GET, &format!("/pet/{pet_id}"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Rex");
        assert_eq!(body["status"], "available");
        assert_eq!(body["category"]["name"], "Dogs");
        assert_eq!(body["photoUrls"], json!([]));

        let (status, body) = t
            .call(
                Method::PUT,
                &format!("/pet/{pet_id}"),
                Some(&owner),
                Some(json!({ "name": "Rex II", "category": null })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Rex II");
        assert!(body["category"].is_null());

        let (status, body) = t.call(Method::GET, "/pet/999", Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PET_NOT_FOUND");

        let (status, body) = t
            .call(Method::PUT, "/pet/999", Some(&owner), Some(json!({ "name": "Ghost" })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "PET_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_pet_status_is_not_writable() {
        let t = TestApp::new().await;
        let owner = t.user("owner", Role::StoreOwner).await;

        let (status, body) = t
            .call(Method::POST, "/pet", Some(&owner), Some(json!({ "name": "Rex", "status": "sold" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let pet_id = t.add_pet(&owner, "Rex").await;
        let (status, _) = t
            .call(Method::PUT, &format!("/pet/{pet_id}"), Some(&owner), Some(json!({ "status": "pending" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_requests_use_envelope() {
        let t = TestApp::new().await;
        let alice = t.user("alice", Role::Customer).await;

        let (status, body) = t
            .call(Method::POST, "/store/order", Some(&alice), Some(json!({ "petId": "one" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = t.call(Method::GET, "/pet/not-a-number", Some(&alice), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = t
            .call(Method::GET, "/pet/findByStatus?status=lost", Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_order_lifecycle_over_http() {
        let t = TestApp::new().await;
        let owner = t.user("owner", Role::StoreOwner).await;
        let alice = t.user("alice", Role::Customer).await;
        let bob = t.user("bob", Role::Customer).await;
        let pet_id = t.add_pet(&owner, "Rex").await;

        let (status, body) = t
            .call(Method::POST, "/store/order", Some(&alice), Some(json!({ "petId": pet_id, "quantity": 2 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_QUANTITY");

        let (status, order) = t
            .call(
                Method::POST,
                "/store/order",
                Some(&alice),
                Some(json!({ "petId": pet_id, "quantity": 1, "shipDate": "2026-11-01T10:00:00Z" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{order}");
        assert_eq!(order["status"], "placed");
        assert_eq!(order["complete"], false);
        let order_id = order["id"].as_i64().unwrap();

        let (status, body) = t
            .call(Method::POST, "/store/order", Some(&bob), Some(json!({ "petId": pet_id })))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "PET_ALREADY_RESERVED");

        let (status, body) = t
            .call(Method::GET, &format!("/store/order/{order_id}"), Some(&bob), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, _) = t
            .call(Method::GET, &format!("/store/order/{order_id}"), Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = t
            .call(
                Method::PUT,
                &format!("/store/order/{order_id}"),
                Some(&alice),
                Some(json!({ "status": "delivered" })),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

        let (status, body) = t
            .call(
                Method::PUT,
                &format!("/store/order/{order_id}"),
                Some(&owner),
                Some(json!({ "status": "delivered", "complete": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "delivered");
        assert_eq!(body["complete"], true);

        let (status, body) = t
            .call(
                Method::PUT,
                &format!("/store/order/{order_id}"),
                Some(&owner),
                Some(json!({ "status": "delivered" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ORDER_TERMINAL");

        let (status, body) = t
            .call(Method::DELETE, &format!("/store/order/{order_id}"), Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "ORDER_NOT_CANCELLABLE");

        let (status, body) = t.call(Method::GET, &format!("/pet/{pet_id}"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "sold");

        let (status, body) = t.call(Method::GET, "/store/inventory", Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "available": 0, "pending": 0, "sold": 1 }));

        let (status, _) = t.call(Method::GET, "/store/inventory", Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = t.call(Method::GET, "/user/alice/orders", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = t.call(Method::GET, "/user/alice/orders", Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // The delivered order keeps alice's account in place.
        let admin = t.user("admin", Role::Admin).await;
        let (status, body) = t.call(Method::DELETE, "/user/alice", Some(&admin), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "HAS_ORDER_HISTORY");

        let (status, body) = t.call(Method::GET, &format!("/pet/{pet_id}"), Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "sold");
    }

    #[tokio::test]
    async fn test_cancel_and_delete_guard() {
        let t = TestApp::new().await;
        let owner = t.user("owner", Role::StoreOwner).await;
        let alice = t.user("alice", Role::Customer).await;
        let pet_id = t.add_pet(&owner, "Rex").await;

        let (_, order) = t
            .call(Method::POST, "/store/order", Some(&alice), Some(json!({ "petId": pet_id })))
            .await;
        let order_id = order["id"].as_i64().unwrap();

        let (status, body) = t.call(Method::DELETE, &format!("/pet/{pet_id}"), Some(&owner), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "HAS_ACTIVE_ORDERS");

        let (status, body) = t
            .call(Method::DELETE, &format!("/store/order/{order_id}"), Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], order_id);

        let (status, body) = t.call(Method::GET, "/pet/findByStatus", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = t
            .call(Method::GET, "/pet/findByStatus?status=available,pending,available", Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = t
            .call(Method::GET, "/pet/findByTags?tags=friendly,unknown", Some(&alice), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], pet_id);

        let (status, _) = t.call(Method::DELETE, &format!("/pet/{pet_id}"), Some(&owner), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_register_login_and_profile() {
        let t = TestApp::new().await;

        let (status, body) = t
            .call(
                Method::POST,
                "/user",
                None,
                Some(json!({
                    "username": "carol",
                    "password": "correct-horse",
                    "email": "carol@example.com",
                    "role": "admin"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["role"], "customer");
        assert!(body.get("password").is_none());

        let (status, body) = t
            .call(
                Method::POST,
                "/user",
                None,
                Some(json!({ "username": "carol", "password": "correct-horse" })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "DUPLICATE");

        let (status, body) = t
            .call(Method::GET, "/user/login?username=carol&password=wrong-horse", None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");

        let (status, body) = t
            .call(Method::GET, "/user/login?username=carol&password=correct-horse", None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = t.call(Method::GET, "/user/carol", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "carol@example.com");

        let (status, body) = t
            .call(Method::PUT, "/user/carol", Some(&token), Some(json!({ "role": "admin" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, body) = t
            .call(
                Method::PUT,
                "/user/carol",
                Some(&token),
                Some(json!({ "firstName": "Carol", "email": null })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["firstName"], "Carol");
        assert!(body["email"].is_null());

        let (status, _) = t.call(Method::GET, "/user/logout", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_user_admin_operations() {
        let t = TestApp::new().await;
        let admin = t.user("admin", Role::Admin).await;
        let owner = t.user("owner", Role::StoreOwner).await;
        let alice = t.user("alice", Role::Customer).await;

        let (status, _) = t.call(Method::GET, "/user/alice", Some(&owner), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = t.call(Method::GET, "/user/alice", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = t
            .call(Method::PUT, "/user/alice", Some(&admin), Some(json!({ "role": "store_owner" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "store_owner");

        // Roles are read from the store on every request.
        let (status, _) = t.call(Method::GET, "/store/inventory", Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = t.call(Method::DELETE, "/user/alice", Some(&owner), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = t.call(Method::DELETE, "/user/alice", Some(&admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = t.call(Method::GET, "/user/alice", Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "USER_NOT_FOUND");

        let (status, _) = t.call(Method::GET, "/pet/findByStatus", Some(&alice), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_with_list() {
        let t = TestApp::new().await;
        let admin = t.user("admin", Role::Admin).await;
        let owner = t.user("owner", Role::StoreOwner).await;

        let items = json!([
            { "username": "dave", "password": "password-1" },
            { "username": "owner", "password": "password-2" },
            { "username": "x", "password": "password-3" }
        ]);

        let (status, _) = t
            .call(Method::POST, "/user/createWithList", Some(&owner), Some(items.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = t
            .call(Method::POST, "/user/createWithList", Some(&admin), Some(items))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let outcomes = body.as_array().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0]["outcome"], "created");
        assert_eq!(outcomes[0]["user"]["username"], "dave");
        assert_eq!(outcomes[1]["outcome"], "duplicate");
        assert_eq!(outcomes[2]["outcome"], "invalid");
    }
}
