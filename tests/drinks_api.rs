//! End-to-end tests for the drinks API
//!
//! Drives the full router with a file store in a temp directory and a
//! verifier holding a transient RSA public key, so requests exercise the
//! real token verification and authorization path.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tower::ServiceExt;

use brewstand::auth::TokenVerifier;
use brewstand::storage::{DrinkStore, FileStore};
use brewstand::web::{router, AppState};
use brewstand::{Ingredient, NewDrink};

const AUDIENCE: &str = "drinks";
const ISSUER: &str = "https://brewstand.test/";

/// Transient RSA keypair (private PEM, public PEM), generated once.
fn keys() -> &'static (String, String) {
    static KEYS: OnceLock<(String, String)> = OnceLock::new();
    KEYS.get_or_init(|| {
        use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};

        let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048)
            .expect("failed to generate test key");
        let private_pem = private
            .to_pkcs8_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap()
            .to_string();
        let public_pem = private
            .to_public_key()
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();
        (private_pem, public_pem)
    })
}

fn sign(claims: Value) -> String {
    let (private_pem, _) = keys();
    encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap(),
    )
    .unwrap()
}

fn now_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

/// A token carrying the given permissions, valid for an hour.
fn token(permissions: &[&str]) -> String {
    sign(json!({
        "sub": "auth0|barista",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": now_secs() + 3600,
        "permissions": permissions,
    }))
}

struct TestApp {
    app: Router,
    store: Arc<dyn DrinkStore>,
    _dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn DrinkStore> = Arc::new(
            FileStore::open(dir.path().join("drinks.json"))
                .await
                .unwrap(),
        );

        let (_, public_pem) = keys();
        let verifier =
            TokenVerifier::with_static_key(public_pem.as_bytes(), AUDIENCE, ISSUER).unwrap();

        let app = router(AppState {
            store: store.clone(),
            verifier: Arc::new(verifier),
        });

        Self {
            app,
            store,
            _dir: dir,
        }
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn insert(&self, title: &str, recipe: Vec<Ingredient>) -> i64 {
        self.store
            .insert(NewDrink {
                title: title.to_string(),
                recipe,
            })
            .await
            .unwrap()
            .id
    }
}

fn part(name: &str, color: &str, parts: i64) -> Ingredient {
    Ingredient {
        name: name.to_string(),
        color: color.to_string(),
        parts,
    }
}

#[tokio::test]
async fn public_listing_uses_short_views() {
    let app = TestApp::new().await;
    app.insert(
        "secret spritz",
        vec![part("soda", "clear", 3), part("house bitters", "red", -1)],
    )
    .await;

    let (status, body) = app.request("GET", "/drinks", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let recipe = body["drinks"][0]["recipe"].as_array().unwrap();
    for entry in recipe {
        assert!(entry.get("name").is_none(), "short view must withhold names");
    }
    assert_eq!(recipe[0]["parts"], json!(3));
    assert_eq!(recipe[1]["parts"], Value::Null, "hidden parts must be masked");
}

#[tokio::test]
async fn create_then_detail_round_trip() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/drinks",
            Some(&token(&["post:drinks"])),
            Some(json!({
                "title": "chocolate milk",
                "recipe": [
                    {"name": "coffee", "color": "brown", "parts": 1},
                    {"name": "milk", "color": "cream", "parts": 3},
                    {"name": "foam", "color": "white", "parts": 1},
                ],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["drinks"]["title"], json!("chocolate milk"));

    let (status, body) = app
        .request(
            "GET",
            "/drinks-detail",
            Some(&token(&["get:drinks-detail"])),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let recipe = body["drinks"][0]["recipe"].as_array().unwrap();
    assert_eq!(recipe.len(), 3);
    for entry in recipe {
        assert!(entry.get("name").is_some());
        assert!(entry.get("color").is_some());
        assert!(entry.get("parts").is_some());
    }
}

#[tokio::test]
async fn patch_with_empty_title_is_400_regardless_of_id() {
    let app = TestApp::new().await;
    let id = app.insert("cold brew", vec![part("coffee", "black", 1)]).await;
    let bearer = token(&["patch:drinks"]);

    let (status, body) = app
        .request(
            "PATCH",
            &format!("/drinks/{id}"),
            Some(&bearer),
            Some(json!({"title": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!(400));

    let (status, _) = app
        .request(
            "PATCH",
            "/drinks/9999999",
            Some(&bearer),
            Some(json!({"title": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_missing_drink_is_404() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "PATCH",
            "/drinks/9999999",
            Some(&token(&["patch:drinks"])),
            Some(json!({"title": "renamed"})),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!(404));
    assert_eq!(body["message"], json!("resource not found"));
}

#[tokio::test]
async fn patch_updates_title_and_returns_single_element_array() {
    let app = TestApp::new().await;
    let id = app.insert("flat white", vec![part("milk", "white", 2)]).await;

    let (status, body) = app
        .request(
            "PATCH",
            &format!("/drinks/{id}"),
            Some(&token(&["patch:drinks"])),
            Some(json!({"title": "flat black"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let drinks = body["drinks"].as_array().unwrap();
    assert_eq!(drinks.len(), 1);
    assert_eq!(drinks[0]["title"], json!("flat black"));
    // recipe is immutable after creation
    assert_eq!(drinks[0]["recipe"][0]["name"], json!("milk"));
}

#[tokio::test]
async fn missing_authorization_header_is_401() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/drinks-detail", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!(401));
    assert_eq!(body["message"], json!("authorization header missing"));
}

#[tokio::test]
async fn malformed_authorization_header_is_401() {
    let app = TestApp::new().await;

    let request = Request::builder()
        .method("GET")
        .uri("/drinks-detail")
        .header(header::AUTHORIZATION, "Token abc def")
        .body(Body::empty())
        .unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], json!("malformed header"));
}

#[tokio::test]
async fn missing_permission_is_403() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/drinks",
            Some(&token(&["get:drinks-detail"])),
            Some(json!({"title": "espresso", "recipe": []})),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!(403));
    assert_eq!(body["message"], json!("Permission not found"));
}

#[tokio::test]
async fn expired_token_is_401() {
    let app = TestApp::new().await;
    let expired = sign(json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": now_secs() - 3600,
        "permissions": ["get:drinks-detail"],
    }));

    let (status, body) = app
        .request("GET", "/drinks-detail", Some(&expired), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("token is expired"));
}

#[tokio::test]
async fn wrong_audience_is_401() {
    let app = TestApp::new().await;
    let wrong = sign(json!({
        "iss": ISSUER,
        "aud": "someone-else",
        "exp": now_secs() + 3600,
        "permissions": ["get:drinks-detail"],
    }));

    let (status, body) = app
        .request("GET", "/drinks-detail", Some(&wrong), None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["message"],
        json!("incorrect claims, please check the audience and issuer")
    );
}

#[tokio::test]
async fn token_without_permissions_claim_is_400() {
    let app = TestApp::new().await;
    let bare = sign(json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "exp": now_secs() + 3600,
    }));

    let (status, body) = app
        .request("GET", "/drinks-detail", Some(&bare), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("permissions not included in JWT"));
}

#[tokio::test]
async fn create_with_malformed_body_is_422() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/drinks",
            Some(&token(&["post:drinks"])),
            Some(json!({"recipe": "not even close"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], json!(422));
}

#[tokio::test]
async fn create_with_duplicate_title_is_422() {
    let app = TestApp::new().await;
    app.insert("macchiato", vec![part("espresso", "brown", 1)]).await;

    let (status, _) = app
        .request(
            "POST",
            "/drinks",
            Some(&token(&["post:drinks"])),
            Some(json!({
                "title": "macchiato",
                "recipe": [{"name": "espresso", "color": "brown", "parts": 1}],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_removes_the_drink() {
    let app = TestApp::new().await;
    let id = app.insert("ristretto", vec![part("espresso", "brown", 1)]).await;

    let (status, body) = app
        .request(
            "DELETE",
            &format!("/drinks/{id}"),
            Some(&token(&["delete:drinks"])),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "delete": id}));

    let (_, body) = app.request("GET", "/drinks", None, None).await;
    let remaining = body["drinks"].as_array().unwrap();
    assert!(remaining.iter().all(|d| d["id"] != json!(id)));
}

#[tokio::test]
async fn delete_missing_drink_is_404() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(
            "DELETE",
            "/drinks/424242",
            Some(&token(&["delete:drinks"])),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
