//! HTTP-level tests driving the router in-process

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use cinelog::{account::Role, config::ServerConfig, server::build_router, AppContext};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-at-least-32-chars";
const PASSWORD: &str = "Secr3t-pass";

struct TestApp {
    router: Router,
    ctx: AppContext,
}

impl TestApp {
    async fn new() -> Self {
        let ctx = AppContext::new(ServerConfig::for_testing(SECRET)).await.unwrap();
        Self {
            router: build_router(ctx.clone()),
            ctx,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    /// Create an account directly and log it in over HTTP
    async fn login_as(&self, username: &str, role: Role) -> (i64, String) {
        let email = format!("{}@example.com", username);
        let user = self
            .ctx
            .account_manager
            .create_account(username, &email, PASSWORD, role)
            .await
            .unwrap();

        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": email, "password": PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        (user.id, body["access_token"].as_str().unwrap().to_string())
    }
}

#[tokio::test]
async fn test_health_and_unknown_route() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.send(Method::GET, "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_register_and_login_flow() {
    let app = TestApp::new().await;
    let registration = json!({
        "username": "johndoe",
        "email": "john@example.com",
        "password": PASSWORD
    });

    let (status, body) = app
        .send(Method::POST, "/api/auth/register", None, Some(registration.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "johndoe");
    assert_eq!(body["role"], "user");
    assert!(body.get("pass_hash").is_none());
    assert!(body.get("password").is_none());

    let (status, body) = app
        .send(Method::POST, "/api/auth/register", None, Some(registration))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AlreadyExists");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "john@example.com", "password": "Wr0ng-pass"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "john@example.com", "password": PASSWORD})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].as_str().is_some());
}

#[tokio::test]
async fn test_register_rejects_weak_password_and_bad_json() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "johndoe", "email": "john@example.com", "password": "password"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({"username": "johndoe"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn test_role_enforcement() {
    let app = TestApp::new().await;
    let (_, user_token) = app.login_as("viewer", Role::User).await;
    let (_, editor_token) = app.login_as("editor", Role::Editor).await;
    let genre = json!({"name": "Drama"});

    let (status, body) = app
        .send(Method::POST, "/api/genres", None, Some(genre.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = app
        .send(Method::POST, "/api/genres", Some("garbage"), Some(genre.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::POST, "/api/genres", Some(&user_token), Some(genre.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, body) = app
        .send(Method::POST, "/api/genres", Some(&editor_token), Some(genre.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Drama");

    let (status, _) = app
        .send(Method::POST, "/api/genres", Some(&editor_token), Some(genre))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Role changes are admin-only
    let uri = format!("/api/users/{}/role/editor", 1);
    let (status, _) = app.send(Method::PUT, &uri, Some(&editor_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_self_policy_and_admin_role_change() {
    let app = TestApp::new().await;
    let (alice_id, alice_token) = app.login_as("alice", Role::User).await;
    let (bob_id, _) = app.login_as("bob", Role::User).await;
    let (_, admin_token) = app.login_as("admin", Role::Admin).await;
    let bio = json!({"bio": "Cinephile"});

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/users/{}", alice_id),
            Some(&alice_token),
            Some(bio.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "Cinephile");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/users/{}", bob_id),
            Some(&alice_token),
            Some(bio.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/users/{}", bob_id),
            Some(&admin_token),
            Some(bio),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/users/{}/role/editor", bob_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "editor");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/users/{}/role/overlord", bob_id),
            Some(&admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(Method::GET, "/api/users/username/bob", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], bob_id);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/users/{}", alice_id),
            Some(&alice_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::GET, &format!("/api/users/{}", alice_id), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

async fn create_genre(app: &TestApp, token: &str, name: &str) -> i64 {
    let (status, body) = app
        .send(Method::POST, "/api/genres", Some(token), Some(json!({"name": name})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_star(app: &TestApp, token: &str, first_name: &str, last_name: &str) -> i64 {
    let (status, body) = app
        .send(
            Method::POST,
            "/api/stars",
            Some(token),
            Some(json!({
                "first_name": first_name,
                "last_name": last_name,
                "birth_date": "1950-01-01"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_movie_lifecycle() {
    let app = TestApp::new().await;
    let (_, token) = app.login_as("editor", Role::Editor).await;

    let adventure = create_genre(&app, &token, "Adventure").await;
    let drama = create_genre(&app, &token, "Drama").await;
    let action = create_genre(&app, &token, "Action").await;
    let scifi = create_genre(&app, &token, "SciFi").await;
    let lucas = create_star(&app, &token, "George", "Lucas").await;
    let mcgregor = create_star(&app, &token, "Ewan", "McGregor").await;
    let hamill = create_star(&app, &token, "Mark", "Hamill").await;

    // Create
    let (status, created) = app
        .send(
            Method::POST,
            "/api/movies",
            Some(&token),
            Some(json!({
                "title": "Star Wars",
                "description": "A long time ago in a galaxy far, far away",
                "release_date": "1977-05-25",
                "genre_ids": [adventure, drama],
                "cast": [
                    {"star_id": lucas, "role": "director"},
                    {"star_id": mcgregor, "role": "actor", "details": "Obi-Wan Kenobi"}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["version"], 0);
    assert_eq!(created["genres"][0]["name"], "Adventure");
    assert_eq!(created["genres"][1]["name"], "Drama");
    assert_eq!(created["cast"][0]["star"]["last_name"], "Lucas");
    assert_eq!(created["cast"][1]["details"], "Obi-Wan Kenobi");
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/movies/{}", id);

    // Update
    let update = json!({
        "version": 0,
        "title": "Star Wars",
        "description": "A long time ago in a galaxy far, far away",
        "release_date": "1977-05-25",
        "genre_ids": [adventure, action, scifi],
        "cast": [
            {"star_id": lucas, "role": "director"},
            {"star_id": hamill, "role": "actor", "details": "Luke Skywalker"}
        ]
    });
    let (status, updated) = app
        .send(Method::PUT, &uri, Some(&token), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["version"], 1);
    let genres: Vec<&str> = updated["genres"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(genres, vec!["Adventure", "Action", "SciFi"]);
    assert_eq!(updated["cast"][1]["star"]["last_name"], "Hamill");

    // Stale resubmission
    let (status, body) = app
        .send(Method::PUT, &uri, Some(&token), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "VersionMismatch");
    assert!(body.get("incident_id").is_none());

    // Unknown movie
    let (status, body) = app
        .send(Method::PUT, "/api/movies/999", Some(&token), Some(update))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");

    // Listing by star
    let (status, body) = app
        .send(Method::GET, &format!("/api/movies?star_id={}", hamill), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    // Delete, then read
    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_movie_input_errors() {
    let app = TestApp::new().await;
    let (_, token) = app.login_as("editor", Role::Editor).await;
    let drama = create_genre(&app, &token, "Drama").await;

    let movie = |genre_ids: Vec<i64>, cast: Value| {
        json!({
            "title": "Heat",
            "description": "Cops and robbers",
            "release_date": "1995-12-15",
            "genre_ids": genre_ids,
            "cast": cast
        })
    };

    // Repeated genre
    let (status, _) = app
        .send(Method::POST, "/api/movies", Some(&token), Some(movie(vec![drama, drama], json!([]))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown star
    let (status, _) = app
        .send(
            Method::POST,
            "/api/movies",
            Some(&token),
            Some(movie(vec![drama], json!([{"star_id": 4242, "role": "actor"}]))),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleted star
    let pacino = create_star(&app, &token, "Al", "Pacino").await;
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/stars/{}", pacino), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .send(
            Method::POST,
            "/api/movies",
            Some(&token),
            Some(movie(vec![drama], json!([{"star_id": pacino, "role": "actor"}]))),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");

    let (_, body) = app.send(Method::GET, "/api/movies", None, None).await;
    assert_eq!(body["total"], 0);

    // Non-numeric id
    let (status, body) = app.send(Method::GET, "/api/movies/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn test_pagination_defaults_and_clamp() {
    let app = TestApp::new().await;
    let (_, token) = app.login_as("editor", Role::Editor).await;
    for name in ["Mark", "Carrie", "Harrison"] {
        create_star(&app, &token, name, "Star").await;
    }

    // Test config: default size 2, max 50
    let (status, body) = app.send(Method::GET, "/api/stars", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 2);
    assert_eq!(body["total"], 3);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let (_, body) = app.send(Method::GET, "/api/stars?page=2", None, None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["first_name"], "Harrison");

    let (_, body) = app.send(Method::GET, "/api/stars?size=500", None, None).await;
    assert_eq!(body["size"], 50);

    let (status, body) = app.send(Method::GET, "/api/stars?page=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");

    let (status, _) = app.send(Method::GET, "/api/stars?page=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reviews() {
    let app = TestApp::new().await;
    let (_, editor_token) = app.login_as("editor", Role::Editor).await;
    let (critic_id, critic_token) = app.login_as("critic", Role::User).await;
    let (other_id, _) = app.login_as("other", Role::User).await;

    let (_, movie) = app
        .send(
            Method::POST,
            "/api/movies",
            Some(&editor_token),
            Some(json!({
                "title": "Heat",
                "description": "Cops and robbers",
                "release_date": "1995-12-15"
            })),
        )
        .await;
    let movie_id = movie["id"].as_i64().unwrap();
    let review = json!({
        "movie_id": movie_id,
        "title": "Great heist movie",
        "content": "The diner scene alone is worth it.",
        "rating": 9
    });

    let (status, created) = app
        .send(
            Method::POST,
            &format!("/api/users/{}/reviews", critic_id),
            Some(&critic_token),
            Some(review.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["rating"], 9);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/users/{}/reviews", critic_id),
            Some(&critic_token),
            Some(review.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Posting on someone else's behalf
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/users/{}/reviews", other_id),
            Some(&critic_token),
            Some(review),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/reviews?movie_id={}", movie_id),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/reviews/{}", created["id"]),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], critic_id);
}
