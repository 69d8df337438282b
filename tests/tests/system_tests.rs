use app_middleware::JwtService;
use app_test::TestApp;
use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

async fn register_and_login(app: &TestApp, email: &str, username: &str) -> (String, String) {
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"email": email, "username": username, "password": "pw1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": email, "password": "pw1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    assert_eq!(body["isProfileComplete"], false);

    (
        body["accessToken"].as_str().unwrap().to_string(),
        body["refreshToken"].as_str().unwrap().to_string(),
    )
}

async fn profile_completes_user(app: &TestApp) {
    let (access, _) = register_and_login(app, "a@x.com", "alice").await;

    let (status, body) = app.get("/api/auth/user", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isProfileComplete"], false);
    assert!(body["user"]["profile"].is_null());

    let (status, body) = app
        .post(
            "/api/profile",
            Some(&access),
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "dateOfBirth": "1990-01-15",
                "city": "London",
                "country": "UK",
                "professionalYearsOfExperience": 2
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create profile failed: {}", body);

    let (status, body) = app.get("/api/auth/user", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isProfileComplete"], true);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["profile"]["professionalYearsOfExperience"], 2);

    // A fresh login now reports the completed profile
    let (_, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "a@x.com", "password": "pw1"}),
        )
        .await;
    assert_eq!(body["isProfileComplete"], true);
}

async fn logout_ends_refresh(app: &TestApp) {
    let (access, refresh) = register_and_login(app, "b@x.com", "bob").await;

    let (status, _) = app
        .post("/api/auth/refresh", None, json!({"refreshToken": refresh}))
        .await;
    assert_eq!(status, StatusCode::OK);

    // The access token is not a refresh token
    let (status, _) = app
        .post("/api/auth/refresh", None, json!({"refreshToken": access}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post("/api/auth/logout", None, json!({"refreshToken": refresh}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/auth/refresh", None, json!({"refreshToken": refresh}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    // Access tokens live until their own expiry
    let (status, _) = app.get("/api/auth/user", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
}

async fn duplicates_are_rejected(app: &TestApp) {
    register_and_login(app, "c@x.com", "carol").await;

    for payload in [
        json!({"email": "c@x.com", "username": "carol2", "password": "pw1"}),
        json!({"email": "c2@x.com", "username": "carol", "password": "pw1"}),
    ] {
        let (status, _) = app.post("/api/auth/register", None, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_profile_completes_user_surreal() {
    let app = TestApp::with_surreal().await.unwrap();
    profile_completes_user(&app).await;
}

#[tokio::test]
async fn test_profile_completes_user_memory() {
    profile_completes_user(&TestApp::with_memory()).await;
}

#[tokio::test]
async fn test_logout_ends_refresh_surreal() {
    let app = TestApp::with_surreal().await.unwrap();
    logout_ends_refresh(&app).await;
}

#[tokio::test]
async fn test_logout_ends_refresh_memory() {
    logout_ends_refresh(&TestApp::with_memory()).await;
}

#[tokio::test]
async fn test_duplicates_are_rejected_surreal() {
    let app = TestApp::with_surreal().await.unwrap();
    duplicates_are_rejected(&app).await;
}

#[tokio::test]
async fn test_duplicates_are_rejected_memory() {
    duplicates_are_rejected(&TestApp::with_memory()).await;
}

async fn concurrent_registrations_create_one_user(app: TestApp) {
    let app = Arc::new(app);
    let payload = json!({"email": "race@x.com", "username": "racer", "password": "pw1"});

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            let payload = payload.clone();
            tokio::spawn(async move { app.post("/api/auth/register", None, payload).await.0 })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_create_one_user_memory() {
    concurrent_registrations_create_one_user(TestApp::with_memory()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations_create_one_user_surreal() {
    let app = TestApp::with_surreal().await.unwrap();
    concurrent_registrations_create_one_user(app).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_profile_creates_surreal() {
    let app = Arc::new(TestApp::with_surreal().await.unwrap());
    let (access, _) = register_and_login(&app, "p@x.com", "pat").await;
    let profile = json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "dateOfBirth": "1990-01-15",
        "city": "London",
        "country": "UK"
    });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            let access = access.clone();
            let profile = profile.clone();
            tokio::spawn(async move { app.post("/api/profile", Some(&access), profile).await.0 })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status == StatusCode::CREATED {
            created += 1;
        } else {
            assert_eq!(status, StatusCode::CONFLICT);
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = TestApp::with_memory();
    let forged = JwtService::new(&app_config::JwtConfig::new(b"attacker", b"attacker"))
        .issue_access("someone")
        .unwrap();

    let (status, _) = app.get("/api/profile", Some(&forged.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Same secrets as the server do get in
    let genuine = JwtService::new(&app.jwt_config).issue_access("someone").unwrap();
    let (status, _) = app.get("/api/profile", Some(&genuine.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
