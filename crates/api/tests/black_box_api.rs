use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::json;

use skillsgarden_auth::{JwtClaims, Role};
use skillsgarden_infra::config::{DEV_JWT_AUDIENCE, DEV_JWT_ISSUER, DEV_JWT_KEY};
use skillsgarden_infra::{AdminSeed, AppConfig};

const ADMIN_EMAIL: &str = "admin@skillsgarden.test";
const ADMIN_PASSWORD: &str = "admin-password";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory stores, bound to an ephemeral port.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let mut config = AppConfig::default();
        config.bcrypt_cost = 4;
        config.blob.public_url = base_url.clone();
        config.admin = Some(AdminSeed {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        });
        let app = skillsgarden_api::app::build_app(&config)
            .await
            .expect("failed to build app");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user_id: i32, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        role,
        nameid: user_id.to_string(),
        iss: DEV_JWT_ISSUER.to_string(),
        aud: DEV_JWT_AUDIENCE.to_string(),
        iat: now.timestamp(),
        nbf: now.timestamp(),
        exp: (now + ChronoDuration::minutes(10)).timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(DEV_JWT_KEY.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn image_part(file_name: &str) -> Part {
    Part::bytes(b"\x89PNG fake image".to_vec()).file_name(file_name.to_string())
}

fn location_form(name: &str) -> Form {
    Form::new()
        .text("Name", name.to_string())
        .text("City", "Breda")
        .text("Lat", "51,5719")
        .text("Lng", "4.7683")
        .part("Image", image_part("park.png"))
}

async fn error_code(res: reqwest::Response) -> i64 {
    let body: serde_json::Value = res.json().await.unwrap();
    body["code"].as_i64().expect("error body carries a code")
}

async fn create_location(client: &reqwest::Client, srv: &TestServer, token: &str) -> serde_json::Value {
    let res = client
        .post(srv.url("/locations"))
        .bearer_auth(token)
        .multipart(location_form("Stadspark"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_endpoints_report_missing_and_invalid_tokens() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, 4011);

    let res = client
        .get(srv.url("/users"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, 4012);

    // Public reads ignore a bad token.
    let res = client
        .get(srv.url("/locations"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_then_login() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/register"))
        .json(&json!({
            "name": "Pete",
            "email": "Pete@Mail.com",
            "password": "password1",
            "dateofbirth": "2000-01-01",
            "gender": "Male",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let user: serde_json::Value = res.json().await.unwrap();
    assert_eq!(user["email"], "pete@mail.com");
    assert_eq!(user["type"], "User");
    assert!(user.get("password").is_none());

    let res = client
        .post(srv.url("/register"))
        .json(&json!({
            "name": "Pete",
            "email": "pete@mail.com",
            "password": "password1",
            "dateofbirth": "2000-01-01",
            "gender": "Male",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Email does already exist");

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "email": "pete@mail.com", "password": "password1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let session: serde_json::Value = res.json().await.unwrap();
    let token = session["token"].as_str().unwrap();
    let id = session["user"]["id"].as_i64().unwrap();

    let res = client
        .get(srv.url(&format!("/users/{id}")))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(srv.url("/login"))
        .json(&json!({ "email": "pete@mail.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, 4014);
}

#[tokio::test]
async fn register_cannot_pick_a_type() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .post(srv.url("/register"))
        .json(&json!({
            "name": "Eve",
            "email": "eve@mail.com",
            "password": "password1",
            "dateofbirth": "2000-01-01",
            "gender": "Female",
            "type": "Admin",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, 4015);
}

#[tokio::test]
async fn seeded_admin_can_log_in() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .post(srv.url("/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let session: serde_json::Value = res.json().await.unwrap();
    assert_eq!(session["user"]["type"], "Admin");
}

#[tokio::test]
async fn users_only_see_their_own_account() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/users/1"))
        .bearer_auth(mint_jwt(99, Role::User))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, 4004);

    let res = client
        .delete(srv.url("/users/1"))
        .bearer_auth(mint_jwt(99, Role::Organiser))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, 4016);
}

#[tokio::test]
async fn location_lifecycle_requires_admin() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(1, Role::Admin);

    let res = client
        .post(srv.url("/locations"))
        .bearer_auth(mint_jwt(2, Role::User))
        .multipart(location_form("Stadspark"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, 4013);

    let created = create_location(&client, &srv, &admin).await;
    assert_eq!(created["name"], "Stadspark");
    assert_eq!(created["city"], "Breda");
    assert_eq!(created["lat"], 51.5719);
    let id = created["id"].as_i64().unwrap();

    let res = client
        .put(srv.url(&format!("/locations/{id}")))
        .bearer_auth(&admin)
        .multipart(Form::new().text("City", "Tilburg"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "Stadspark");
    assert_eq!(updated["city"], "Tilburg");

    let res = client
        .delete(srv.url(&format!("/locations/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url(&format!("/locations/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await, 4042);
}

#[tokio::test]
async fn incomplete_or_unknown_form_fields_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(1, Role::Admin);

    let res = client
        .post(srv.url("/locations"))
        .bearer_auth(&admin)
        .multipart(Form::new().text("Name", "Stadspark"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, 4001);

    let res = client
        .post(srv.url("/locations"))
        .bearer_auth(&admin)
        .multipart(location_form("Stadspark").text("Color", "green"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Color is not a valid field");

    let res = client
        .post(srv.url("/locations"))
        .bearer_auth(&admin)
        .multipart(
            Form::new()
                .text("Name", "Stadspark")
                .text("City", "Breda")
                .text("Lat", "1")
                .text("Lng", "2")
                .part("Image", image_part("park.gif")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, 400);
}

#[tokio::test]
async fn oversized_images_report_the_size_limit() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(1, Role::Admin);

    // Just over the limit, and far enough over to pass the request body limit.
    for size in [10 * 1024 * 1024 + 10, 12 * 1024 * 1024] {
        let form = Form::new()
            .text("Name", "Stadspark")
            .text("City", "Breda")
            .text("Lat", "1")
            .text("Lng", "2")
            .part("Image", Part::bytes(vec![0u8; size]).file_name("big.png"));
        let res = client
            .post(srv.url("/locations"))
            .bearer_auth(&admin)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "size {size}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], "Maximum allowed file size is 10485760 bytes.");
    }
}

#[tokio::test]
async fn unknown_location_is_reported_before_the_form() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(1, Role::Admin);

    for path in ["/locations/999/components", "/locations/999/events"] {
        let res = client
            .post(srv.url(path))
            .bearer_auth(&admin)
            .multipart(Form::new().text("Color", "green"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(error_code(res).await, 4042);
    }

    let res = client
        .put(srv.url("/locations/999"))
        .bearer_auth(&admin)
        .multipart(Form::new().text("Lat", "north"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await, 4042);

    let location = create_location(&client, &srv, &admin).await;
    let id = location["id"].as_i64().unwrap();
    let res = client
        .put(srv.url(&format!("/locations/{id}/events/999")))
        .bearer_auth(&admin)
        .multipart(Form::new().text("MaxRegistrations", "many"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await, 4043);
}

#[tokio::test]
async fn event_registration_rules() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(1, Role::Admin);
    let organiser = mint_jwt(10, Role::Organiser);

    let location = create_location(&client, &srv, &admin).await;
    let location_id = location["id"].as_i64().unwrap();

    let start = (Utc::now() + ChronoDuration::days(7)).to_rfc3339();
    let res = client
        .post(srv.url(&format!("/locations/{location_id}/events")))
        .bearer_auth(&organiser)
        .multipart(
            Form::new()
                .text("Title", "Bootcamp")
                .text("Description", "Outdoor training")
                .text("StartTime", start)
                .text("MaxRegistrations", "1")
                .part("Image", image_part("bootcamp.jpg")),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let event: serde_json::Value = res.json().await.unwrap();
    assert_eq!(event["maxRegistrations"], 1);
    assert_eq!(event["registrations"], 0);
    let event_id = event["id"].as_i64().unwrap();
    let users_url = srv.url(&format!("/locations/{location_id}/events/{event_id}/users"));

    let res = client.post(&users_url).bearer_auth(&organiser).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, 40015);

    let first = mint_jwt(20, Role::User);
    let res = client.post(&users_url).bearer_auth(&first).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.post(&users_url).bearer_auth(&first).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, 40017);

    let res = client
        .post(&users_url)
        .bearer_auth(mint_jwt(21, Role::User))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, 40016);

    let res = client
        .get(srv.url("/users/20/events"))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let registered: serde_json::Value = res.json().await.unwrap();
    assert_eq!(registered.as_array().unwrap().len(), 1);
    assert_eq!(registered[0]["registrations"], 1);

    let res = client.delete(&users_url).bearer_auth(&first).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client.delete(&users_url).bearer_auth(&first).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await, 4045);
}

#[tokio::test]
async fn workout_generation() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(1, Role::Admin);

    for (name, form) in [
        ("Pull up", "klimmen"),
        ("Balance beam", "balans"),
        ("Handstand", "balans"),
        ("Roll", "rollen"),
        ("Sprint", "hardlopen"),
        ("Jump", "springen"),
        ("Swing", "zwaaien"),
    ] {
        let res = client
            .post(srv.url("/exercises"))
            .bearer_auth(&admin)
            .json(&json!({ "name": name, "steps": ["Start", "Finish"], "forms": [form] }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .get(srv.url("/workouts/generate?amount=50"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let picked: serde_json::Value = res.json().await.unwrap();
    assert_eq!(picked.as_array().unwrap().len(), 5);

    let res = client
        .get(srv.url("/workouts/generate?movementforms=balans"))
        .send()
        .await
        .unwrap();
    let picked: serde_json::Value = res.json().await.unwrap();
    let picked = picked.as_array().unwrap();
    assert_eq!(picked.len(), 2);
    assert!(picked.iter().all(|e| e["forms"][0] == "balans"));

    let res = client
        .get(srv.url("/workouts/generate?movementforms=vliegen"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, 40013);

    let res = client
        .get(srv.url("/workouts/generate?amount=many"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, 4003);
}

#[tokio::test]
async fn workouts_reference_existing_exercises() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(1, Role::Admin);

    let res = client
        .post(srv.url("/exercises"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Squat", "steps": ["Bend", "Stand"] }))
        .send()
        .await
        .unwrap();
    let exercise: serde_json::Value = res.json().await.unwrap();
    let exercise_id = exercise["id"].as_i64().unwrap();
    assert_eq!(exercise["steps"], json!(["Bend", "Stand"]));

    let res = client
        .post(srv.url("/workouts"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Legs", "type": "Strength", "exercises": [exercise_id, 999] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, 40014);

    let res = client
        .post(srv.url("/workouts"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Legs", "type": "Strength", "exercises": [exercise_id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let workout: serde_json::Value = res.json().await.unwrap();
    assert_eq!(workout["exercises"][0]["name"], "Squat");

    let res = client.get(srv.url("/workouts")).send().await.unwrap();
    let listed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(listed[0]["exercises"], 1);
    assert_eq!(listed[0]["type"], "Strength");
}

#[tokio::test]
async fn beacon_logs_are_personal() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(1, Role::Admin);

    let location = create_location(&client, &srv, &admin).await;
    let location_id = location["id"].as_i64().unwrap();

    let res = client
        .post(srv.url("/beacons"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Gate", "locationId": location_id, "lat": 51.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Longitude is required");

    let res = client
        .post(srv.url("/beacons"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Gate", "locationId": 404, "lat": 51.5, "lng": 4.7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await, 4042);

    let res = client
        .post(srv.url("/beacons"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Gate", "locationId": location_id, "lat": 51.5, "lng": 4.7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let beacon: serde_json::Value = res.json().await.unwrap();
    let beacon_id = beacon["id"].as_i64().unwrap();

    let user = mint_jwt(1, Role::User);
    let res = client
        .post(srv.url(&format!("/users/2/beacons/{beacon_id}")))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, 40018);

    let res = client
        .post(srv.url(&format!("/users/1/beacons/{beacon_id}")))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let log: serde_json::Value = res.json().await.unwrap();
    assert_eq!(log["beaconId"], beacon_id);

    let res = client
        .get(srv.url("/users/1/beacons"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    let logs: serde_json::Value = res.json().await.unwrap();
    assert_eq!(logs.as_array().unwrap().len(), 1);

    // The seeded admin is user 1.
    let res = client
        .delete(srv.url("/users/1/beacons"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn signed_image_urls_resolve() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = mint_jwt(1, Role::Admin);

    let location = create_location(&client, &srv, &admin).await;
    let image_url = location["image"].as_str().unwrap().to_string();
    assert!(image_url.starts_with(&format!("{}/images/", srv.base_url)));

    let res = client.get(&image_url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"\x89PNG fake image");

    let tampered = image_url.replace("sig=", "sig=00");
    let res = client.get(&tampered).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let unsigned = image_url.split('?').next().unwrap().to_string();
    let res = client.get(&unsigned).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
