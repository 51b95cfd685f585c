//! HTTP-level tests: the real router mounted over in-memory fakes of the
//! database, classifier, and mail ports.

use api_lib::config::Config;
use api_lib::web::auth::{issue_token, verify_token, Claims};
use api_lib::web::router;
use api_lib::web::state::AppState;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use contacto_core::domain::{
    Category, NewSubmission, OutgoingEmail, ResponseStatus, ResponseUpdate, Submission, User,
    UserCredentials,
};
use contacto_core::ports::{
    ClassificationService, DatabaseService, MailService, PortError, PortResult,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const TEST_JWT_SECRET: &str = "test-jwt-secret";
const STAFF_ADDRESS: &str = "staff@example.com";

//=========================================================================================
// Fake Adapters
//=========================================================================================

#[derive(Default)]
struct FakeDb {
    submissions: Mutex<Vec<Submission>>,
    users: Vec<UserCredentials>,
    fail_insert: bool,
    fail_update: bool,
}

impl FakeDb {
    fn with_users(users: Vec<UserCredentials>) -> Self {
        Self {
            users,
            ..Default::default()
        }
    }

    fn stored(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    fn seed_submission(&self, id: i64, email: &str) {
        self.submissions.lock().unwrap().push(Submission {
            id,
            nombre: "Ana".to_string(),
            email: email.to_string(),
            telefono: None,
            asunto: Some("Asunto".to_string()),
            mensaje: "Mensaje".to_string(),
            referencia: uuid::Uuid::new_v4(),
            categoria: Some(Category::Consulta),
            response_status: ResponseStatus::Pendiente,
            responded_by: None,
            response_date: None,
            response_message: None,
            created_at: Utc::now(),
        });
    }
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn insert_submission(&self, new: NewSubmission) -> PortResult<Submission> {
        if self.fail_insert {
            return Err(PortError::Unexpected("insert failed".to_string()));
        }
        let mut rows = self.submissions.lock().unwrap();
        let submission = Submission {
            id: rows.len() as i64 + 1,
            nombre: new.nombre,
            email: new.email,
            telefono: new.telefono,
            asunto: new.asunto,
            mensaje: new.mensaje,
            referencia: new.referencia,
            categoria: None,
            response_status: ResponseStatus::Pendiente,
            responded_by: None,
            response_date: None,
            response_message: None,
            created_at: Utc::now(),
        };
        rows.push(submission.clone());
        Ok(submission)
    }

    async fn set_category(&self, id: i64, category: Category) -> PortResult<()> {
        let mut rows = self.submissions.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Submission {} not found", id)))?;
        row.categoria = Some(category);
        Ok(())
    }

    async fn get_submission(&self, id: i64) -> PortResult<Submission> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Submission {} not found", id)))
    }

    async fn list_submissions(&self) -> PortResult<Vec<Submission>> {
        Ok(self.stored())
    }

    async fn update_response(&self, id: i64, update: ResponseUpdate) -> PortResult<Submission> {
        if self.fail_update {
            return Err(PortError::Unexpected("update failed".to_string()));
        }
        let mut rows = self.submissions.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Submission {} not found", id)))?;
        row.response_status = update.response_status;
        row.responded_by = Some(update.responded_by);
        row.response_date = Some(update.response_date);
        if update.response_message.is_some() {
            row.response_message = update.response_message;
        }
        Ok(row.clone())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        Ok(self
            .users
            .iter()
            .map(|u| User {
                id: u.id,
                username: u.username.clone(),
                email: u.email.clone(),
            })
            .collect())
    }
}

struct FakeClassifier {
    result: Option<Category>,
    calls: AtomicUsize,
}

impl FakeClassifier {
    fn returning(category: Category) -> Self {
        Self {
            result: Some(category),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassificationService for FakeClassifier {
    async fn classify(&self, _asunto: &str, _mensaje: &str) -> PortResult<Category> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .ok_or_else(|| PortError::Unexpected("classifier unavailable".to_string()))
    }
}

#[derive(Default)]
struct FakeMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl FakeMailer {
    fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn sent_mails(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailService for FakeMailer {
    async fn send(&self, email: OutgoingEmail) -> PortResult<()> {
        if self.fail {
            return Err(PortError::Unexpected("smtp unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

//=========================================================================================
// Test Harness
//=========================================================================================

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        gemini_api_key: None,
        classifier_model: "test-model".to_string(),
        classifier_api_base: "http://localhost".to_string(),
        smtp_host: "localhost".to_string(),
        smtp_port: 465,
        smtp_username: "unused".to_string(),
        smtp_password: "unused".to_string(),
        mail_from: "web@example.com".to_string(),
        mail_to: STAFF_ADDRESS.to_string(),
    }
}

fn test_user(password: &str) -> UserCredentials {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string();
    UserCredentials {
        id: 1,
        username: "diego".to_string(),
        email: "diego@example.com".to_string(),
        password_hash,
    }
}

struct Harness {
    server: TestServer,
    db: Arc<FakeDb>,
    classifier: Arc<FakeClassifier>,
    mailer: Arc<FakeMailer>,
}

fn harness(db: FakeDb, classifier: FakeClassifier, mailer: FakeMailer) -> Harness {
    let db = Arc::new(db);
    let classifier = Arc::new(classifier);
    let mailer = Arc::new(mailer);
    let state = Arc::new(AppState {
        db: db.clone(),
        classifier: classifier.clone(),
        mailer: mailer.clone(),
        config: Arc::new(test_config()),
    });
    Harness {
        server: TestServer::new(router(state)).unwrap(),
        db,
        classifier,
        mailer,
    }
}

fn default_harness() -> Harness {
    harness(
        FakeDb::default(),
        FakeClassifier::returning(Category::Consulta),
        FakeMailer::default(),
    )
}

fn bearer(username: &str) -> String {
    let user = UserCredentials {
        id: 1,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: String::new(),
    };
    format!("Bearer {}", issue_token(&user, TEST_JWT_SECRET).unwrap())
}

//=========================================================================================
// Contact Intake
//=========================================================================================

#[tokio::test]
async fn contact_with_missing_fields_returns_400_and_writes_no_row() {
    let h = default_harness();

    let res = h
        .server
        .post("/api/contacto")
        .json(&json!({ "nombre": "Ana", "email": "" }))
        .await;

    res.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["missing"], json!(["email", "mensaje"]));
    assert!(h.db.stored().is_empty());
    assert_eq!(h.classifier.call_count(), 0);
    assert!(h.mailer.sent_mails().is_empty());
}

#[tokio::test]
async fn contact_success_stores_row_and_classifies_it() {
    let h = harness(
        FakeDb::default(),
        FakeClassifier::returning(Category::Queja),
        FakeMailer::default(),
    );

    let res = h
        .server
        .post("/api/contacto")
        .json(&json!({
            "nombre": "Ana",
            "email": "ana@x.com",
            "mensaje": "Mi máquina no funciona"
        }))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["success"], json!(true));

    let stored = h.db.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].categoria, Some(Category::Queja));

    // Confirmation to the submitter plus notification to staff.
    let mails = h.mailer.sent_mails();
    assert_eq!(mails.len(), 2);
    assert_eq!(mails[0].to, "ana@x.com");
    assert!(mails[0].text_body.contains(&stored[0].referencia.to_string()));
    assert_eq!(mails[1].to, STAFF_ADDRESS);
    assert!(mails[1].subject.contains("Queja"));
}

#[tokio::test]
async fn contact_references_are_unique_across_identical_submissions() {
    let h = default_harness();
    let payload = json!({
        "nombre": "Ana",
        "email": "ana@x.com",
        "mensaje": "Hola"
    });

    h.server.post("/api/contacto").json(&payload).await.assert_status_ok();
    h.server.post("/api/contacto").json(&payload).await.assert_status_ok();

    let stored = h.db.stored();
    assert_eq!(stored.len(), 2);
    assert_ne!(stored[0].referencia, stored[1].referencia);
}

#[tokio::test]
async fn contact_storage_failure_aborts_before_classification_and_mail() {
    let h = harness(
        FakeDb {
            fail_insert: true,
            ..Default::default()
        },
        FakeClassifier::returning(Category::Consulta),
        FakeMailer::default(),
    );

    let res = h
        .server
        .post("/api/contacto")
        .json(&json!({
            "nombre": "Ana",
            "email": "ana@x.com",
            "mensaje": "Hola"
        }))
        .await;

    res.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json();
    assert_eq!(body["success"], json!(false));
    assert_eq!(h.classifier.call_count(), 0);
    assert!(h.mailer.sent_mails().is_empty());
}

#[tokio::test]
async fn contact_classifier_failure_still_succeeds_without_category() {
    let h = harness(
        FakeDb::default(),
        FakeClassifier::failing(),
        FakeMailer::default(),
    );

    let res = h
        .server
        .post("/api/contacto")
        .json(&json!({
            "nombre": "Ana",
            "email": "ana@x.com",
            "mensaje": "Hola"
        }))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["success"], json!(true));

    let stored = h.db.stored();
    assert_eq!(stored[0].categoria, None);
    // Both emails still go out; the staff one reports the missing category.
    assert_eq!(h.mailer.sent_mails().len(), 2);
}

#[tokio::test]
async fn contact_mail_failure_still_reports_success_with_degraded_message() {
    let h = harness(
        FakeDb::default(),
        FakeClassifier::returning(Category::Consulta),
        FakeMailer::failing(),
    );

    let res = h
        .server
        .post("/api/contacto")
        .json(&json!({
            "nombre": "Ana",
            "email": "ana@x.com",
            "mensaje": "Hola"
        }))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["success"], json!(true));
    assert!(body["message"].as_str().unwrap().contains("correos"));
    assert_eq!(h.db.stored().len(), 1);
}

//=========================================================================================
// Login
//=========================================================================================

#[tokio::test]
async fn login_with_correct_credentials_returns_decodable_token() {
    let h = harness(
        FakeDb::with_users(vec![test_user("hunter2")]),
        FakeClassifier::returning(Category::Otro),
        FakeMailer::default(),
    );

    let res = h
        .server
        .post("/api/login")
        .json(&json!({ "email": "diego@example.com", "password": "hunter2" }))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    let token = body["token"].as_str().unwrap();

    let claims = verify_token(token, TEST_JWT_SECRET).unwrap();
    assert_eq!(claims.id, 1);
    assert_eq!(claims.username, "diego");
    assert_eq!(claims.email, "diego@example.com");
}

#[tokio::test]
async fn login_with_wrong_password_returns_401() {
    let h = harness(
        FakeDb::with_users(vec![test_user("hunter2")]),
        FakeClassifier::returning(Category::Otro),
        FakeMailer::default(),
    );

    let res = h
        .server
        .post("/api/login")
        .json(&json!({ "email": "diego@example.com", "password": "wrong" }))
        .await;

    res.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_unknown_email_returns_404() {
    let h = default_harness();

    let res = h
        .server
        .post("/api/login")
        .json(&json!({ "email": "nobody@example.com", "password": "x" }))
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_with_missing_fields_returns_400() {
    let h = default_harness();

    let res = h
        .server
        .post("/api/login")
        .json(&json!({ "email": "diego@example.com" }))
        .await;

    res.assert_status(StatusCode::BAD_REQUEST);
}

//=========================================================================================
// Auth Guard
//=========================================================================================

#[tokio::test]
async fn admin_route_without_token_returns_401() {
    let h = default_harness();
    let res = h.server.get("/api/admin/data").await;
    res.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_route_with_malformed_token_returns_403() {
    let h = default_harness();
    let res = h
        .server
        .get("/api/admin/data")
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    res.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_route_with_expired_token_returns_403() {
    let h = default_harness();

    let claims = Claims {
        id: 1,
        username: "diego".to_string(),
        email: "diego@example.com".to_string(),
        exp: 1_000, // 1970, far beyond any leeway
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let res = h
        .server
        .get("/api/admin/data")
        .add_header("Authorization", format!("Bearer {}", token))
        .await;
    res.assert_status(StatusCode::FORBIDDEN);
}

//=========================================================================================
// Admin Flow
//=========================================================================================

#[tokio::test]
async fn admin_lists_submissions_and_users() {
    let h = harness(
        FakeDb::with_users(vec![test_user("hunter2")]),
        FakeClassifier::returning(Category::Otro),
        FakeMailer::default(),
    );
    h.db.seed_submission(1, "ana@x.com");

    let res = h
        .server
        .get("/api/admin/data")
        .add_header("Authorization", bearer("diego"))
        .await;
    res.assert_status_ok();
    let data: Value = res.json();
    assert_eq!(data.as_array().unwrap().len(), 1);

    let res = h
        .server
        .get("/api/admin/users")
        .add_header("Authorization", bearer("diego"))
        .await;
    res.assert_status_ok();
    let users: Value = res.json();
    assert_eq!(users[0]["username"], json!("diego"));
    // Password material never leaves the server.
    assert!(users[0].get("password_hash").is_none());
}

#[tokio::test]
async fn update_incident_sets_status_and_responder() {
    let h = default_harness();
    h.db.seed_submission(1, "ana@x.com");

    let res = h
        .server
        .put("/api/admin/incidents/1")
        .add_header("Authorization", bearer("diego"))
        .json(&json!({ "response_status": "En Progreso" }))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["incident"]["response_status"], json!("En Progreso"));
    assert_eq!(body["incident"]["responded_by"], json!("diego"));
}

#[tokio::test]
async fn update_unknown_incident_returns_404() {
    let h = default_harness();

    let res = h
        .server
        .put("/api/admin/incidents/999")
        .add_header("Authorization", bearer("diego"))
        .json(&json!({ "response_status": "Resuelto" }))
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_incident_with_bad_input_returns_400() {
    let h = default_harness();
    h.db.seed_submission(1, "ana@x.com");

    // Non-numeric id.
    let res = h
        .server
        .put("/api/admin/incidents/abc")
        .add_header("Authorization", bearer("diego"))
        .json(&json!({ "response_status": "Resuelto" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);

    // Missing status.
    let res = h
        .server
        .put("/api/admin/incidents/1")
        .add_header("Authorization", bearer("diego"))
        .json(&json!({ "response_message": "hola" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);

    // Unknown status label.
    let res = h
        .server
        .put("/api/admin/incidents/1")
        .add_header("Authorization", bearer("diego"))
        .json(&json!({ "response_status": "Abierto" }))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn respond_with_empty_message_returns_400_before_any_mail() {
    let h = default_harness();
    h.db.seed_submission(1, "ana@x.com");

    let res = h
        .server
        .post("/api/admin/incidents/1/respond")
        .add_header("Authorization", bearer("diego"))
        .json(&json!({ "response_message": "   " }))
        .await;

    res.assert_status(StatusCode::BAD_REQUEST);
    assert!(h.mailer.sent_mails().is_empty());
}

#[tokio::test]
async fn respond_sends_reply_and_resolves_incident() {
    let h = default_harness();
    h.db.seed_submission(1, "ana@x.com");

    let res = h
        .server
        .post("/api/admin/incidents/1/respond")
        .add_header("Authorization", bearer("diego"))
        .json(&json!({ "response_message": "Ya está arreglado." }))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["incident"]["response_status"], json!("Resuelto"));
    assert_eq!(body["incident"]["responded_by"], json!("diego"));
    assert_eq!(
        body["incident"]["response_message"],
        json!("Ya está arreglado.")
    );

    let mails = h.mailer.sent_mails();
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].to, "ana@x.com");
    assert!(mails[0].text_body.contains("Ya está arreglado."));
}

#[tokio::test]
async fn respond_to_unknown_incident_returns_404_without_mail() {
    let h = default_harness();

    let res = h
        .server
        .post("/api/admin/incidents/42/respond")
        .add_header("Authorization", bearer("diego"))
        .json(&json!({ "response_message": "Hola" }))
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
    assert!(h.mailer.sent_mails().is_empty());
}

#[tokio::test]
async fn respond_still_reports_sent_when_bookkeeping_update_fails() {
    let h = harness(
        FakeDb {
            fail_update: true,
            ..Default::default()
        },
        FakeClassifier::returning(Category::Otro),
        FakeMailer::default(),
    );
    h.db.seed_submission(1, "ana@x.com");

    let res = h
        .server
        .post("/api/admin/incidents/1/respond")
        .add_header("Authorization", bearer("diego"))
        .json(&json!({ "response_message": "Hola" }))
        .await;

    // The email went out, so the request reports success.
    res.assert_status_ok();
    assert_eq!(h.mailer.sent_mails().len(), 1);
}

//=========================================================================================
// Misc Routes
//=========================================================================================

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let h = default_harness();
    let res = h.server.get("/api/health").await;
    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn unknown_route_returns_structured_404() {
    let h = default_harness();
    let res = h.server.get("/api/nope").await;
    res.assert_status(StatusCode::NOT_FOUND);
    let body: Value = res.json();
    assert_eq!(body["path"], json!("/api/nope"));
    assert_eq!(body["method"], json!("GET"));
}
