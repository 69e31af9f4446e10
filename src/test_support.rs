// src/test_support.rs
//
// Shared fixtures for the `*_tests.rs` modules.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use wiremock::MockServer;

use crate::client::HrClient;
use crate::clock::FixedClock;
use crate::config::AppConfig;
use crate::models::{timestamp, AttendanceAction, AttendanceLog, Role, User};
use crate::session::SessionStore;

pub const TEST_TOKEN: &str = "test-token-123";

pub fn user(role: Role) -> User {
    User {
        id: format!("u-{}", role),
        email: format!("{}@company.com", role),
        full_name: format!("Test {}", role),
        employee_id: "EMP100".to_string(),
        role,
        department_id: Some("dept_001".to_string()),
        phone: None,
        is_active: true,
        created_at: None,
    }
}

pub fn user_json(role: Role) -> Value {
    let u = user(role);
    json!({
        "user_id": u.id,
        "email": u.email,
        "full_name": u.full_name,
        "employee_id": u.employee_id,
        "role": role.as_str(),
        "department_id": "dept_001",
    })
}

pub fn login_body(role: Role) -> Value {
    json!({
        "access_token": TEST_TOKEN,
        "token_type": "bearer",
        "user": user_json(role),
    })
}

pub fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        api_base_url: server.uri(),
        request_timeout_secs: 5,
        ..AppConfig::default()
    }
}

/// A client for `server` with nobody signed in.
pub fn anonymous_client(server: &MockServer) -> HrClient {
    HrClient::new(config_for(server), SessionStore::in_memory()).unwrap()
}

/// A client for `server` already holding a session for `role`.
pub fn client_as(server: &MockServer, role: Role) -> Arc<HrClient> {
    let client = anonymous_client(server);
    client
        .session()
        .establish(user(role), TEST_TOKEN.to_string())
        .unwrap();
    Arc::new(client)
}

pub fn clock(datetime_str: &str) -> Arc<FixedClock> {
    Arc::new(FixedClock::at(datetime_str).unwrap())
}

pub fn at(raw: &str) -> DateTime<Utc> {
    timestamp::parse(raw).unwrap()
}

pub fn log(action: AttendanceAction, raw_timestamp: &str) -> AttendanceLog {
    AttendanceLog {
        id: None,
        user_id: Some("u-employee".to_string()),
        action,
        timestamp: at(raw_timestamp),
        location: None,
        date: None,
    }
}

// --- Temp files ---

pub fn temp_path(test_name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("hrportal_tests_{}", std::process::id()))
        .join(format!("{}.json", test_name))
}

pub fn setup(test_name: &str) -> PathBuf {
    teardown(test_name);
    temp_path(test_name)
}

pub fn teardown(test_name: &str) {
    let _ = fs::remove_file(temp_path(test_name));
}
