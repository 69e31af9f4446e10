// src/client_tests.rs

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use crate::client::HrClient;
    use crate::config::AppConfig;
    use crate::error::{ErrorKind, HrError};
    use crate::models::{RegisterRequest, Role};
    use crate::session::SessionStore;
    use crate::test_support::{
        anonymous_client, config_for, login_body, setup, teardown, user_json, TEST_TOKEN,
    };

    fn bearer() -> String {
        format!("Bearer {}", TEST_TOKEN)
    }

    async fn mount_login(server: &MockServer, role: Role) {
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"email": "someone@company.com", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_body(role)))
            .mount(server)
            .await;
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = AppConfig {
            api_base_url: "ftp://hr.example.com".into(),
            ..AppConfig::default()
        };
        let result = HrClient::new(config, SessionStore::in_memory());
        assert!(matches!(result, Err(HrError::Config(_))));
    }

    #[test]
    fn path_segment_refuses_slashes() {
        assert_eq!(HrClient::path_segment(" abc-123 ").unwrap(), "abc-123");
        assert!(HrClient::path_segment("a/b").is_err());
        assert!(HrClient::path_segment("").is_err());
    }

    #[tokio::test]
    async fn login_attaches_token_to_later_calls() {
        let server = MockServer::start().await;
        mount_login(&server, Role::Employee).await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(header("Authorization", bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(Role::Employee)))
            .expect(1)
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        let user = client.login("someone@company.com", "pw").await.unwrap();

        assert_eq!(user.role, Role::Employee);
        let session = client.session().snapshot();
        assert!(session.authenticated);
        assert!(!session.loading);
        assert_eq!(session.token.as_deref(), Some(TEST_TOKEN));

        client.me().await.unwrap();
    }

    #[tokio::test]
    async fn logout_stops_sending_the_token() {
        let server = MockServer::start().await;
        mount_login(&server, Role::Manager).await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        client.login("someone@company.com", "pw").await.unwrap();
        client.logout().unwrap();

        let session = client.session().snapshot();
        assert!(!session.authenticated);
        assert!(session.user.is_none());
        assert!(session.token.is_none());

        let health = client.health().await.unwrap();
        assert_eq!(health.status, "healthy");
    }

    #[tokio::test]
    async fn logout_removes_persisted_session() {
        let test_name = "client_logout_removes_persisted_session";
        let session_path = setup(test_name);
        let server = MockServer::start().await;
        mount_login(&server, Role::Hr).await;

        let config = AppConfig {
            session_file: session_path.clone(),
            ..config_for(&server)
        };
        let client = HrClient::from_config(config.clone()).unwrap();
        client.login("someone@company.com", "pw").await.unwrap();
        assert!(session_path.exists());

        let restarted = HrClient::from_config(config.clone()).unwrap();
        assert!(restarted.initialize().unwrap());
        assert_eq!(restarted.session().role(), Some(Role::Hr));

        restarted.logout().unwrap();
        assert!(!session_path.exists());
        assert!(!HrClient::from_config(config).unwrap().initialize().unwrap());

        teardown(test_name);
    }

    #[tokio::test]
    async fn invalid_login_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        let err = client.login("", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn bad_credentials_surface_backend_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Incorrect email or password"})),
            )
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        let err = client.login("someone@company.com", "wrong").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.user_message("Login failed"), "Incorrect email or password");
        let session = client.session().snapshot();
        assert!(!session.authenticated);
        assert!(!session.loading);
    }

    #[tokio::test]
    async fn server_error_during_login_is_an_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db down"})))
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        let err = client.login("someone@company.com", "pw").await.unwrap_err();

        assert!(matches!(err, HrError::Auth { .. }));
        assert_eq!(err.user_message("Login failed"), "db down");
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn unreachable_backend_during_login_is_an_auth_failure() {
        let config = AppConfig {
            api_base_url: "http://127.0.0.1:1".into(),
            request_timeout_secs: 5,
            ..AppConfig::default()
        };
        let client = HrClient::new(config, SessionStore::in_memory()).unwrap();
        let err = client.login("someone@company.com", "pw").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.user_message("Sign-in unavailable"), "Login failed");
        let session = client.session().snapshot();
        assert!(!session.authenticated);
        assert!(!session.loading);
    }

    #[tokio::test]
    async fn restored_session_sends_its_token() {
        let test_name = "client_restored_session_sends_its_token";
        let session_path = setup(test_name);
        let server = MockServer::start().await;
        mount_login(&server, Role::Employee).await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .and(header("Authorization", bearer().as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json(Role::Employee)))
            .expect(1)
            .mount(&server)
            .await;

        let config = AppConfig {
            session_file: session_path.clone(),
            ..config_for(&server)
        };
        HrClient::from_config(config.clone())
            .unwrap()
            .login("someone@company.com", "pw")
            .await
            .unwrap();

        let restarted = HrClient::from_config(config).unwrap();
        assert!(restarted.initialize().unwrap());
        let user = restarted.me().await.unwrap();
        assert_eq!(user.role, Role::Employee);

        teardown(test_name);
    }

    #[tokio::test]
    async fn register_does_not_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .and(|req: &Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap_or_default();
                body["department_id"] == "dept_001" && body["role"] == "employee" && body.get("phone").is_none()
            })
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "User registered successfully", "user_id": "u-new"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        let created = client
            .register(&RegisterRequest {
                full_name: "New Person".into(),
                employee_id: "EMP200".into(),
                email: "new@company.com".into(),
                password: "secret".into(),
                ..RegisterRequest::default()
            })
            .await
            .unwrap();

        assert_eq!(created.id.as_deref(), Some("u-new"));
        assert!(!client.session().is_authenticated());
        assert!(!client.session().is_loading());
    }

    #[tokio::test]
    async fn duplicate_registration_reports_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "Email already registered"})))
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        let err = client
            .register(&RegisterRequest {
                full_name: "Dup".into(),
                employee_id: "EMP001".into(),
                email: "admin@company.com".into(),
                password: "x".into(),
                ..RegisterRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message("Registration failed"), "Email already registered");
    }

    #[tokio::test]
    async fn me_requires_a_session() {
        let server = MockServer::start().await;
        let client = anonymous_client(&server);
        assert!(matches!(client.me().await, Err(HrError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn forbidden_status_is_an_authorization_error() {
        let server = MockServer::start().await;
        mount_login(&server, Role::Employee).await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Not enough permissions"})))
            .mount(&server)
            .await;

        let client = anonymous_client(&server);
        client.login("someone@company.com", "pw").await.unwrap();
        let err = client.me().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(err.user_message("Failed"), "Not enough permissions");
    }
}
