// src/client.rs

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::{extract_error_message, HrError};
use crate::models::{
    CreatedResponse, HealthResponse, LoginRequest, LoginResponse, RegisterRequest, Role, User,
};
use crate::session::SessionStore;
use crate::validation::{validate_login, validate_registration, FieldError};

pub const LOGIN_ENDPOINT: &str = "/api/auth/login";
pub const REGISTER_ENDPOINT: &str = "/api/auth/register";
pub const ME_ENDPOINT: &str = "/api/auth/me";
pub const HEALTH_ENDPOINT: &str = "/api/health";

const LOGIN_FAILED: &str = "Login failed";

/// Gateway to the HR API.
///
/// Owns the HTTP client and the session store. The bearer credential is read from the
/// session on every request rather than installed once as a default header, so a logout
/// takes effect for the very next call.
#[derive(Clone)]
pub struct HrClient {
    config: Arc<AppConfig>,
    base_url: String,
    http_client: Client,
    session: SessionStore,
}

impl HrClient {
    pub fn new(config: AppConfig, session: SessionStore) -> Result<Self, HrError> {
        let parsed = Url::parse(&config.api_base_url).map_err(|e| {
            HrError::Config(format!("Invalid API base URL '{}': {}", config.api_base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HrError::Config(format!(
                "API base URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            config: Arc::new(config),
            http_client,
            session,
        })
    }

    /// Builds a client whose session is persisted to the configured session file.
    pub fn from_config(config: AppConfig) -> Result<Self, HrError> {
        let session = SessionStore::new(Some(config.session_file.clone()));
        Self::new(config, session)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    // --- Session operations ---

    /// Re-enters a persisted session into live state. Call once at startup.
    pub fn initialize(&self) -> Result<bool, HrError> {
        self.session.initialize()
    }

    /// Signs in and stores the issued credential. Every later request carries it until
    /// `logout`.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, HrError> {
        validate_login(email, password)?;

        self.session.set_loading(true);
        let result = self.post_json::<_, LoginResponse>(
            LOGIN_ENDPOINT,
            &LoginRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            },
            "login",
        )
        .await;
        self.session.set_loading(false);

        // Any failure to obtain a credential is an authentication failure
        let response = result.map_err(|e| match e {
            HrError::Validation { message, .. }
            | HrError::Auth { message }
            | HrError::Authorization { message }
            | HrError::NotFound { message }
            | HrError::Api { message, .. }
                if !message.trim().is_empty() =>
            {
                HrError::Auth { message }
            }
            HrError::Network(e) => {
                warn!("Login could not reach the backend: {}", e);
                HrError::Auth {
                    message: LOGIN_FAILED.to_string(),
                }
            }
            other => {
                warn!("Login failed: {}", other);
                HrError::Auth {
                    message: LOGIN_FAILED.to_string(),
                }
            }
        })?;

        if let Some(token_type) = response.token_type.as_deref() {
            if !token_type.eq_ignore_ascii_case("bearer") {
                warn!("Unexpected token type '{}' from login; sending as Bearer", token_type);
            }
        }

        let user = response.user;
        self.session.establish(user.clone(), response.access_token)?;
        info!("Logged in as {} ({})", user.email, user.role);
        Ok(user)
    }

    /// Creates an account. Does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<CreatedResponse, HrError> {
        validate_registration(request)?;

        self.session.set_loading(true);
        let result = self
            .post_json::<_, CreatedResponse>(REGISTER_ENDPOINT, request, "register")
            .await;
        self.session.set_loading(false);

        let created = result?;
        info!("Registered account for {}", request.email);
        Ok(created)
    }

    /// Drops the session and its credential. Local only.
    pub fn logout(&self) -> Result<(), HrError> {
        let email = self.session.user().map(|u| u.email);
        self.session.clear()?;
        info!("Logged out {}", email.as_deref().unwrap_or("<no session>"));
        Ok(())
    }

    /// Fetches the current user's profile and refreshes the stored copy.
    pub async fn me(&self) -> Result<User, HrError> {
        self.require_session()?;
        let user: User = self.get(ME_ENDPOINT, "current user").await?;
        self.session.refresh_user(user.clone())?;
        Ok(user)
    }

    pub async fn health(&self) -> Result<HealthResponse, HrError> {
        self.get(HEALTH_ENDPOINT, "health check").await
    }

    // --- Authorization helpers ---

    pub fn require_session(&self) -> Result<User, HrError> {
        let session = self.session.snapshot();
        match (session.authenticated, session.user) {
            (true, Some(user)) => Ok(user),
            _ => Err(HrError::NotAuthenticated),
        }
    }

    /// Refuses the action locally when the session's role is not in `allowed`.
    pub fn require_role(&self, allowed: &[Role], action: &str) -> Result<User, HrError> {
        let user = self.require_session()?;
        if allowed.contains(&user.role) {
            Ok(user)
        } else {
            Err(HrError::Forbidden {
                role: user.role.to_string(),
                action: action.to_string(),
            })
        }
    }

    // --- Request plumbing ---

    /// Checks that an id can be spliced into a URL path as a single segment.
    pub fn path_segment(id: &str) -> Result<&str, HrError> {
        let id = id.trim();
        if id.is_empty() || id.contains(['/', '?', '#', ' ']) {
            return Err(HrError::validation(vec![FieldError::UnknownReference {
                field: "id".to_string(),
                value: id.to_string(),
            }]));
        }
        Ok(id)
    }

    pub fn build_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, HrError> {
        let url = if endpoint.starts_with("http") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        };

        // Validate the final URL
        Url::parse(&url)?;

        let mut builder = self
            .http_client
            .request(method, &url)
            .header(ACCEPT, "application/json");

        if let Some(token) = self.session.token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        Ok(builder)
    }

    async fn execute(
        &self,
        request_builder: RequestBuilder,
        context_msg: &str,
    ) -> Result<(StatusCode, String, Vec<u8>), HrError> {
        let request = match request_builder.build() {
            Ok(req) => req,
            Err(e) => {
                error!("Request build failed for '{}': {}", context_msg, e);
                return Err(HrError::Network(e));
            }
        };
        let request_url = request.url().to_string();
        debug!("Sending {} request for '{}' to URL: {}", request.method(), context_msg, request_url);

        let resp = match self.http_client.execute(request).await {
            Ok(resp) => resp,
            Err(e) => {
                // Network, DNS, timeout etc.
                error!(
                    "HTTP execution failed before receiving response for '{}' (URL: {}): {}",
                    context_msg, request_url, e
                );
                return Err(HrError::Network(e));
            }
        };

        let status = resp.status();
        info!(
            "Received response for '{}' (URL: {}): Status={}",
            context_msg, request_url, status
        );

        if status.is_success() {
            let bytes = resp.bytes().await.map_err(|e| {
                error!("Failed to read response body bytes for '{}': {}", context_msg, e);
                HrError::Network(e)
            })?;
            return Ok((status, request_url, bytes.to_vec()));
        }

        let error_body = resp
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to read error body: {}", e));
        error!(
            "API Error Response: Status={}, Body='{}' for URL: {}",
            status, error_body, request_url
        );
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limit exceeded for '{}' (URL: {})", context_msg, request_url);
        }

        let message = extract_error_message(&error_body);
        Err(HrError::from_status(status, message))
    }

    pub async fn send_and_deserialize<T: DeserializeOwned>(
        &self,
        request_builder: RequestBuilder,
        context_msg: &str,
    ) -> Result<T, HrError> {
        let (_, request_url, bytes) = self.execute(request_builder, context_msg).await?;

        match std::str::from_utf8(&bytes) {
            Ok(text) => debug!("Raw Success Response Body for '{}': {}", context_msg, text),
            Err(_) => {
                warn!("Response body for '{}' is not valid UTF-8. Logging hex.", context_msg);
                debug!(
                    "Raw Success Response Body (Hex) for '{}': {}",
                    context_msg,
                    hex::encode(&bytes)
                );
            }
        }

        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            error!(
                "JSON deserialization failed for '{}' (URL: {}): {}",
                context_msg, request_url, e
            );
            HrError::Json(e)
        })
    }

    /// Sends a request whose success body is not needed.
    pub async fn send_discarding_body(
        &self,
        request_builder: RequestBuilder,
        context_msg: &str,
    ) -> Result<(), HrError> {
        let (status, _, _) = self.execute(request_builder, context_msg).await?;
        debug!("'{}' completed with {}", context_msg, status);
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, context_msg: &str) -> Result<T, HrError> {
        let request = self.build_request(Method::GET, endpoint)?;
        self.send_and_deserialize(request, context_msg).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
        context_msg: &str,
    ) -> Result<T, HrError> {
        let request = self.build_request(Method::POST, endpoint)?.json(body);
        self.send_and_deserialize(request, context_msg).await
    }

    /// `PUT {endpoint}?status=...`, the shape used for approvals.
    pub async fn put_status(&self, endpoint: &str, status: &str, context_msg: &str) -> Result<(), HrError> {
        let request = self
            .build_request(Method::PUT, endpoint)?
            .query(&[("status", status)]);
        self.send_discarding_body(request, context_msg).await
    }

    pub async fn delete(&self, endpoint: &str, context_msg: &str) -> Result<(), HrError> {
        let request = self.build_request(Method::DELETE, endpoint)?;
        self.send_discarding_body(request, context_msg).await
    }

    /// Uploads one file as multipart field `file`.
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        context_msg: &str,
    ) -> Result<T, HrError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);
        let request = self.build_request(Method::POST, endpoint)?.multipart(form);
        self.send_and_deserialize(request, context_msg).await
    }
}
