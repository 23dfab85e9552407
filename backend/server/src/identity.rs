//! # Identity Provider
//!
//! Email/password accounts live with a hosted identity service. The server is
//! only a client: it creates accounts, checks credentials and, when a
//! registration cannot be completed, deletes the account it just created.
//!
//! Error codes arrive as upper-case strings in `error.message`, sometimes with
//! a trailing explanation (`WEAK_PASSWORD : Password should be at least 6 characters`).
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::session::SessionHandle;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("auth/email-already-in-use")]
    EmailInUse,

    #[error("auth/weak-password")]
    WeakPassword,

    #[error("auth/user-not-found")]
    UserNotFound,

    #[error("auth/wrong-password")]
    WrongPassword,

    #[error("auth/error: {0}")]
    Other(String),
}

impl IdentityError {
    pub fn from_code(code: &str) -> Self {
        let head = code.split([' ', ':']).next().unwrap_or_default();

        match head {
            "EMAIL_EXISTS" => IdentityError::EmailInUse,
            "WEAK_PASSWORD" => IdentityError::WeakPassword,
            "EMAIL_NOT_FOUND" => IdentityError::UserNotFound,
            "INVALID_PASSWORD" => IdentityError::WrongPassword,
            _ => IdentityError::Other(code.to_string()),
        }
    }
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        IdentityError::Other(e.to_string())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionHandle, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, IdentityError>;

    async fn delete_account(&self, handle: &SessionHandle) -> Result<(), IdentityError>;
}

/// REST client for the hosted identity toolkit.
pub struct IdentityToolkit {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    id_token: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityToolkit {
    pub fn new(client: Client, endpoint: &str, api_key: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn method_url(&self, method: &str) -> Result<Url, IdentityError> {
        let raw = format!("{}/accounts:{method}", self.endpoint);

        Url::parse_with_params(&raw, [("key", self.api_key.as_str())])
            .map_err(|e| IdentityError::Other(format!("invalid identity endpoint: {e}")))
    }

    async fn call<B: Serialize + Sync>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<reqwest::Response, IdentityError> {
        debug!(method, "Calling identity provider");

        let response = self
            .client
            .post(self.method_url(method)?)
            .json(body)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        Err(match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => IdentityError::from_code(&envelope.error.message),
            Err(_) => IdentityError::Other(format!("{status}: {text}")),
        })
    }

    async fn password_call(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionHandle, IdentityError> {
        let request = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };

        let account: AccountResponse = self.call(method, &request).await?.json().await?;

        Ok(SessionHandle {
            user_id: account.local_id,
            email: account.email,
            id_token: account.id_token,
        })
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkit {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionHandle, IdentityError> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, IdentityError> {
        self.password_call("signInWithPassword", email, password).await
    }

    async fn delete_account(&self, handle: &SessionHandle) -> Result<(), IdentityError> {
        let request = DeleteRequest {
            id_token: &handle.id_token,
        };

        self.call("delete", &request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            IdentityError::from_code("EMAIL_EXISTS"),
            IdentityError::EmailInUse
        );
        assert_eq!(
            IdentityError::from_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            IdentityError::WeakPassword
        );
        assert_eq!(
            IdentityError::from_code("EMAIL_NOT_FOUND"),
            IdentityError::UserNotFound
        );
        assert_eq!(
            IdentityError::from_code("INVALID_PASSWORD"),
            IdentityError::WrongPassword
        );
        assert_eq!(
            IdentityError::from_code("TOO_MANY_ATTEMPTS_TRY_LATER"),
            IdentityError::Other("TOO_MANY_ATTEMPTS_TRY_LATER".to_string())
        );
    }

    #[test]
    fn test_method_url() {
        let toolkit = IdentityToolkit::new(
            Client::new(),
            "https://identitytoolkit.example.com/v1/",
            "k3y",
        );

        assert_eq!(
            toolkit.method_url("signUp").unwrap().as_str(),
            "https://identitytoolkit.example.com/v1/accounts:signUp?key=k3y"
        );
    }

    #[test]
    fn test_error_text_names_code() {
        assert!(
            IdentityError::EmailInUse
                .to_string()
                .contains("email-already-in-use")
        );
    }

    /// Answers like the hosted toolkit: one account, error envelopes otherwise.
    async fn stub_toolkit() -> IdentityToolkit {
        let router = Router::new()
            .route(
                "/accounts:signUp",
                post(|| async {
                    Json(json!({
                        "localId": "u1",
                        "email": "ada@example.org",
                        "idToken": "t1"
                    }))
                }),
            )
            .route(
                "/accounts:signInWithPassword",
                post(|| async {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": { "code": 400, "message": "EMAIL_NOT_FOUND" } })),
                    )
                }),
            )
            .route(
                "/accounts:delete",
                post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let client = Client::builder().no_proxy().build().unwrap();
        IdentityToolkit::new(client, &endpoint, "k3y")
    }

    #[tokio::test]
    async fn test_sign_up_reads_account() {
        let handle = stub_toolkit()
            .await
            .sign_up("ada@example.org", "analytical")
            .await
            .unwrap();

        assert_eq!(handle.user_id, "u1");
        assert_eq!(handle.email, "ada@example.org");
        assert_eq!(handle.id_token, "t1");
    }

    #[tokio::test]
    async fn test_error_envelope_maps_code() {
        let result = stub_toolkit()
            .await
            .sign_in("ghost@example.org", "whatever")
            .await;

        assert_eq!(result, Err(IdentityError::UserNotFound));
    }

    #[tokio::test]
    async fn test_plain_error_body_kept() {
        let handle = SessionHandle {
            user_id: "u1".to_string(),
            email: "ada@example.org".to_string(),
            id_token: "t1".to_string(),
        };

        match stub_toolkit().await.delete_account(&handle).await {
            Err(IdentityError::Other(text)) => {
                assert!(text.starts_with("502"));
                assert!(text.ends_with("upstream down"));
            }
            other => panic!("expected a plain error, got {other:?}"),
        }
    }
}
