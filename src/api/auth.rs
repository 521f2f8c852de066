use serde_json::json;

use crate::client::{ApiClient, RequestOptions};
use crate::error::Result;
use crate::types::{AuthToken, MessageResponse, RegisterRequest, User};

/// Account endpoints.
///
/// Login and registration store the issued token in the client's session, so
/// every later call through any clone of the client is authenticated.
#[derive(Clone, Debug)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthToken> {
        let token: AuthToken = self
            .client
            .post("/auth/register", request, RequestOptions::new())
            .await?;
        self.client.session().set(token.access_token.clone());
        Ok(token)
    }

    /// Log in with the form-encoded password flow.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken> {
        let token: AuthToken = self
            .client
            .post_form(
                "/auth/login",
                &[("username", email), ("password", password)],
                RequestOptions::new(),
            )
            .await?;
        self.client.session().set(token.access_token.clone());
        tracing::info!(email, "logged in");
        Ok(token)
    }

    pub async fn current_user(&self) -> Result<User> {
        self.client.get("/auth/me", RequestOptions::new()).await
    }

    /// Forget the credential.  The service keeps no session state.
    pub fn logout(&self) {
        self.client.session().clear();
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse> {
        self.client
            .post(
                "/auth/forgot-password",
                &json!({ "email": email }),
                RequestOptions::new(),
            )
            .await
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<MessageResponse> {
        self.client
            .post(
                "/auth/reset-password",
                &json!({ "token": token, "new_password": new_password }),
                RequestOptions::new(),
            )
            .await
    }
}
