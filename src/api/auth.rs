use custom_error::custom_error;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{ApiRequest, Envelope, SessionClient};
use crate::error::ClientError;
use crate::navigation::Navigation;
use crate::routes;
use crate::session::{Role, Session, UserId};
use crate::session_storage::StoreError;

pub const LOGIN_ENDPOINT: &str = "/auth/login";
pub const REGISTER_ENDPOINT: &str = "/auth/register";
pub const CHECK_ROLE_ENDPOINT: &str = "/auth/check-role";

custom_error! {
    pub AuthError
        Client{source: ClientError} = "{source}",
        Registration{failure: ClientError} = "registration failed: {failure}",
        Rejected{message: String} = "{message}",
        NotAdmin = "Unauthorized: Admin access only",
        MissingCredentials = "Please enter both username and password",
        PasswordMismatch = "Passwords do not match.",
        Store{source: StoreError} = "could not store session: {source}",
}

impl AuthError {
    /// Text suitable for showing next to a login or registration form.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Client { source } => source
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| "Login failed. Please check your credentials.".to_string()),
            AuthError::Registration { failure } => failure
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| "An error occurred. Please try again.".to_string()),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    is_admin: bool,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    success: bool,
    data: Option<LoginData>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
    user: LoginUser,
}

#[derive(Debug, Deserialize)]
struct LoginUser {
    id: UserId,
    role: Role,
}

#[derive(Debug, Deserialize)]
struct RoleData {
    role: Role,
}

/// Which login page a logout returns to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginArea {
    Customer,
    Admin,
}

impl LoginArea {
    pub fn login_path(self) -> &'static str {
        match self {
            LoginArea::Customer => routes::CUSTOMER_LOGIN,
            LoginArea::Admin => routes::ADMIN_LOGIN,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RegistrationForm {
    pub email: String,
    pub username: String,
    pub phone: String,
    pub password: String,
    #[serde(skip)]
    pub confirm_password: String,
}

#[derive(Clone, Debug)]
pub struct AuthApi {
    client: SessionClient,
}

impl AuthApi {
    pub fn new(client: SessionClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    /// Customer login. Stores the session and moves to the storefront home.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let data = self.authenticate(username, password, false).await?;
        let session = self.establish(data)?;
        self.client.navigate(Navigation::push(routes::CUSTOMER_HOME));
        Ok(session)
    }

    /// Admin console login. Only sessions whose user is an admin are stored.
    pub async fn login_admin(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let data = self.authenticate(username, password, true).await?;
        if data.user.role != Role::Admin {
            info!(username, role = %data.user.role, "non-admin account refused at admin login");
            return Err(AuthError::NotAdmin);
        }

        let session = self.establish(data)?;
        self.client
            .navigate(Navigation::replace(routes::ADMIN_HOME, None));
        Ok(session)
    }

    pub async fn register(&self, form: &RegistrationForm) -> Result<(), AuthError> {
        if form.password != form.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let request = ApiRequest::post(REGISTER_ENDPOINT)
            .json(form)
            .map_err(|source| AuthError::Client { source })?;
        self.client
            .send(request)
            .await
            .map_err(|failure| AuthError::Registration { failure })?;

        info!(username = %form.username, "account registered");
        Ok(())
    }

    /// Asks the backend for the role behind the stored token.
    pub async fn check_role(&self) -> Result<Role, ClientError> {
        let envelope: Envelope<RoleData> = self
            .client
            .send_json(ApiRequest::get(CHECK_ROLE_ENDPOINT))
            .await?;
        Ok(envelope.data.role)
    }

    pub fn logout(&self, area: LoginArea) -> Result<(), AuthError> {
        self.client
            .session()
            .clear()
            .map_err(|source| AuthError::Store { source })?;
        info!(area = ?area, "logged out");
        self.client
            .navigate(Navigation::replace(area.login_path(), None));
        Ok(())
    }

    async fn authenticate(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<LoginData, AuthError> {
        let request = ApiRequest::post(LOGIN_ENDPOINT)
            .json(&LoginRequest {
                username,
                password,
                is_admin,
            })
            .map_err(|source| AuthError::Client { source })?;

        let response: LoginResponse = self
            .client
            .send_json(request)
            .await
            .map_err(|source| AuthError::Client { source })?;

        match response {
            LoginResponse {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            LoginResponse { message, .. } => Err(AuthError::Rejected {
                message: message.unwrap_or_else(|| "Login failed".to_string()),
            }),
        }
    }

    fn establish(&self, data: LoginData) -> Result<Session, AuthError> {
        let LoginData { token, user } = data;
        self.client
            .session()
            .persist(&token, &user.id, user.role)
            .map_err(|source| AuthError::Store { source })?;
        self.client.session_established();
        debug!(user_id = %user.id, role = %user.role, "session established");

        Ok(Session {
            token: Some(token),
            user_id: Some(user.id),
            role: Some(user.role),
        })
    }
}
