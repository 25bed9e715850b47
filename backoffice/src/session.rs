use snafu::ResultExt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::Result;
use crate::error::{LoginRequiredSnafu, SessionReadSnafu, SessionWriteSnafu};
use crate::services::ApiClient;
use crate::services::auth::{login, verify};
use dto::user::{CredentialsDto, UserDto};

/// Holds the auth token, optionally persisted to a file.
///
/// Clones share the same token so a session cleared by one API call is
/// seen by every holder.
#[derive(Clone, Default)]
pub struct SessionStore {
    token: Arc<Mutex<Option<String>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Session that lives only as long as the process
    pub fn memory(token: Option<String>) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            path: None,
        }
    }

    /// Session backed by a file, a missing file means no session
    pub fn file(path: PathBuf) -> Result<Self> {
        let token = match fs::read_to_string(&path) {
            Ok(contents) => {
                let token = contents.trim().to_string();
                if token.is_empty() { None } else { Some(token) }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e).context(SessionReadSnafu { path }),
        };

        Ok(Self {
            token: Arc::new(Mutex::new(token)),
            path: Some(path),
        })
    }

    pub fn token(&self) -> Option<String> {
        self.lock().clone()
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context(SessionWriteSnafu { path: path.clone() })?;
            }
            fs::write(path, token).context(SessionWriteSnafu { path: path.clone() })?;
        }
        *self.lock() = Some(token.to_string());
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        *self.lock() = None;
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e).context(SessionWriteSnafu { path: path.clone() }),
            }
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A poisoned lock still holds a usable token
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthStatus {
    Authenticated(UserDto),
    LoginRequired,
}

/// Tracks who is signed in, verifying any stored token on load
pub struct AuthContext {
    client: ApiClient,
    status: AuthStatus,
}

impl AuthContext {
    /// Signed out context, the stored token is left untouched and unverified
    pub fn signed_out(client: ApiClient) -> Self {
        Self {
            client,
            status: AuthStatus::LoginRequired,
        }
    }

    pub async fn load(client: ApiClient) -> Result<Self> {
        let mut ctx = Self::signed_out(client);

        if ctx.client.session().token().is_none() {
            return Ok(ctx);
        }

        match verify(&ctx.client).await {
            Ok(user) => {
                ctx.status = AuthStatus::Authenticated(user);
            }
            Err(err) if err.requires_login() => {
                // Client already dropped the token
                warn!("Stored session is no longer valid");
            }
            Err(err) => return Err(err),
        }

        Ok(ctx)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<&UserDto> {
        let credentials = CredentialsDto {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let auth = login(&self.client, &credentials).await?;
        self.client.session().save(&auth.token)?;

        let user = match auth.user {
            Some(user) => user,
            None => verify(&self.client).await?,
        };
        info!("Logged in as {}", user.email);

        self.status = AuthStatus::Authenticated(user);
        self.user()
    }

    pub fn logout(&mut self) -> Result<()> {
        self.client.session().clear()?;
        self.status = AuthStatus::LoginRequired;
        Ok(())
    }

    pub fn status(&self) -> &AuthStatus {
        &self.status
    }

    pub fn user(&self) -> Result<&UserDto> {
        match &self.status {
            AuthStatus::Authenticated(user) => Ok(user),
            AuthStatus::LoginRequired => LoginRequiredSnafu.fail(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}
