use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::Error;
use crate::error::FieldError;
use crate::session::SessionStore;

pub mod auth;
pub mod orders;
pub mod orgs;
pub mod products;

/// Thin wrapper over reqwest that knows the backend base url and the session
#[derive(Clone)]
pub struct ApiClient {
    api_url: String,
    http: Client,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(api_url: &str, session: SessionStore) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            http: Client::new(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Starts a request with the bearer token attached when signed in
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let req = self.http.request(method, url);
        match self.session.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.request(Method::PATCH, path)
    }

    /// Passes successful responses through, maps everything else to an Error.
    ///
    /// An unauthenticated response also drops the stored token.
    pub async fn check(&self, response: Response, resource: &str) -> Result<Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }

        let err = handle_response_error(response, resource).await;
        if let Error::Unauthenticated { .. } = err {
            warn!("Session expired, clearing stored token");
            if let Err(e) = self.session.clear() {
                warn!("Unable to clear session: {}", e);
            }
        }
        Err(err)
    }
}

/// Backends wrap payloads inconsistently, accept both the bare and the
/// `{ "data": ... }` forms.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Bare(T),
    Data { data: T },
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Bare(inner) => inner,
            Envelope::Data { data } => data,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    errors: Option<Value>,
}

impl ErrorBody {
    fn message(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .filter(|m| !m.trim().is_empty())
    }

    /// Accepts `{ field: msg }`, `{ field: [msg] }` and `[{ field|path, message|msg }]`
    fn fields(&self) -> Vec<FieldError> {
        let mut fields = Vec::new();
        match &self.errors {
            Some(Value::Object(map)) => {
                for (field, value) in map.iter() {
                    match value {
                        Value::String(msg) => fields.push(FieldError {
                            field: field.clone(),
                            message: msg.clone(),
                        }),
                        Value::Array(items) => {
                            for item in items.iter() {
                                if let Some(msg) = item.as_str() {
                                    fields.push(FieldError {
                                        field: field.clone(),
                                        message: msg.to_string(),
                                    });
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Some(Value::Array(items)) => {
                for item in items.iter() {
                    let field = item
                        .get("field")
                        .or_else(|| item.get("path"))
                        .and_then(|v| v.as_str());
                    let message = item
                        .get("message")
                        .or_else(|| item.get("msg"))
                        .and_then(|v| v.as_str());
                    if let (Some(field), Some(message)) = (field, message) {
                        fields.push(FieldError {
                            field: field.to_string(),
                            message: message.to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
        fields
    }
}

pub(crate) async fn handle_response_error(response: Response, resource: &str) -> Error {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.unwrap_or_default();
    classify_error(status, &body, resource)
}

/// Maps a failed status and its body to one of the error categories
pub(crate) fn classify_error(status: StatusCode, body: &ErrorBody, resource: &str) -> Error {
    let message = body.message();
    let fields = body.fields();

    match status {
        StatusCode::UNAUTHORIZED => Error::Unauthenticated {
            msg: message.unwrap_or("Your session has expired. Log in again.".to_string()),
        },
        StatusCode::FORBIDDEN => Error::Forbidden {
            msg: message.unwrap_or(format!("You do not have access to {}.", resource)),
        },
        StatusCode::NOT_FOUND => Error::NotFound {
            msg: message.unwrap_or(format!("Requested {} not found.", resource)),
        },
        StatusCode::UNPROCESSABLE_ENTITY => Error::Validation {
            msg: message.unwrap_or("Some fields are invalid.".to_string()),
            fields,
        },
        s if s.is_client_error() && !fields.is_empty() => Error::Validation {
            msg: message.unwrap_or("Some fields are invalid.".to_string()),
            fields,
        },
        s if s.is_server_error() => Error::Server {
            msg: message.unwrap_or("Server error. Try again later.".to_string()),
        },
        _ => Error::BadRequest {
            msg: message.unwrap_or(format!("Invalid request for {}.", resource)),
        },
    }
}
