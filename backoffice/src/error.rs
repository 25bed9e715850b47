use serde::Serialize;
use snafu::{Backtrace, Snafu};
use std::path::PathBuf;
use validator::ValidationErrors;

use dto::order::OrderStatus;

pub type Result<T> = std::result::Result<T, Error>;

/// Field level message returned by the backend or by local form validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Error reading config file: {}", source))]
    ConfigFile {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Error parsing config file: {}", source))]
    ConfigParse {
        source: toml::de::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Config error: {}", msg))]
    Config { msg: String },

    #[snafu(display("Unable to read session file {:?}: {}", path, source))]
    SessionRead {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Unable to write session file {:?}: {}", path, source))]
    SessionWrite {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("{}: {}", msg, source))]
    HttpClient {
        msg: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("{}: {}", msg, source))]
    HttpResponseParse {
        msg: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("{}", msg))]
    BadRequest { msg: String },

    #[snafu(display("{}", msg))]
    Unauthenticated { msg: String },

    #[snafu(display("{}", msg))]
    Forbidden { msg: String },

    #[snafu(display("{}", msg))]
    NotFound { msg: String },

    #[snafu(display("{}", msg))]
    Validation { msg: String, fields: Vec<FieldError> },

    #[snafu(display("{}", msg))]
    Server { msg: String },

    #[snafu(display("Login to continue"))]
    LoginRequired,

    #[snafu(display("Order {} is already {} and can no longer be reviewed", order_id, status))]
    InvalidTransition {
        order_id: String,
        status: OrderStatus,
    },

    #[snafu(display("A request is already in progress. Wait for it to finish."))]
    Busy,

    #[snafu(display("Request cancelled"))]
    Cancelled,

    #[snafu(display("No data to export"))]
    NoData,

    #[snafu(display("Unable to serialize records: {}", source))]
    ExportSerialize {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Unable to write export: {}", source))]
    ExportCsv {
        source: csv::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Unable to flush export: {}", source))]
    ExportFlush {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Unable to create file: {:?}", path))]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to render template: {}", source))]
    Template {
        source: askama::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("{}: {}", msg, source))]
    Prompt {
        msg: String,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("{}", msg))]
    Whatever { msg: String },
}

// Allow string slices to be converted to Error
impl From<&str> for Error {
    fn from(val: &str) -> Self {
        Self::Whatever {
            msg: val.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(val: String) -> Self {
        Self::Whatever { msg: val }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation {
            msg: "Some fields are invalid. Fix them and submit again.".to_string(),
            fields: flatten_errors(&errors),
        }
    }
}

/// Collects validator errors into field messages, sorted by field name
pub fn flatten_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                },
            })
        })
        .collect();

    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// Operator facing error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    SessionExpired,
    PermissionDenied,
    NotFound,
    Validation,
    BadRequest,
    Server,
    Config,
    NoData,
    Busy,
    Local,
}

/// What the operator can do about an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Session is gone, go back to the login screen
    Login,
    /// Transient failure, the operator may try again
    Retry,
    /// Input needs fixing before resubmitting
    Fix,
    Dismiss,
}

impl ErrorCategory {
    pub fn title(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Network Error",
            ErrorCategory::SessionExpired => "Session Expired",
            ErrorCategory::PermissionDenied => "Permission Denied",
            ErrorCategory::NotFound => "Not Found",
            ErrorCategory::Validation => "Validation Failed",
            ErrorCategory::BadRequest => "Bad Request",
            ErrorCategory::Server => "Server Error",
            ErrorCategory::Config => "Configuration Error",
            ErrorCategory::NoData => "No Data",
            ErrorCategory::Busy => "Busy",
            ErrorCategory::Local => "Error",
        }
    }

    pub fn recovery(&self) -> Recovery {
        match self {
            ErrorCategory::SessionExpired => Recovery::Login,
            ErrorCategory::Network | ErrorCategory::Server | ErrorCategory::Busy => Recovery::Retry,
            ErrorCategory::Validation | ErrorCategory::BadRequest | ErrorCategory::Config => {
                Recovery::Fix
            }
            _ => Recovery::Dismiss,
        }
    }
}

impl From<&Error> for ErrorCategory {
    fn from(err: &Error) -> Self {
        match err {
            Error::HttpClient { .. } => ErrorCategory::Network,
            Error::HttpResponseParse { .. } => ErrorCategory::Server,
            Error::BadRequest { .. } => ErrorCategory::BadRequest,
            Error::Unauthenticated { .. } => ErrorCategory::SessionExpired,
            Error::LoginRequired => ErrorCategory::SessionExpired,
            Error::Forbidden { .. } => ErrorCategory::PermissionDenied,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::Server { .. } => ErrorCategory::Server,
            Error::ConfigFile { .. } => ErrorCategory::Config,
            Error::ConfigParse { .. } => ErrorCategory::Config,
            Error::Config { .. } => ErrorCategory::Config,
            Error::NoData => ErrorCategory::NoData,
            Error::Busy => ErrorCategory::Busy,
            _ => ErrorCategory::Local,
        }
    }
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from(self)
    }

    pub fn requires_login(&self) -> bool {
        self.category() == ErrorCategory::SessionExpired
    }
}

/// Dismissible notification built from an error
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub category: ErrorCategory,
    pub title: String,
    pub message: String,
    pub fields: Vec<FieldError>,
    pub recovery: Recovery,
}

impl From<&Error> for ErrorInfo {
    fn from(e: &Error) -> Self {
        let category = e.category();
        let fields = match e {
            Error::Validation { fields, .. } => fields.clone(),
            _ => Vec::new(),
        };
        Self {
            category,
            title: category.title().to_string(),
            message: e.to_string(),
            fields,
            recovery: category.recovery(),
        }
    }
}

impl core::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)?;
        for field in self.fields.iter() {
            write!(f, "\n  - {}: {}", field.field, field.message)?;
        }
        Ok(())
    }
}
