use crate::client::PyLoadError::*;
use crate::entities::{Command, Destination, LoginResponse, StatusServerResponse};
use log::debug;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::borrow::Cow;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Errors surfaced by the [`PyLoadApi`] client
#[derive(Error, Debug)]
pub enum PyLoadError {
    /// Transport failure or a non-success HTTP status other than 401
    #[error("{message}")]
    CannotConnect {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Rejected credentials or an invalid/expired session cookie
    #[error("{0}")]
    InvalidAuth(String),

    /// Response body is not the JSON that was expected
    #[error("{message}")]
    Parser {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl PyLoadError {
    fn connect(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        CannotConnect {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    fn parser(message: impl Into<String>, source: serde_json::Error) -> Self {
        Parser {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Wraps a connection failure under a command-specific message.
    /// Other kinds are returned untouched.
    fn annotate(self, message: &str) -> Self {
        match self {
            err @ CannotConnect { .. } => Self::connect(message, err),
            other => other,
        }
    }
}

pub type Result<T, E = PyLoadError> = std::result::Result<T, E>;

/// A single POST form value
///
/// The API expects every field to be JSON-encoded on its own rather than one
/// JSON document for the whole body. Raw bytes are sent as an escaped byte
/// literal (`b'...'`), which keeps non-UTF-8 data intact.
#[derive(Debug, Clone)]
pub enum FormField<'a> {
    Json(Value),
    Bytes(&'a [u8]),
}

impl FormField<'_> {
    fn render(&self) -> Cow<'_, str> {
        match self {
            FormField::Json(value) => Cow::Owned(value.to_string()),
            FormField::Bytes(data) => Cow::Owned(bytes_literal(data)),
        }
    }
}

/// Renders bytes as `b'...'`: printable ASCII as is, `\t` `\n` `\r` `\\` and
/// the quote escaped, everything else as `\xNN`. Double quotes delimit the
/// literal when it contains `'` but no `"`.
fn bytes_literal(data: &[u8]) -> String {
    let quote = if data.contains(&b'\'') && !data.contains(&b'"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(data.len() + 3);
    out.push('b');
    out.push(quote);
    for &byte in data {
        match byte {
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\\' => out.push_str("\\\\"),
            _ if char::from(byte) == quote => {
                out.push('\\');
                out.push(quote);
            }
            0x20..=0x7e => out.push(char::from(byte)),
            _ => out.push_str(&format!("\\x{byte:02x}")),
        }
    }
    out.push(quote);
    out
}

impl From<Value> for FormField<'_> {
    fn from(value: Value) -> Self {
        FormField::Json(value)
    }
}

impl<'a> From<&'a [u8]> for FormField<'a> {
    fn from(data: &'a [u8]) -> Self {
        FormField::Bytes(data)
    }
}

/// Builds a session suitable for [`PyLoadApi`]: cookies are kept so a login
/// carries over to subsequent calls.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized
pub fn new_session(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().cookie_store(true).timeout(timeout).build()
}

/// pyLoad API client
///
/// Borrows a session owned by the caller for its whole lifetime. The session
/// holds the login cookie; the client never creates or closes it.
#[derive(Debug)]
pub struct PyLoadApi<'a> {
    session: &'a Client,
    pub api_url: String,
    pub username: String,
    pub password: String,
}

impl<'a> PyLoadApi<'a> {
    /// Creates a new client. `api_url` must end with `/`.
    ///
    /// No request is made and nothing is validated until the first call.
    pub fn new(
        session: &'a Client,
        api_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            session,
            api_url: api_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Logs in with the stored credentials
    ///
    /// The server-issued cookie is stored by the session and sent with every
    /// later call.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request fails or the server answers with a non-success status
    /// - The credentials are rejected (empty or falsy body)
    /// - The body can't be parsed into a [`LoginResponse`]
    pub async fn login(&self) -> Result<LoginResponse> {
        let url = format!("{}api/login", self.api_url);
        let params = [
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .session
            .post(&url)
            .form(&params)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| {
                debug!("Exception: Cannot login: {e}");
                Self::connect_error("Login failed due to request exception", e)
            })?;

        debug!("Response from {} [{}]", url, response.status());

        let data = Self::read_json(response)
            .await
            .map_err(|e| e.annotate("Login failed due to request exception"))?
            .map_err(|e| {
                debug!("Exception: Cannot parse login response: {e}");
                PyLoadError::parser("Login failed during parsing of request response", e)
            })?;

        if is_falsy(&data) {
            return Err(InvalidAuth("Login failed, invalid username or password".into()));
        }

        serde_json::from_value(data).map_err(|e| {
            debug!("Exception: Cannot parse login response: {e}");
            PyLoadError::parser("Login failed during parsing of request response", e)
        })
    }

    /// Executes a command with a GET request and returns the decoded body
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request fails or the server answers with a non-success status
    /// - The session is invalid or expired (HTTP 401)
    /// - The body is not valid JSON
    pub async fn get(&self, command: Command, params: Option<&[(&str, &str)]>) -> Result<Value> {
        let url = self.command_url(command);
        let mut request = self.session.get(&url);
        if let Some(params) = params {
            request = request.query(params);
        }

        let response = request.send().await.map_err(|e| {
            debug!("Exception: Cannot execute command {command}: {e}");
            Self::connect_error(
                format!("Executing command {command} failed due to request exception"),
                e,
            )
        })?;

        self.handle_response(command, response).await
    }

    /// Executes a command with a POST request and returns the decoded body
    ///
    /// Each field value is rendered by [`FormField`] and the body is sent
    /// form-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request fails or the server answers with a non-success status
    /// - The session is invalid or expired (HTTP 401)
    /// - The body is not valid JSON
    pub async fn post(&self, command: Command, data: &[(&str, FormField<'_>)]) -> Result<Value> {
        let url = self.command_url(command);
        let form: Vec<(&str, Cow<'_, str>)> = data
            .iter()
            .map(|(key, value)| (*key, value.render()))
            .collect();

        let response = self
            .session
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                debug!("Exception: Cannot execute command {command}: {e}");
                Self::connect_error(
                    format!("Executing command {command} failed due to request exception"),
                    e,
                )
            })?;

        self.handle_response(command, response).await
    }

    /// Gets general status information of pyLoad
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    /// - Response cannot be parsed
    pub async fn get_status(&self) -> Result<StatusServerResponse> {
        let data = self
            .get(Command::Status, None)
            .await
            .map_err(|e| e.annotate("Get status failed due to request exception"))?;

        decode(Command::Status, data)
    }

    /// Pauses the download queue
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    pub async fn pause(&self) -> Result<()> {
        self.get(Command::Pause, None)
            .await
            .map_err(|e| e.annotate("Pausing download queue failed due to request exception"))?;
        Ok(())
    }

    /// Unpauses the download queue
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    pub async fn unpause(&self) -> Result<()> {
        self.get(Command::Unpause, None)
            .await
            .map_err(|e| e.annotate("Unpausing download queue failed due to request exception"))?;
        Ok(())
    }

    /// Toggles the pause state of the download queue
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    pub async fn toggle_pause(&self) -> Result<()> {
        self.get(Command::TogglePause, None).await.map_err(|e| {
            e.annotate("Toggling pause download queue failed due to request exception")
        })?;
        Ok(())
    }

    /// Aborts all running downloads
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    pub async fn stop_all_downloads(&self) -> Result<()> {
        self.get(Command::AbortAll, None).await.map_err(|e| {
            e.annotate("Aborting all running downloads failed due to request exception")
        })?;
        Ok(())
    }

    /// Restarts all failed downloads
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    pub async fn restart_failed(&self) -> Result<()> {
        self.get(Command::RestartFailed, None).await.map_err(|e| {
            e.annotate("Restarting all failed files failed due to request exception")
        })?;
        Ok(())
    }

    /// Toggles the auto-reconnect function
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    pub async fn toggle_reconnect(&self) -> Result<()> {
        self.get(Command::ToggleReconnect, None)
            .await
            .map_err(|e| e.annotate("Toggling reconnect failed due to request exception"))?;
        Ok(())
    }

    /// Deletes all finished files and completely finished packages
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    pub async fn delete_finished(&self) -> Result<()> {
        self.get(Command::DeleteFinished, None).await.map_err(|e| {
            e.annotate("Deleting all finished files failed due to request exception")
        })?;
        Ok(())
    }

    /// Restarts the pyLoad core
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    pub async fn restart(&self) -> Result<()> {
        self.get(Command::Restart, None)
            .await
            .map_err(|e| e.annotate("Restarting pyLoad core failed due to request exception"))?;
        Ok(())
    }

    /// Gets the pyLoad version
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    /// - Response cannot be parsed
    pub async fn version(&self) -> Result<String> {
        let data = self
            .get(Command::Version, None)
            .await
            .map_err(|e| e.annotate("Get version failed due to request exception"))?;

        Ok(match data {
            Value::String(version) => version,
            other => other.to_string(),
        })
    }

    /// Gets the free space at the download directory in bytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    /// - Response is not an integer
    pub async fn free_space(&self) -> Result<u64> {
        let data = self
            .get(Command::FreeSpace, None)
            .await
            .map_err(|e| e.annotate("Get free space failed due to request exception"))?;

        coerce_integer(Command::FreeSpace, data)
    }

    /// Adds a new package with the given links and returns its id
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    /// - Response is not an integer package id
    pub async fn add_package(
        &self,
        name: &str,
        links: &[String],
        destination: Destination,
    ) -> Result<u64> {
        debug!(
            "Adding package {name} with {} links to {destination:?}",
            links.len()
        );

        let data = [
            ("name", FormField::from(json!(name))),
            ("links", FormField::from(json!(links))),
            ("dest", FormField::from(json!(destination))),
        ];

        let response = self
            .post(Command::AddPackage, &data)
            .await
            .map_err(|e| e.annotate("Adding package failed due to request exception"))?;

        coerce_integer(Command::AddPackage, response)
    }

    /// Uploads a container file (e.g. DLC) to pyLoad
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Network request fails
    /// - Session is invalid or expired
    /// - Response body is not valid JSON
    pub async fn upload_container(&self, filename: &str, data: &[u8]) -> Result<()> {
        debug!(
            "Uploading container {filename}, size: {} bytes",
            data.len()
        );

        let fields = [
            ("filename", FormField::from(json!(filename))),
            ("data", FormField::from(data)),
        ];

        self.post(Command::UploadContainer, &fields)
            .await
            .map_err(|e| e.annotate("Uploading container failed due to request exception"))?;
        Ok(())
    }

    fn command_url(&self, command: Command) -> String {
        format!("{}api/{}", self.api_url, command)
    }

    fn connect_error(message: impl Into<String>, e: reqwest::Error) -> PyLoadError {
        PyLoadError::connect(message, e)
    }

    /// Maps the status and decodes the body of a command response
    async fn handle_response(&self, command: Command, response: Response) -> Result<Value> {
        let status = response.status();
        debug!("Response from {} [{}]", response.url(), status);

        // An expired session is reported before any other status handling
        if status == StatusCode::UNAUTHORIZED {
            return Err(InvalidAuth(
                "Request failed due invalid or expired authentication cookie".into(),
            ));
        }

        let response = response.error_for_status().map_err(|e| {
            debug!("Exception: Command {command} returned {status}");
            Self::connect_error(
                format!("Executing command {command} failed due to request exception"),
                e,
            )
        })?;

        Self::read_json(response)
            .await
            .map_err(|e| {
                PyLoadError::connect(
                    format!("Executing command {command} failed due to request exception"),
                    e,
                )
            })?
            .map_err(|e| {
                debug!("Exception: Cannot parse response for {command}: {e}");
                PyLoadError::parser(
                    format!("Get {command} failed during parsing of request response"),
                    e,
                )
            })
    }

    /// Reads the body. The outer error is a transport failure, the inner one
    /// a decoding failure. An empty body decodes to `null`.
    async fn read_json(
        response: Response,
    ) -> Result<std::result::Result<Value, serde_json::Error>> {
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::connect_error("Reading response body failed", e))?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Ok(Value::Null));
        }

        Ok(serde_json::from_slice(&body))
    }
}

fn decode<T: DeserializeOwned>(command: Command, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| {
        debug!("Exception: Unexpected response shape for {command}: {e}");
        PyLoadError::parser(
            format!("Get {command} failed during parsing of request response"),
            e,
        )
    })
}

/// Accepts a JSON number or a numeric string
fn coerce_integer(command: Command, data: Value) -> Result<u64> {
    match data {
        Value::String(text) => text.trim().parse().map_err(|_| Parser {
            message: format!("Response for {command} is not an integer: {text:?}"),
            source: None,
        }),
        other => decode(command, other),
    }
}

/// Mirrors JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are falsy
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
