//! Blocking HTTP client for the expense backend (auth + expenses CRUD).

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{Result, SpendError};
use crate::models::{ExpenseId, ExpensePayload, ExpenseRecord, ExpenseWire, NewExpense};
use crate::session::SessionContext;
use crate::settings::Settings;

/// Remote side of the record store. The mutation coordinator only talks to
/// the backend through this trait.
pub trait ExpenseBackend {
    fn fetch_expenses(&mut self) -> Result<Vec<ExpenseRecord>>;

    /// Returns the stored record when the backend echoes it back.
    fn create_expense(&mut self, new: &NewExpense) -> Result<Option<ExpenseRecord>>;

    fn update_expense(&mut self, record: &ExpenseRecord) -> Result<()>;

    fn delete_expense(&mut self, id: &ExpenseId) -> Result<()>;
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(settings: &Settings, session: SessionContext) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.effective_api_url(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST /auth. On success the token is stored in the session.
    pub fn login(&mut self, user: &str, pwd: &str) -> Result<()> {
        tracing::debug!(user = %user, url = %self.url("/auth"), "logging in");
        let body = serde_json::json!({ "user": user, "pwd": pwd });
        let resp = self.http.post(self.url("/auth")).json(&body).send()?;
        let resp = ensure_success(resp)?;
        let token: TokenResponse = resp.json()?;
        if token.access_token.is_empty() {
            return Err(SpendError::Remote {
                status: 200,
                message: "No access token in response".to_string(),
            });
        }
        self.session.begin(user, token.access_token)
    }

    /// POST /register. Does not log in.
    pub fn register(&mut self, user: &str, pwd: &str) -> Result<()> {
        tracing::debug!(user = %user, "registering");
        let body = serde_json::json!({ "user": user, "pwd": pwd });
        let resp = self.http.post(self.url("/register")).json(&body).send()?;
        ensure_success(resp)?;
        Ok(())
    }

    /// Attach the bearer token and send. A 401/403 expires the session.
    fn send_authed(&mut self, req: RequestBuilder) -> Result<Response> {
        let token = self.session.bearer()?.to_string();
        let resp = req.bearer_auth(token).send()?;
        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::warn!(status = %resp.status(), "backend rejected session token");
            self.session.expire()?;
            return Err(SpendError::AuthRequired);
        }
        ensure_success(resp)
    }
}

impl ExpenseBackend for ApiClient {
    fn fetch_expenses(&mut self) -> Result<Vec<ExpenseRecord>> {
        let req = self.http.get(self.url("/expenses"));
        let resp = self.send_authed(req)?;
        let wire: Vec<ExpenseWire> = resp.json()?;
        tracing::debug!(count = wire.len(), "fetched expenses");
        wire.into_iter().map(ExpenseRecord::try_from).collect()
    }

    fn create_expense(&mut self, new: &NewExpense) -> Result<Option<ExpenseRecord>> {
        let req = self
            .http
            .post(self.url("/expenses"))
            .json(&ExpensePayload::for_create(new));
        let resp = self.send_authed(req)?;
        let text = resp.text()?;
        Ok(decode_echo(&text))
    }

    fn update_expense(&mut self, record: &ExpenseRecord) -> Result<()> {
        let req = self
            .http
            .put(self.url("/expenses"))
            .json(&ExpensePayload::for_update(record));
        self.send_authed(req)?;
        Ok(())
    }

    fn delete_expense(&mut self, id: &ExpenseId) -> Result<()> {
        let body = serde_json::json!({ "id": id.as_str() });
        let req = self.http.delete(self.url("/expenses")).json(&body);
        self.send_authed(req)?;
        Ok(())
    }
}

/// Backends differ in what POST /expenses returns; take the record if one is
/// there and decodes cleanly.
fn decode_echo(text: &str) -> Option<ExpenseRecord> {
    let wire: ExpenseWire = serde_json::from_str(text).ok()?;
    match ExpenseRecord::try_from(wire) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!("ignoring undecodable create response: {e}");
            None
        }
    }
}

fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().unwrap_or_default();
    Err(SpendError::Remote {
        status: status.as_u16(),
        message: error_message(status, &text),
    })
}

/// Prefer the backend's `{"message": ...}`, then the raw body, then the
/// status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if !parsed.message.is_empty() {
            return parsed.message;
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unexpected response")
        .to_string()
}


#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;
    use crate::session::SessionState;

    /// Answer one request with `response` and hand back the raw request head.
    fn serve_once(response: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head: Vec<u8> = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&head).to_string()
        });
        (url, handle)
    }

    fn logged_in_client(url: String, path: &std::path::Path) -> ApiClient {
        let mut session = SessionContext::load_from(path.to_path_buf());
        session.begin("alice", "tok-123".to_string()).unwrap();
        let settings = Settings {
            api_url: url,
            ..Settings::default()
        };
        ApiClient::new(&settings, session).unwrap()
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        let msg = error_message(StatusCode::CONFLICT, r#"{"message":"Username taken"}"#);
        assert_eq!(msg, "Username taken");
    }

    #[test]
    fn test_error_message_falls_back_to_body_then_reason() {
        assert_eq!(error_message(StatusCode::BAD_REQUEST, "bad date\n"), "bad date");
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "Internal Server Error"
        );
    }

    #[test]
    fn test_decode_echo_accepts_full_record() {
        let text = r#"{"_id":"n1","date":"2024-05-01","item":"Tea","amount":"20","bankName":"SBI","transferMode":"Cash"}"#;
        let record = decode_echo(text).unwrap();
        assert_eq!(record.id.as_str(), "n1");
    }

    #[test]
    fn test_decode_echo_ignores_status_bodies() {
        assert!(decode_echo(r#"{"message":"Created"}"#).is_none());
        assert!(decode_echo("").is_none());
    }

    #[test]
    fn test_fetch_sends_bearer_token() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n[]",
        );
        let dir = tempfile::tempdir().unwrap();
        let mut client = logged_in_client(url, &dir.path().join("session.json"));

        assert!(client.fetch_expenses().unwrap().is_empty());
        let head = server.join().unwrap().to_lowercase();
        assert!(head.starts_with("get /expenses "));
        assert!(head.contains("authorization: bearer tok-123"));
    }

    #[test]
    fn test_rejected_token_expires_session() {
        let (url, server) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut client = logged_in_client(url, &path);

        assert!(matches!(client.fetch_expenses(), Err(SpendError::AuthRequired)));
        let head = server.join().unwrap().to_lowercase();
        assert!(head.contains("authorization: bearer tok-123"));

        let stored: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored["user"], "alice");
        assert!(stored.get("access_token").is_none());
        assert_eq!(
            SessionContext::load_from(path).state(),
            &SessionState::Expired { user: "alice".into() }
        );
    }

    #[test]
    fn test_authed_call_without_session_is_auth_required() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionContext::load_from(dir.path().join("session.json"));
        let settings = Settings {
            api_url: "http://127.0.0.1:9".to_string(),
            ..Settings::default()
        };
        let mut client = ApiClient::new(&settings, session).unwrap();
        assert!(matches!(client.fetch_expenses(), Err(SpendError::AuthRequired)));
    }
}
