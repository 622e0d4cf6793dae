//! Session identity and per-transport endpoint URLs.
//!
//! Every connection gets a fresh `{server_id}/{session_id}` pair under the
//! server's `/sockjs` mount. Identifiers are random and uniqueness is only
//! probabilistic (8 chars over a 36-symbol alphabet).

use rand::Rng;
use thiserror::Error;
use url::Url;

const SESSION_ID_LEN: usize = 8;
const SESSION_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SERVER_ID_MAX: u32 = 1000;

/// Errors raised while deriving a session from a base URL.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Base URL could not be parsed at all.
    #[error("invalid base url: {0}")]
    Parse(#[from] url::ParseError),

    /// Base URL uses a scheme other than http(s)/ws(s).
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// Base URL has no host component.
    #[error("base url has no host")]
    MissingHost,
}

/// Identity of one realtime session against a single server.
///
/// Fields are fixed at construction; transports only read from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    host: String,
    secure: bool,
    server_id: String,
    session_id: String,
}

impl Session {
    /// Derives a new session from a base URL using thread-local randomness.
    pub fn new(url: &str) -> Result<Self, SessionError> {
        Self::with_rng(url, &mut rand::thread_rng())
    }

    /// Derives a new session with a caller-supplied randomness source.
    ///
    /// Deterministic generators make session URLs reproducible in tests.
    pub fn with_rng<R: Rng + ?Sized>(url: &str, rng: &mut R) -> Result<Self, SessionError> {
        let parsed = Url::parse(url)?;
        let scheme = parsed.scheme();
        if !matches!(scheme, "http" | "https" | "ws" | "wss") {
            return Err(SessionError::UnsupportedScheme(scheme.to_string()));
        }
        let host = parsed.host_str().ok_or(SessionError::MissingHost)?;
        let host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            host,
            secure: matches!(scheme, "https" | "wss"),
            server_id: rng.gen_range(0..=SERVER_ID_MAX).to_string(),
            session_id: random_session_id(rng),
        })
    }

    /// Host (and port, when present) of the server.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether endpoints use TLS schemes.
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Random server identifier in `0..=1000`.
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Random 8-character session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// HTTP endpoint for a session-scoped method such as `xhr_streaming`.
    pub fn http_endpoint(&self, method: &str) -> String {
        self.endpoint(if self.secure { "https" } else { "http" }, method)
    }

    /// Websocket endpoint for the full-duplex transport.
    pub fn ws_endpoint(&self) -> String {
        self.endpoint(if self.secure { "wss" } else { "ws" }, "websocket")
    }

    /// Capability descriptor endpoint, outside the session scope.
    pub fn info_endpoint(&self) -> String {
        let protocol = if self.secure { "https" } else { "http" };
        format!("{protocol}://{}/sockjs/info", self.host)
    }

    fn endpoint(&self, protocol: &str, method: &str) -> String {
        format!(
            "{protocol}://{}/sockjs/{}/{}/{method}",
            self.host, self.server_id, self.session_id
        )
    }
}

fn random_session_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SESSION_ID_LEN)
        .map(|_| SESSION_ID_ALPHABET[rng.gen_range(0..SESSION_ID_ALPHABET.len())] as char)
        .collect()
}
