mod molecule;

pub(crate) use molecule::{CompoundGenerator, CompoundSource, ServiceHealth};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request failed ({status}): {body}")]
    Http { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Parse(String),
    /// `{ "error": true, "message": ... }` from the service.
    #[error("{0}")]
    Service(String),
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self::Parse(e.to_string())
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

const DEFAULT_AUTH_API_URL: &str = "https://story-api.dicoding.dev/v1";
const DEFAULT_MOCK_DELAY_MS: u32 = 2000;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct EnvConfig {
    pub auth_api_url: String,
    /// Unset means the mock generator is used.
    pub molecule_api_url: Option<String>,
    pub use_mock_api: bool,
    pub mock_delay_ms: u32,
    /// Accept any well-formed credentials instead of calling the auth service.
    pub use_mock_auth: bool,
}

impl EnvConfig {
    /// Reads `window.ENV`.
    ///
    /// Both `AUTH_API_URL` and `auth_api_url` spellings are accepted; the
    /// upper-case one wins.
    pub fn new() -> Self {
        let env = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object());

        Self::from_lookup(|key| {
            let env = env.as_ref()?;
            let value = js_sys::Reflect::get(env, &key.into()).ok()?;
            value
                .as_string()
                .or_else(|| value.as_bool().map(|b| b.to_string()))
                .or_else(|| value.as_f64().map(|n| n.to_string()))
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .or_else(|| lookup(&key.to_ascii_lowercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let molecule_api_url = get("MOLECULE_API_URL").map(|u| u.trim_end_matches('/').to_string());
        let use_mock_api = match get("USE_MOCK_API") {
            Some(v) => matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
            None => molecule_api_url.is_none(),
        };

        Self {
            auth_api_url: get("AUTH_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_AUTH_API_URL.to_string()),
            use_mock_api: use_mock_api || molecule_api_url.is_none(),
            molecule_api_url,
            mock_delay_ms: get("MOCK_DELAY_MS")
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u32)
                .unwrap_or(DEFAULT_MOCK_DELAY_MS),
            use_mock_auth: get("USE_MOCK_AUTH")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(false),
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Envelope every auth endpoint answers with.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct ServiceResponse {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct LoginResult {
    #[serde(rename = "userId", default)]
    pub user_id: String,
    pub name: String,
    pub token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub error: bool,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "loginResult")]
    pub login_result: Option<LoginResult>,
}

impl LoginResponse {
    pub(crate) fn into_result(self) -> ApiResult<LoginResult> {
        if self.error {
            return Err(ApiError::Service(self.message));
        }
        self.login_result
            .ok_or_else(|| ApiError::Parse("login response has no loginResult".to_string()))
    }
}

/// Client of the remote account service.
#[derive(Clone, Debug)]
pub(crate) struct AuthClient {
    pub(crate) base_url: String,
}

impl AuthClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    async fn post<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let res = client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(ApiError::network)?;

        let status = res.status();
        let text = res.text().await.map_err(ApiError::network)?;

        // Error payloads come back with 4xx statuses but still carry a message.
        if !status.is_success() {
            if let Ok(env) = serde_json::from_str::<ServiceResponse>(&text) {
                if env.error && !env.message.is_empty() {
                    return Err(ApiError::Service(env.message));
                }
            }
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(ApiError::parse)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<()> {
        let res: ServiceResponse = self
            .post(
                "/register",
                &RegisterRequest {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        if res.error {
            return Err(ApiError::Service(res.message));
        }
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResult> {
        let res: LoginResponse = self
            .post(
                "/login",
                &LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        res.into_result()
    }
}

/// Account backend used by the login and register pages.
#[derive(Clone, Debug)]
pub(crate) enum AuthService {
    Remote(AuthClient),
    /// Accepts any well-formed credentials; for offline development.
    Mock,
}

impl AuthService {
    pub fn from_config(config: &EnvConfig) -> Self {
        if config.use_mock_auth {
            Self::Mock
        } else {
            Self::Remote(AuthClient::new(config.auth_api_url.clone()))
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ApiResult<()> {
        match self {
            Self::Remote(client) => client.register(name, email, password).await,
            Self::Mock => {
                check_mock_email(email)?;
                if name.trim().is_empty() {
                    return Err(ApiError::Service("\"name\" is not allowed to be empty".into()));
                }
                Ok(())
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResult> {
        match self {
            Self::Remote(client) => client.login(email, password).await,
            Self::Mock => {
                check_mock_email(email)?;
                if password.is_empty() {
                    return Err(ApiError::Service("Invalid password".into()));
                }
                let name = email.split('@').next().unwrap_or_default().to_string();
                Ok(LoginResult {
                    user_id: format!("user-{name}"),
                    name,
                    token: format!("mock-{}", (crate::util::random_unit() * 1e9) as u64),
                })
            }
        }
    }
}

fn check_mock_email(email: &str) -> ApiResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, host)) if !user.is_empty() && host.contains('.') => Ok(()),
        _ => Err(ApiError::Service("\"email\" must be a valid email".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_env_config_defaults() {
        let c = EnvConfig::default();
        assert_eq!(c.auth_api_url, DEFAULT_AUTH_API_URL);
        assert!(c.molecule_api_url.is_none());
        assert!(c.use_mock_api);
        assert_eq!(c.mock_delay_ms, DEFAULT_MOCK_DELAY_MS);
        assert!(!c.use_mock_auth);
        assert!(matches!(AuthService::from_config(&c), AuthService::Remote(_)));
    }

    #[test]
    fn test_env_config_prefers_upper_case_keys() {
        let c = EnvConfig::from_lookup(lookup(&[
            ("AUTH_API_URL", "https://auth.example/v1/"),
            ("auth_api_url", "https://ignored.example"),
            ("molecule_api_url", "https://mol.example"),
            ("MOCK_DELAY_MS", "250"),
        ]));
        assert_eq!(c.auth_api_url, "https://auth.example/v1");
        assert_eq!(c.molecule_api_url.as_deref(), Some("https://mol.example"));
        assert!(!c.use_mock_api);
        assert_eq!(c.mock_delay_ms, 250);
    }

    #[test]
    fn test_env_config_mock_flag_overrides_url() {
        let c = EnvConfig::from_lookup(lookup(&[
            ("MOLECULE_API_URL", "https://mol.example"),
            ("USE_MOCK_API", "true"),
            ("MOCK_DELAY_MS", "-5"),
            ("use_mock_auth", "1"),
        ]));
        assert!(c.use_mock_api);
        assert!(matches!(AuthService::from_config(&c), AuthService::Mock));
        assert_eq!(c.mock_delay_ms, DEFAULT_MOCK_DELAY_MS);
    }

    #[test]
    fn test_login_response_contract_deserialize() {
        let json = r#"{
            "error": false,
            "message": "success",
            "loginResult": {"userId": "user-yj5pc_LARC_AgK61", "name": "Arif Faizin", "token": "eyJhbGci"}
        }"#;
        let parsed: LoginResponse = serde_json::from_str(json).expect("login response should parse");
        let result = parsed.into_result().expect("should be a success");
        assert_eq!(result.name, "Arif Faizin");
        assert_eq!(result.token, "eyJhbGci");
    }

    #[test]
    fn test_login_error_payload_becomes_service_error() {
        let json = r#"{"error": true, "message": "Invalid password"}"#;
        let parsed: LoginResponse = serde_json::from_str(json).expect("should parse");
        assert_eq!(
            parsed.into_result(),
            Err(ApiError::Service("Invalid password".to_string()))
        );
    }

    #[test]
    fn test_register_request_serialization() {
        let req = RegisterRequest {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password: "secret123".to_string(),
        };
        let v = serde_json::to_value(req).expect("should serialize");
        assert_eq!(v["name"], "Jane");
        assert_eq!(v["email"], "jane@example.com");
        assert_eq!(v["password"], "secret123");
    }

    #[test]
    fn test_mock_auth() {
        let auth = AuthService::Mock;
        let r = block_on(auth.login("jane@example.com", "pw")).expect("mock login");
        assert_eq!(r.name, "jane");
        assert!(r.token.starts_with("mock-"));

        assert!(matches!(
            block_on(auth.login("not-an-email", "pw")),
            Err(ApiError::Service(_))
        ));
        assert!(block_on(auth.register("Jane", "jane@example.com", "secret123")).is_ok());
        assert!(block_on(auth.register(" ", "jane@example.com", "secret123")).is_err());
    }
}
