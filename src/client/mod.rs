//! HoYoLAB session client
//!
//! Issues authenticated check-in calls with a given cookie set. Features:
//! - Fallback endpoint rotation on network failure, 5xx, and the API's
//!   server-instability retcodes
//! - User-Agent rotation driven by a per-client round-robin counter
//! - Rate limiting with governor plus a jittered courtesy delay
//! - Response code classification into [`CheckinStatus`]
//!
//! A [`SessionClient::checkin`] call is a single logical attempt with no
//! retry; the retry policy in `utils::retry` wraps it. Every failure mode is
//! captured into an `AttemptResult` here so nothing propagates past the
//! orchestrator.

pub mod headers;

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use rand::Rng;
use reqwest::{Client, Method, Proxy, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::credentials::AccountCredential;
use crate::games::GameSpec;
use crate::models::{AttemptResult, CheckinStatus, Reward};

use self::headers::{build_checkin_headers, USER_AGENTS};

const RETCODE_OK: i64 = 0;
const RETCODE_ALREADY_SIGNED: i64 = -5003;
const RETCODE_INVALID_COOKIE: i64 = -100;

/// Server-instability retcodes that trigger fallback endpoint rotation
const ROTATE_RETCODES: [i64; 3] = [-1, -10001, -500001];

/// Errors that can occur during a single HTTP exchange
///
/// Converted into an `AttemptResult` classification at the `checkin`
/// boundary; never surfaced to callers.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout
    #[error("request timeout")]
    Timeout,

    /// Non-success HTTP status
    #[error("server returned status {0}")]
    ServerError(u16),

    /// HTTP 429 from the endpoint
    #[error("rate limit exceeded")]
    RateLimit,

    /// HTTP 401/403 from the endpoint
    #[error("unauthorized (status {0}): invalid or expired cookies")]
    Unauthorized(u16),

    /// Primary and every fallback endpoint failed
    #[error("all endpoints failed")]
    AllEndpointsFailed,
}

impl ClientError {
    /// Map a transport failure to its attempt classification
    fn status(&self) -> CheckinStatus {
        match self {
            Self::RateLimit => CheckinStatus::RateLimited,
            Self::Unauthorized(_) => CheckinStatus::AuthInvalid,
            Self::ServerError(code) if *code < 500 => CheckinStatus::UnknownError,
            _ => CheckinStatus::NetworkError,
        }
    }
}

/// Client tuning from the `advanced` config section
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Per-request timeout
    pub request_timeout: Duration,

    /// Upper bound of the jittered courtesy delay, in seconds; 0 disables
    pub rate_limit_delay: f64,

    /// Rotate through the User-Agent pool per request
    pub user_agent_rotation: bool,

    /// Optional proxy applied to all requests
    pub proxy_url: Option<String>,

    /// Fetch today's reward details after an already-signed response
    pub fetch_rewards: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            rate_limit_delay: 2.0,
            user_agent_rotation: true,
            proxy_url: None,
            fetch_rewards: true,
        }
    }
}

/// Standard HoYoLAB API envelope
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub retcode: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Check-in API client for one configuration of accounts
pub struct SessionClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    settings: ClientSettings,

    /// Round-robin position in the User-Agent pool; owned by this instance
    /// so clients under test do not interfere with each other
    ua_index: AtomicUsize,
}

impl SessionClient {
    /// Create a client from settings
    pub fn new(settings: ClientSettings) -> crate::error::Result<Self> {
        let mut builder = Client::builder()
            .timeout(settings.request_timeout)
            .gzip(true);

        if let Some(url) = &settings.proxy_url {
            builder = builder.proxy(Proxy::all(url)?);
        }

        let client = builder.build()?;

        let period = crate::utils::secs_f64(settings.rate_limit_delay)
            .max(Duration::from_millis(100));
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::new(1).unwrap()));
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            settings,
            ua_index: AtomicUsize::new(0),
        })
    }

    /// Perform one check-in attempt for an account
    ///
    /// Single logical attempt: fallback endpoints are rotated internally but
    /// no classification is retried here.
    pub async fn checkin(
        &self,
        spec: &GameSpec,
        credential: &AccountCredential,
    ) -> AttemptResult {
        // Incomplete cookies are a configuration defect, not transient;
        // checked before any traffic.
        let missing = credential.missing_fields();
        if !missing.is_empty() {
            return AttemptResult::new(
                spec.id,
                CheckinStatus::AuthInvalid,
                format!("missing required cookies: {}", missing.join(", ")),
            );
        }

        self.rate_limiter.until_ready().await;

        let query = [("act_id", spec.act_id), ("lang", credential.lang.as_str())];
        let body = json!({ "lang": credential.lang });

        let response = self
            .request_with_fallback(spec, credential, Method::POST, spec.sign_path, &query, Some(&body))
            .await;

        match response {
            Err(err) => {
                let status = err.status();
                debug!(game = %spec.id, status = %status, error = %err, "check-in attempt failed");
                AttemptResult::new(spec.id, status, err.to_string())
            }
            Ok(api) => self.classify_sign_response(spec, credential, api).await,
        }
    }

    /// Turn a sign response into an attempt result, enriching success paths
    /// with sign-in day count and reward details
    async fn classify_sign_response(
        &self,
        spec: &GameSpec,
        credential: &AccountCredential,
        api: ApiResponse,
    ) -> AttemptResult {
        match api.retcode {
            RETCODE_OK => {
                let mut result = AttemptResult::new(
                    spec.id,
                    CheckinStatus::Success,
                    "checked in",
                )
                .with_retcode(RETCODE_OK);

                if let Some(award) = api.data.as_ref().and_then(|d| d.get("award")) {
                    if let Some(reward) = parse_award(award) {
                        result = result.with_reward(reward);
                    }
                }
                if let Some(days) = self.fetch_signed_days(spec, credential).await {
                    result = result.with_signed_in_days(days);
                }
                result
            }

            RETCODE_ALREADY_SIGNED => {
                let mut result = AttemptResult::new(
                    spec.id,
                    CheckinStatus::AlreadyCheckedIn,
                    "already checked in today",
                )
                .with_retcode(RETCODE_ALREADY_SIGNED);

                if let Some(days) = self.fetch_signed_days(spec, credential).await {
                    result = result.with_signed_in_days(days);
                    if self.settings.fetch_rewards {
                        if let Some(reward) =
                            self.fetch_today_reward(spec, credential, days).await
                        {
                            result = result.with_reward(reward);
                        }
                    }
                }
                result
            }

            RETCODE_INVALID_COOKIE => AttemptResult::new(
                spec.id,
                CheckinStatus::AuthInvalid,
                format!("invalid cookie: {} (refresh your cookies)", api.message),
            )
            .with_retcode(RETCODE_INVALID_COOKIE),

            // Unrecognized codes are terminal; surfaced verbatim for diagnosis.
            other => AttemptResult::new(
                spec.id,
                CheckinStatus::UnknownError,
                if api.message.is_empty() {
                    format!("unrecognized API response (retcode {other})")
                } else {
                    api.message.clone()
                },
            )
            .with_retcode(other),
        }
    }

    /// Send a request, trying the primary endpoint then each fallback in
    /// order until one responds or the list is exhausted
    async fn request_with_fallback(
        &self,
        spec: &GameSpec,
        credential: &AccountCredential,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse, ClientError> {
        let mut last_error = None;
        let mut last_rotated: Option<ApiResponse> = None;

        for endpoint in spec.endpoints() {
            self.courtesy_delay().await;

            let url = format!("{endpoint}{path}");
            let user_agent = self.next_user_agent();
            let request_headers = build_checkin_headers(user_agent, spec, credential);

            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(request_headers)
                .query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(game = %spec.id, %url, method = %method, "sending request");

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        match response.json::<ApiResponse>().await {
                            Ok(api) if ROTATE_RETCODES.contains(&api.retcode) => {
                                warn!(
                                    game = %spec.id,
                                    %endpoint,
                                    retcode = api.retcode,
                                    "endpoint unstable, rotating to fallback"
                                );
                                last_rotated = Some(api);
                            }
                            Ok(api) => return Ok(api),
                            Err(e) => {
                                warn!(game = %spec.id, %endpoint, error = %e, "unparseable response body");
                                last_error = Some(ClientError::Http(e));
                            }
                        }
                    } else if status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(ClientError::RateLimit);
                    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
                    {
                        return Err(ClientError::Unauthorized(status.as_u16()));
                    } else if status.is_server_error() {
                        warn!(game = %spec.id, %endpoint, status = status.as_u16(), "server error, rotating to fallback");
                        last_error = Some(ClientError::ServerError(status.as_u16()));
                    } else {
                        return Err(ClientError::ServerError(status.as_u16()));
                    }
                }
                Err(e) => {
                    let err = if e.is_timeout() {
                        ClientError::Timeout
                    } else {
                        ClientError::Http(e)
                    };
                    warn!(game = %spec.id, %endpoint, error = %err, "request failed, rotating to fallback");
                    last_error = Some(err);
                }
            }
        }

        // Exhausted every endpoint. A response carrying a rotation retcode
        // is still an API answer; let classification surface its code.
        if let Some(api) = last_rotated {
            return Ok(api);
        }
        Err(last_error.unwrap_or(ClientError::AllEndpointsFailed))
    }

    /// Best-effort fetch of the total sign-in day count
    async fn fetch_signed_days(
        &self,
        spec: &GameSpec,
        credential: &AccountCredential,
    ) -> Option<u32> {
        let query = [("act_id", spec.act_id), ("lang", credential.lang.as_str())];
        match self
            .request_with_fallback(spec, credential, Method::GET, spec.info_path, &query, None)
            .await
        {
            Ok(api) if api.retcode == RETCODE_OK => api
                .data
                .as_ref()
                .and_then(|d| d.get("total_sign_day"))
                .and_then(|v| v.as_u64())
                .map(|v| v as u32),
            Ok(api) => {
                debug!(game = %spec.id, retcode = api.retcode, "info endpoint refused request");
                None
            }
            Err(e) => {
                debug!(game = %spec.id, error = %e, "info fetch failed");
                None
            }
        }
    }

    /// Best-effort fetch of the reward claimed on the given sign-in day
    async fn fetch_today_reward(
        &self,
        spec: &GameSpec,
        credential: &AccountCredential,
        day: u32,
    ) -> Option<Reward> {
        if day == 0 {
            return None;
        }
        let query = [("act_id", spec.act_id), ("lang", credential.lang.as_str())];
        match self
            .request_with_fallback(spec, credential, Method::GET, spec.home_path, &query, None)
            .await
        {
            Ok(api) if api.retcode == RETCODE_OK => api
                .data
                .as_ref()
                .and_then(|d| d.get("awards"))
                .and_then(|a| a.get((day - 1) as usize))
                .and_then(parse_award),
            _ => None,
        }
    }

    /// Next User-Agent from the pool; fixed first entry when rotation is off
    fn next_user_agent(&self) -> &'static str {
        if !self.settings.user_agent_rotation {
            return USER_AGENTS[0];
        }
        let index = self.ua_index.fetch_add(1, Ordering::Relaxed);
        USER_AGENTS[index % USER_AGENTS.len()]
    }

    /// Jittered pause before each wire call, a courtesy toward the
    /// endpoint's throttling heuristics
    async fn courtesy_delay(&self) {
        if self.settings.rate_limit_delay <= 0.0 {
            return;
        }
        let max = self.settings.rate_limit_delay.max(0.5);
        let secs = rand::thread_rng().gen_range(0.5..=max);
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}

/// Extract a reward from an API award object
fn parse_award(value: &serde_json::Value) -> Option<Reward> {
    let name = value.get("name").and_then(|v| v.as_str())?;
    let count = value.get("cnt").and_then(|v| v.as_u64()).unwrap_or(1);
    Some(Reward::new(name, count as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(rotation: bool) -> SessionClient {
        SessionClient::new(ClientSettings {
            rate_limit_delay: 0.0,
            user_agent_rotation: rotation,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_user_agent_round_robin() {
        let client = test_client(true);

        let first = client.next_user_agent();
        let second = client.next_user_agent();
        let third = client.next_user_agent();
        let wrapped = client.next_user_agent();

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_eq!(first, wrapped);
    }

    #[test]
    fn test_user_agent_rotation_disabled() {
        let client = test_client(false);
        assert_eq!(client.next_user_agent(), USER_AGENTS[0]);
        assert_eq!(client.next_user_agent(), USER_AGENTS[0]);
    }

    #[test]
    fn test_counters_are_per_instance() {
        let a = test_client(true);
        let b = test_client(true);

        a.next_user_agent();
        a.next_user_agent();
        assert_eq!(b.next_user_agent(), USER_AGENTS[0]);
    }

    #[test]
    fn test_parse_award() {
        let value = serde_json::json!({"name": "Stellar Jade", "cnt": 20});
        let reward = parse_award(&value).unwrap();
        assert_eq!(reward.name, "Stellar Jade");
        assert_eq!(reward.count, 20);

        let no_count = serde_json::json!({"name": "Mora"});
        assert_eq!(parse_award(&no_count).unwrap().count, 1);

        let nameless = serde_json::json!({"cnt": 3});
        assert!(parse_award(&nameless).is_none());
    }

    #[test]
    fn test_client_error_classification() {
        assert_eq!(ClientError::RateLimit.status(), CheckinStatus::RateLimited);
        assert_eq!(
            ClientError::Unauthorized(401).status(),
            CheckinStatus::AuthInvalid
        );
        assert_eq!(
            ClientError::ServerError(404).status(),
            CheckinStatus::UnknownError
        );
        assert_eq!(
            ClientError::ServerError(503).status(),
            CheckinStatus::NetworkError
        );
        assert_eq!(ClientError::Timeout.status(), CheckinStatus::NetworkError);
        assert_eq!(
            ClientError::AllEndpointsFailed.status(),
            CheckinStatus::NetworkError
        );
    }

    #[test]
    fn test_api_envelope_defaults() {
        let api: ApiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(api.retcode, 0);
        assert!(api.message.is_empty());
        assert!(api.data.is_none());
    }
}
