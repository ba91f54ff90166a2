use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE, REFERER, USER_AGENT};

use crate::config::credentials::AccountCredential;
use crate::games::{GameId, GameSpec};

/// Pool of realistic Chrome User-Agent strings for rotation
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
];

/// Build headers for a HoYoLAB check-in API request
///
/// Carries the session cookies, the activity page referer and the x-rpc
/// headers the endpoints expect. Genshin requests use the legacy app
/// version; the other titles additionally declare their game_biz.
pub fn build_checkin_headers(
    user_agent: &str,
    spec: &GameSpec,
    credential: &AccountCredential,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&credential.cookie_header()) {
        headers.insert(COOKIE, value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(REFERER, HeaderValue::from_static(spec.signin_url));

    if let Ok(value) = HeaderValue::from_str(&credential.lang) {
        headers.insert(HeaderName::from_static("x-rpc-lang"), value);
    }

    if spec.id == GameId::Gi {
        headers.insert(
            HeaderName::from_static("x-rpc-app_version"),
            HeaderValue::from_static("1.5.0"),
        );
    } else {
        headers.insert(
            HeaderName::from_static("x-rpc-app_version"),
            HeaderValue::from_static("2.73.1"),
        );
        headers.insert(
            HeaderName::from_static("x-rpc-game_biz"),
            HeaderValue::from_static(spec.game_biz),
        );
    }

    headers
}
