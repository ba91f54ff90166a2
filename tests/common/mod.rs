//! Common test utilities

use std::collections::BTreeMap;

use hoyocheck::client::{ClientSettings, SessionClient};
use hoyocheck::config::credentials::AccountCredential;
use hoyocheck::games::{GameId, GameSpec};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Leak a string so it can live in a `GameSpec`
pub fn leak(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}

/// Spec for `id` whose endpoints point at mock servers
pub fn mock_spec(id: GameId, primary: &str, fallbacks: &[&str]) -> GameSpec {
    let real = *GameSpec::get(id);
    let fallbacks: Vec<&'static str> = fallbacks
        .iter()
        .map(|url| leak((*url).to_string()))
        .collect();

    GameSpec {
        primary_endpoint: leak(primary.to_string()),
        fallback_endpoints: Box::leak(fallbacks.into_boxed_slice()),
        ..real
    }
}

/// Complete credential for a game
pub fn credential(game: GameId) -> AccountCredential {
    let cookies: BTreeMap<String, String> = [
        ("ltuid_v2", "100000001"),
        ("ltoken_v2", "v2_test_ltoken"),
        ("account_id_v2", "100000001"),
        ("cookie_token_v2", "v2_test_cookie_token"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    AccountCredential::new(game, cookies, "en-us")
}

/// Credential missing `cookie_token_v2`
#[allow(dead_code)]
pub fn credential_missing_token(game: GameId) -> AccountCredential {
    let cookies: BTreeMap<String, String> = [
        ("ltuid_v2", "100000001"),
        ("ltoken_v2", "v2_test_ltoken"),
        ("account_id_v2", "100000001"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    AccountCredential::new(game, cookies, "en-us")
}

/// Client tuned for tests: no courtesy delay, no reward detail fetches
pub fn fast_client() -> SessionClient {
    SessionClient::new(ClientSettings {
        rate_limit_delay: 0.0,
        fetch_rewards: false,
        ..Default::default()
    })
    .unwrap()
}

/// Mount a successful sign response carrying the given reward
#[allow(dead_code)]
pub async fn mount_sign_success(server: &MockServer, sign_path: &str, reward_name: &str) {
    Mock::given(method("POST"))
        .and(path(sign_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "retcode": 0,
            "message": "OK",
            "data": { "award": { "name": reward_name, "cnt": 20 } }
        })))
        .mount(server)
        .await;
}

/// Mount a sign response with an arbitrary retcode
#[allow(dead_code)]
pub async fn mount_sign_retcode(server: &MockServer, sign_path: &str, retcode: i64, message: &str) {
    Mock::given(method("POST"))
        .and(path(sign_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "retcode": retcode,
            "message": message,
            "data": null
        })))
        .mount(server)
        .await;
}

/// Mount the info endpoint with a sign-in day count
#[allow(dead_code)]
pub async fn mount_info(server: &MockServer, info_path: &str, days: u32) {
    Mock::given(method("GET"))
        .and(path(info_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "retcode": 0,
            "message": "OK",
            "data": { "total_sign_day": days, "is_sign": true }
        })))
        .mount(server)
        .await;
}
