//! Static per-game metadata for the HoYoLAB check-in API
//!
//! Each supported title carries its own activity id, API host set and
//! endpoint paths. The registry is read-only after initialization; callers
//! resolve a [`GameSpec`] once at startup and hold a `'static` reference.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Supported game titles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameId {
    /// Honkai: Star Rail
    Hsr,
    /// Genshin Impact
    Gi,
    /// Zenless Zone Zero
    Zzz,
    /// Honkai Impact 3rd
    Hi3,
}

impl GameId {
    /// Get string representation (the id used in config files)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hsr => "hsr",
            Self::Gi => "gi",
            Self::Zzz => "zzz",
            Self::Hi3 => "hi3",
        }
    }

    /// Parse a game id, failing on anything outside the supported set
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.to_lowercase().as_str() {
            "hsr" => Ok(Self::Hsr),
            "gi" => Ok(Self::Gi),
            "zzz" => Ok(Self::Zzz),
            "hi3" => Ok(Self::Hi3),
            other => Err(Error::UnknownGame(other.to_string())),
        }
    }

    /// All supported games in registry-declared order
    pub fn all() -> [Self; 4] {
        [Self::Hsr, Self::Gi, Self::Zzz, Self::Hi3]
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-game check-in metadata
///
/// Endpoint hosts and activity ids mirror the public sign-in activities;
/// fallbacks are tried in declared order when the primary host fails.
#[derive(Debug, Clone, Copy)]
pub struct GameSpec {
    pub id: GameId,
    pub name: &'static str,
    pub act_id: &'static str,
    pub game_biz: &'static str,

    /// Sign-in activity page, used as the Referer header
    pub signin_url: &'static str,

    pub primary_endpoint: &'static str,
    pub fallback_endpoints: &'static [&'static str],

    /// API paths relative to whichever endpoint host is active
    pub info_path: &'static str,
    pub sign_path: &'static str,
    pub home_path: &'static str,
}

static GAMES: [GameSpec; 4] = [
    GameSpec {
        id: GameId::Hsr,
        name: "Honkai: Star Rail",
        act_id: "e202303301540311",
        game_biz: "hkrpg_global",
        signin_url: "https://act.hoyolab.com/bbs/event/signin/hkrpg/index.html",
        primary_endpoint: "https://sg-public-api.hoyolab.com",
        fallback_endpoints: &[
            "https://sg-hk4e-api.hoyolab.com",
            "https://api-os-takumi.mihoyo.com",
        ],
        info_path: "/event/luna/info",
        sign_path: "/event/luna/sign",
        home_path: "/event/luna/home",
    },
    GameSpec {
        id: GameId::Gi,
        name: "Genshin Impact",
        act_id: "e202102251931481",
        game_biz: "hk4e_global",
        signin_url: "https://act.hoyolab.com/ys/event/signin-sea-v3/index.html",
        primary_endpoint: "https://sg-hk4e-api.hoyoverse.com",
        fallback_endpoints: &[
            "https://sg-hk4e-api.hoyolab.com",
            "https://hk4e-api-os.hoyoverse.com",
        ],
        info_path: "/event/sol/info",
        sign_path: "/event/sol/sign",
        home_path: "/event/sol/home",
    },
    GameSpec {
        id: GameId::Zzz,
        name: "Zenless Zone Zero",
        act_id: "e202406031448091",
        game_biz: "nap_global",
        signin_url: "https://act.hoyolab.com/bbs/event/signin/zzz/index.html",
        primary_endpoint: "https://sg-act-nap-api.hoyolab.com",
        fallback_endpoints: &[
            "https://sg-public-api.hoyolab.com",
            "https://api-os-takumi.mihoyo.com",
        ],
        info_path: "/event/luna/zzz/info",
        sign_path: "/event/luna/zzz/sign",
        home_path: "/event/luna/zzz/home",
    },
    GameSpec {
        id: GameId::Hi3,
        name: "Honkai Impact 3rd",
        act_id: "e202110291205111",
        game_biz: "bh3_global",
        signin_url: "https://act.hoyolab.com/bbs/event/signin-bh3/index.html",
        primary_endpoint: "https://sg-public-api.hoyolab.com",
        fallback_endpoints: &[
            "https://api-os-takumi.mihoyo.com",
            "https://sg-hk4e-api.hoyolab.com",
        ],
        info_path: "/event/mani/info",
        sign_path: "/event/mani/sign",
        home_path: "/event/mani/home",
    },
];

impl GameSpec {
    /// Resolve the spec for a game id
    pub fn get(id: GameId) -> &'static GameSpec {
        match id {
            GameId::Hsr => &GAMES[0],
            GameId::Gi => &GAMES[1],
            GameId::Zzz => &GAMES[2],
            GameId::Hi3 => &GAMES[3],
        }
    }

    /// Primary endpoint followed by fallbacks, in rotation order
    pub fn endpoints(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.primary_endpoint).chain(self.fallback_endpoints.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_ids() {
        assert_eq!(GameId::parse("hsr").unwrap(), GameId::Hsr);
        assert_eq!(GameId::parse("GI").unwrap(), GameId::Gi);
        assert_eq!(GameId::parse("zzz").unwrap(), GameId::Zzz);
        assert_eq!(GameId::parse("hi3").unwrap(), GameId::Hi3);
    }

    #[test]
    fn test_parse_unknown_id() {
        let err = GameId::parse("wuwa").unwrap_err();
        assert!(err.to_string().contains("wuwa"));
    }

    #[test]
    fn test_all_order_is_stable() {
        let ids: Vec<_> = GameId::all().iter().map(|g| g.as_str()).collect();
        assert_eq!(ids, vec!["hsr", "gi", "zzz", "hi3"]);
    }

    #[test]
    fn test_registry_covers_every_game() {
        for id in GameId::all() {
            let spec = GameSpec::get(id);
            assert_eq!(spec.id, id);
            assert!(!spec.act_id.is_empty());
            assert!(spec.primary_endpoint.starts_with("https://"));
            assert!(!spec.fallback_endpoints.is_empty());
        }
    }

    #[test]
    fn test_endpoint_rotation_order() {
        let spec = GameSpec::get(GameId::Gi);
        let endpoints: Vec<_> = spec.endpoints().collect();

        assert_eq!(endpoints[0], spec.primary_endpoint);
        assert_eq!(endpoints.len(), 1 + spec.fallback_endpoints.len());
        assert_eq!(endpoints[1], spec.fallback_endpoints[0]);
    }

    #[test]
    fn test_display() {
        assert_eq!(GameId::Hsr.to_string(), "hsr");
    }
}
