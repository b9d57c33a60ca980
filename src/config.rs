use anyhow::Context;

pub const ROSTER_STORE_URL: &str = "ROSTER_STORE_URL";
pub const ROSTER_STORE_AUTH: &str = "ROSTER_STORE_AUTH";
pub const PERFORMANCE_STORE_URL: &str = "PERFORMANCE_STORE_URL";
pub const PERFORMANCE_STORE_AUTH: &str = "PERFORMANCE_STORE_AUTH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: String,
    pub auth: Option<String>,
}

/// Connection settings for the two independent stores: the class roster and
/// the saved performance sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub roster: Option<StoreConfig>,
    pub performance: Option<StoreConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let store = |url_key: &str, auth_key: &str| {
            lookup(url_key)
                .filter(|url| !url.trim().is_empty())
                .map(|url| StoreConfig {
                    url: url.trim().to_string(),
                    auth: lookup(auth_key).filter(|token| !token.is_empty()),
                })
        };

        Self {
            roster: store(ROSTER_STORE_URL, ROSTER_STORE_AUTH),
            performance: store(PERFORMANCE_STORE_URL, PERFORMANCE_STORE_AUTH),
        }
    }

    pub fn require_roster(&self) -> anyhow::Result<&StoreConfig> {
        self.roster
            .as_ref()
            .with_context(|| format!("{ROSTER_STORE_URL} must be set to reach the roster store"))
    }
}
