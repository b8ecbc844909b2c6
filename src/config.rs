use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,

    // History Settings
    pub history_limit: usize,
    pub chart_width: usize,

    // Auth Settings
    pub min_password_len: usize,
    pub pbkdf2_iterations: u32,

    // API Settings
    pub cors_allowed_origins: String,
    pub api_auth_token: Option<String>,
    pub api_bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "data/fitness_tracker.db".to_string(),
            history_limit: 10,
            chart_width: 40,
            min_password_len: 8,
            pbkdf2_iterations: 100_000,
            cors_allowed_origins: "http://localhost:3000".to_string(),
            api_auth_token: None,
            api_bind_addr: "127.0.0.1:3001".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("Tracker.toml"))
            .merge(Json::file("Tracker.json"))
            .merge(Env::raw().only(&[
                "DATABASE_URL",
                "HISTORY_LIMIT",
                "CHART_WIDTH",
                "MIN_PASSWORD_LEN",
                "PBKDF2_ITERATIONS",
                "CORS_ALLOWED_ORIGINS",
                "API_AUTH_TOKEN",
                "API_BIND_ADDR",
            ]))
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}
