use crate::error::{env_error, AppResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;
use tracing::warn;

/// Default upstream chat-completion endpoint
pub const DEFAULT_CHAT_API_URL: &str =
    "https://ark.cn-beijing.volces.com/api/v3/chat/completions";

/// Default chat model identifier
pub const DEFAULT_CHAT_MODEL: &str = "doubao-1-5-thinking-pro-m-250428";

/// Default AMap REST base URL
pub const DEFAULT_AMAP_BASE_URL: &str = "https://restapi.amap.com/v3";

/// Main configuration structure for the service
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat-completion API credential; absence is a request-time error
    pub chat_api_key: Option<String>,
    /// Upstream chat-completion endpoint URL
    pub chat_api_url: String,
    /// Model identifier sent with assistant requests
    pub chat_model: String,
    /// Per-attempt timeout for upstream chat calls, in seconds
    pub chat_timeout_secs: u64,
    /// AMap API credential; absence is a request-time error
    pub amap_api_key: Option<String>,
    /// AMap REST base URL
    pub amap_base_url: String,
    /// City bias for forward geocoding and transit routing
    pub amap_city: String,
    /// Address to bind the HTTP server to
    pub bind_address: String,
    /// Port to bind the HTTP server to
    pub port: u16,
    /// Timezone for prompts and conflict descriptions
    pub timezone: String,
    /// Locale for user-facing messages
    pub locale: String,
    /// Path of the JSON file backing the event store
    pub events_file: String,
}

impl Config {
    /// Load configuration from the environment
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let chat_api_key = env::var("VOLCES_API_KEY").ok().filter(|v| !v.is_empty());
        let amap_api_key = env::var("AMAP_API_KEY").ok().filter(|v| !v.is_empty());

        if chat_api_key.is_none() {
            warn!("VOLCES_API_KEY is not set; chat requests will fail until it is configured");
        }
        if amap_api_key.is_none() {
            warn!("AMAP_API_KEY is not set; geocode and route requests will fail until it is configured");
        }

        let chat_api_url =
            env::var("CHAT_API_URL").unwrap_or_else(|_| String::from(DEFAULT_CHAT_API_URL));
        let chat_model =
            env::var("CHAT_MODEL").unwrap_or_else(|_| String::from(DEFAULT_CHAT_MODEL));
        let chat_timeout_secs = env::var("CHAT_TIMEOUT_SECS")
            .unwrap_or_else(|_| String::from("30"))
            .parse::<u64>()
            .map_err(|_| env_error("Invalid CHAT_TIMEOUT_SECS format"))?;

        let amap_base_url =
            env::var("AMAP_BASE_URL").unwrap_or_else(|_| String::from(DEFAULT_AMAP_BASE_URL));
        let amap_city = env::var("AMAP_CITY").unwrap_or_else(|_| String::from("北京"));

        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| String::from("0.0.0.0"));
        let port = env::var("PORT")
            .unwrap_or_else(|_| String::from("8080"))
            .parse::<u16>()
            .map_err(|_| env_error("Invalid PORT format"))?;

        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from("Asia/Shanghai"));
        let locale = env::var("APP_LOCALE").unwrap_or_else(|_| String::from("zh-CN"));
        let events_file =
            env::var("EVENTS_FILE").unwrap_or_else(|_| String::from("data/events.json"));

        Ok(Config {
            chat_api_key,
            chat_api_url,
            chat_model,
            chat_timeout_secs,
            amap_api_key,
            amap_base_url,
            amap_city,
            bind_address,
            port,
            timezone,
            locale,
            events_file,
        })
    }

    /// Parse the configured timezone, falling back to UTC
    pub fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or_else(|_| {
            warn!("Unknown timezone {}, falling back to UTC", self.timezone);
            Tz::UTC
        })
    }
}
