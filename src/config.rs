use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LLMConfig,
    pub chain: ChainConfig,
    pub frame: FrameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    /// Public origin used to build share, payment and manifest URLs
    pub app_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `None` runs the service on the in-memory store
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub gemini_api_key: String,
    pub default_provider: String,
    pub default_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub usdc_address: String,
    pub receipt_poll_interval_ms: u64,
    /// 0 waits for the receipt indefinitely
    pub confirmation_timeout_secs: u64,
    /// How long a swipe holds the invoice while the wallet submits
    pub submission_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameConfig {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                app_url: env::var("APP_URL")
                    .unwrap_or_else(|_| "https://slid.vercel.app".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()?,
            },
            llm: LLMConfig {
                gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
                default_provider: env::var("ASSIST_LLM_PROVIDER").unwrap_or_else(|_| "google".to_string()),
                default_model: env::var("ASSIST_LLM_MODEL").unwrap_or_else(|_| "gemini-pro".to_string()),
            },
            chain: ChainConfig {
                rpc_url: env::var("BASE_RPC_URL").unwrap_or_else(|_| "https://mainnet.base.org".to_string()),
                chain_id: env::var("CHAIN_ID")
                    .unwrap_or_else(|_| "8453".to_string())
                    .parse()?,
                usdc_address: env::var("USDC_ADDRESS")
                    .unwrap_or_else(|_| crate::payment::usdc::BASE_USDC_ADDRESS.to_string()),
                receipt_poll_interval_ms: env::var("RECEIPT_POLL_INTERVAL_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()?,
                confirmation_timeout_secs: env::var("CONFIRMATION_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse()?,
                submission_timeout_ms: env::var("SUBMISSION_TIMEOUT_MS")
                    .unwrap_or_else(|_| "120000".to_string())
                    .parse()?,
            },
            frame: FrameConfig {
                header: env::var("FARCASTER_HEADER").unwrap_or_default(),
                payload: env::var("FARCASTER_PAYLOAD").unwrap_or_default(),
                signature: env::var("FARCASTER_SIGNATURE").unwrap_or_default(),
            },
        })
    }

    /// Configuration for tests and local runs without an environment
    pub fn local(app_url: &str) -> Self {
        Self {
            server: ServerConfig {
                port: 3000,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec![app_url.to_string()],
                app_url: app_url.trim_end_matches('/').to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
                min_connections: 1,
            },
            llm: LLMConfig {
                gemini_api_key: String::new(),
                default_provider: "google".to_string(),
                default_model: "gemini-pro".to_string(),
            },
            chain: ChainConfig {
                rpc_url: "http://127.0.0.1:8545".to_string(),
                chain_id: 8453,
                usdc_address: crate::payment::usdc::BASE_USDC_ADDRESS.to_string(),
                receipt_poll_interval_ms: 1,
                confirmation_timeout_secs: 0,
                submission_timeout_ms: 120_000,
            },
            frame: FrameConfig {
                header: String::new(),
                payload: String::new(),
                signature: String::new(),
            },
        }
    }
}
