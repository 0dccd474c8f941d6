use promptlab_core::providers::DEFAULT_OLLAMA_URL;
use std::env;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3001";

/// Sampling defaults applied when the caller leaves them out.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_NUM_PREDICT: u32 = 256;

#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub addr: String,
    pub upstream_url: String,
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            upstream_url: DEFAULT_OLLAMA_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("PROMPTLAB_PROXY_ADDR") {
            if !v.trim().is_empty() {
                cfg.addr = v;
            }
        }
        if let Ok(v) = env::var("PROMPTLAB_OLLAMA_URL") {
            if !v.trim().is_empty() {
                cfg.upstream_url = v;
            }
        }
        if let Ok(v) = env::var("PROMPTLAB_LOG") {
            cfg.log_level = v;
        }
        cfg
    }
}
