use std::env;

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        Settings {
            host,
            port,
            api_keys: api_keys_from_env(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Accepted keys come from API_KEY and API_KEY_2. The well-known test key
/// stays accepted so clients can try the service without provisioning.
fn api_keys_from_env() -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in [
        env::var("API_KEY").unwrap_or_else(|_| "sk_test_123456789".to_string()),
        env::var("API_KEY_2").unwrap_or_else(|_| "sk_live_guvi_hackathon_2024".to_string()),
        "sk_test_123456789".to_string(),
    ] {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
