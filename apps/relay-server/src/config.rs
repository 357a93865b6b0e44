use std::net::IpAddr;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SEND_BUFFER: usize = 256;
const DEFAULT_WELCOME: &str = "Welcome to Local Chat! 🎉";

/// Relay server configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub host: IpAddr,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Capacity of each connection's outbound frame queue.
    pub send_buffer: usize,
    /// Text of the `system` frame greeting every new connection.
    pub welcome_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            send_buffer: DEFAULT_SEND_BUFFER,
            welcome_message: DEFAULT_WELCOME.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; missing or unparseable values fall back
    /// to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            send_buffer: lookup("SEND_BUFFER")
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.send_buffer),
            welcome_message: lookup("WELCOME_MESSAGE")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.welcome_message),
        }
    }
}
