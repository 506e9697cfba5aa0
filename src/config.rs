use crate::completion::{DEFAULT_API_BASE, DEFAULT_MODEL};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_PROMPT_PATH: &str = "prompt.txt";
/// Largest accepted `/ask` body, matching the extension server's `100kb` limit.
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Settings for [`crate::web::serve`]. The binary fills this from command-line
/// flags, each with an environment fallback.
#[derive(Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub prompt_path: PathBuf,
    pub model: String,
    pub api_key: Option<String>,
    pub api_base: String,
    pub enable_openapi: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            prompt_path: PathBuf::from(DEFAULT_PROMPT_PATH),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            enable_openapi: true,
        }
    }
}

// Hand-written so the API key never reaches the logs.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("addr", &self.addr)
            .field("prompt_path", &self.prompt_path)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("enable_openapi", &self.enable_openapi)
            .finish()
    }
}
