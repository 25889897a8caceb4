//! Controller configuration.

use clap::Parser;

/// Controller configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "devgrid-controller", about = "DevGrid controller", version)]
pub struct Config {
    /// gRPC server bind address (worker channels).
    #[arg(long, default_value = "[::1]:50051")]
    pub grpc_addr: String,

    /// HTTP server bind address (operator API).
    #[arg(long, default_value = "[::1]:8080")]
    pub http_addr: String,

    /// Liveness reap interval in seconds.
    #[arg(long, default_value_t = 60)]
    pub reap_interval_secs: u64,

    /// Contact staleness threshold in seconds before a worker is forced
    /// offline.
    #[arg(long, default_value_t = 300)]
    pub stale_after_secs: u64,

    /// Static bearer token required on mutating HTTP routes. Unset leaves
    /// the API open.
    #[arg(long, env = "DEVGRID_API_TOKEN")]
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grpc_addr: "[::1]:50051".to_string(),
            http_addr: "[::1]:8080".to_string(),
            reap_interval_secs: 60,
            stale_after_secs: 300,
            api_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn arg_definitions_are_valid() {
        Config::command().debug_assert();
    }

    #[test]
    fn token_flag_overrides_the_default() {
        let config =
            Config::parse_from(["devgrid-controller", "--api-token", "s3cret"]);
        assert_eq!(config.api_token.as_deref(), Some("s3cret"));
    }
}
