// CLI module for nutralingo
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use std::path::PathBuf;

/// nutralingo - Food label and meal analysis backend
#[derive(Parser, Debug)]
#[command(name = "nutralingo", version, about, long_about = None)]
pub struct Args {
    /// Configuration file (defaults to ~/.nutralingo/config.toml when present)
    #[arg(short, long, env = "NUTRALINGO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut crate::config::AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_overrides_replace_server_address() {
        let args = Args::parse_from(["nutralingo", "--host", "0.0.0.0", "-p", "8080"]);
        let mut config = AppConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_no_overrides_keep_defaults() {
        let args = Args::parse_from(["nutralingo"]);
        let mut config = AppConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.server.port, 5000);
    }
}
