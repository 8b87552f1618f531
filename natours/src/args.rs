use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use natours_config::Environment;

/// Natours web server
#[derive(Debug, Parser)]
#[command(name = "natours", about = "Hardened request pipeline for the Natours tour-booking site")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "natours.toml", env = "NATOURS_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "NATOURS_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the deployment mode (`development` or `production`)
    #[arg(long, env = "NATOURS_ENVIRONMENT")]
    pub environment: Option<Environment>,

    /// Override the log filter directive
    #[arg(long, env = "NATOURS_LOG")]
    pub log_filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_parse() {
        let args = Args::try_parse_from([
            "natours",
            "--config",
            "/etc/natours.toml",
            "--listen",
            "0.0.0.0:8000",
            "--environment",
            "prod",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("/etc/natours.toml"));
        assert_eq!(args.listen, Some(SocketAddr::from(([0, 0, 0, 0], 8000))));
        assert_eq!(args.environment, Some(Environment::Production));
    }

    #[test]
    fn unknown_environment_is_rejected() {
        assert!(Args::try_parse_from(["natours", "--environment", "staging"]).is_err());
    }
}
