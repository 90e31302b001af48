use clap::{Parser, Subcommand};
use keyspan_shortener::NodeConfig;

pub const BASE_URL_ENV: &str = "KEYSPAN_BASE_URL";

#[derive(Debug, Parser)]
#[command(name = "keyspan", version, about = "Distributed URL shortener")]
pub struct Cli {
    #[command(flatten)]
    pub config: NodeConfig,

    /// Prefix printed in front of new codes, e.g. `https://ks.io`.
    #[arg(long, global = true, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten one or more long URLs.
    Shorten {
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },
    /// Print the long URL behind a short code.
    Resolve {
        #[arg(value_name = "CODE")]
        code: String,
    },
    /// Delete a short code.
    Delete {
        #[arg(value_name = "CODE")]
        code: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_takes_a_code() {
        let cli = Cli::try_parse_from(["keyspan", "resolve", "b"]).unwrap();
        assert!(matches!(cli.command, Command::Resolve { ref code } if code == "b"));
        assert_eq!(cli.base_url, None);
    }

    #[test]
    fn shorten_takes_several_urls() {
        let cli = Cli::try_parse_from([
            "keyspan",
            "shorten",
            "https://one.example",
            "https://two.example",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Shorten { ref urls } if urls.len() == 2));
    }

    #[test]
    fn shorten_requires_a_url() {
        assert!(Cli::try_parse_from(["keyspan", "shorten"]).is_err());
    }

    #[test]
    fn node_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "keyspan",
            "delete",
            "b",
            "--coordinator",
            "redis",
            "--base-url",
            "https://ks.io",
        ])
        .unwrap();
        assert_eq!(cli.config.coordinator.to_string(), "redis");
        assert_eq!(cli.base_url.as_deref(), Some("https://ks.io"));
    }
}
