use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download news from newsapi.org
    Fetch(FetchArgs),
    /// Serve stored news as a paginated JSON API
    Serve {
        /// Address to bind (host:port), overrides `bind_addr` from the config
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Apikey for newsapi.org, falls back to `newsapi_key` from the config
    #[arg(short = 'k', long)]
    pub apikey: Option<String>,

    /// Limit for downloading news
    #[arg(short, long, default_value_t = 100)]
    pub count: usize,

    /// End point path for downloading news
    #[arg(short, long, default_value = "everything")]
    pub theme: String,

    /// q parameter for requests
    #[arg(short, long, default_value = "python")]
    pub q: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_defaults() {
        let cli = Cli::parse_from(["newsfeed", "fetch", "--apikey", "abc"]);

        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.apikey.as_deref(), Some("abc"));
        assert_eq!(args.count, 100);
        assert_eq!(args.theme, "everything");
        assert_eq!(args.q, "python");
        assert!(cli.config.is_none());
    }

    #[test]
    fn fetch_short_flags() {
        let cli = Cli::parse_from([
            "newsfeed", "fetch", "-k", "abc", "-c", "20", "-t", "top-headlines", "-q", "rust",
        ]);

        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.count, 20);
        assert_eq!(args.theme, "top-headlines");
        assert_eq!(args.q, "rust");
    }

    #[test]
    fn serve_with_global_config() {
        let cli = Cli::parse_from(["newsfeed", "serve", "--bind", "0.0.0.0:9000", "--config", "/tmp/c.toml"]);

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:9000"));
    }

    #[test]
    fn count_must_be_a_number() {
        assert!(Cli::try_parse_from(["newsfeed", "fetch", "-c", "many"]).is_err());
    }
}
