//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Refetch - caching, deduplicating API client
#[derive(Parser, Debug)]
#[command(name = "refetch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "REFETCH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Issue one read and print the JSON body
    Get(GetArgs),

    /// Issue a write (or any method) and print the JSON body
    Send(SendArgs),

    /// Bind a path with background refresh and print every change
    Watch(WatchArgs),

    /// Fire concurrent reads and print cache and timing metrics
    CacheDemo(CacheDemoArgs),
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Request path, e.g. /articles?page=1
    pub path: String,

    /// Bearer token
    #[arg(short, long, env = "REFETCH_TOKEN")]
    pub token: Option<String>,

    /// Bypass the response cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Request path
    pub path: String,

    #[arg(short, long, env = "REFETCH_TOKEN")]
    pub token: Option<String>,

    /// JSON request body
    #[arg(short, long)]
    pub body: Option<String>,

    /// Cache path prefix to drop after success (repeatable)
    #[arg(long = "invalidate", value_name = "PREFIX")]
    pub invalidate: Vec<String>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    pub path: String,

    #[arg(short, long, env = "REFETCH_TOKEN")]
    pub token: Option<String>,

    /// Background refresh interval (defaults to config)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Stale time (defaults to config)
    #[arg(long)]
    pub stale_ms: Option<u64>,

    /// Stop after this many state changes
    #[arg(long, default_value_t = 5)]
    pub count: usize,
}

#[derive(Args, Debug)]
pub struct CacheDemoArgs {
    pub path: String,

    #[arg(short, long, env = "REFETCH_TOKEN")]
    pub token: Option<String>,

    /// Number of concurrent reads in the first burst
    #[arg(long, default_value_t = 5)]
    pub repeat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_send_with_invalidations() {
        let cli = Cli::try_parse_from([
            "refetch",
            "-v",
            "send",
            "post",
            "/journals",
            "--body",
            r#"{"title":"t"}"#,
            "--invalidate",
            "/journals",
            "--invalidate",
            "/notes",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Send(args) => {
                assert_eq!(args.method, "post");
                assert_eq!(args.invalidate, vec!["/journals", "/notes"]);
                assert!(args.body.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_watch_defaults() {
        let cli = Cli::try_parse_from(["refetch", "watch", "/digests/2024-05-01"]).unwrap();
        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.count, 5);
                assert!(args.interval_ms.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_cache_demo() {
        let cli = Cli::try_parse_from(["refetch", "cache-demo", "/articles", "--repeat", "8"]).unwrap();
        assert!(matches!(cli.command, Commands::CacheDemo(CacheDemoArgs { repeat: 8, .. })));
    }
}
