//! Pagefeed server — entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use pagefeed::RawParams;
use pagefeed_server::{ConfigOverrides, FeedService, ServerConfig};

#[derive(Parser)]
#[command(
    name = "pagefeed-server",
    about = "Turn any HTML page into an RSS feed",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default).
    Serve {
        /// Listen address (host:port). Also reads PAGEFEED_ADDR.
        #[arg(long)]
        addr: Option<String>,

        /// Upstream fetch timeout in milliseconds. Also reads PAGEFEED_FETCH_TIMEOUT_MS.
        #[arg(long)]
        fetch_timeout_ms: Option<u64>,

        /// User-Agent sent to origin servers. Also reads PAGEFEED_USER_AGENT.
        #[arg(long)]
        user_agent: Option<String>,
    },

    /// Run one parse request and print the response body to stdout.
    ///
    /// Examples:
    ///   pagefeed-server fetch https://example.com/list --filter magnet
    ///   pagefeed-server fetch https://example.com/list --area "table.files" --type json
    Fetch {
        /// Absolute target URL.
        url: String,

        /// Link filter: "magnet" or a substring of the href.
        #[arg(long)]
        filter: Option<String>,

        /// Region selector (default "body").
        #[arg(long)]
        area: Option<String>,

        /// Element selector (default "a").
        #[arg(long)]
        selector: Option<String>,

        /// Output type: xml or json.
        #[arg(long = "type")]
        output_type: Option<String>,

        /// Feed title.
        #[arg(long)]
        title: Option<String>,

        /// Feed description.
        #[arg(long)]
        description: Option<String>,

        /// Regex applied to each item's text.
        #[arg(long)]
        format_regex: Option<String>,

        /// Replacement for --format-regex ($1, $&, $<name>).
        #[arg(long)]
        format_replace: Option<String>,

        /// Feed template: bt, rss2 or atom.
        #[arg(long)]
        template: Option<String>,

        /// Upstream fetch timeout in milliseconds.
        #[arg(long)]
        fetch_timeout_ms: Option<u64>,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   pagefeed-server completions bash > ~/.local/share/bash-completion/completions/pagefeed-server
    ///   pagefeed-server completions zsh > ~/.zfunc/_pagefeed-server
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve {
        addr: None,
        fetch_timeout_ms: None,
        user_agent: None,
    }) {
        Commands::Serve {
            addr,
            fetch_timeout_ms,
            user_agent,
        } => {
            let config = ServerConfig::resolve(&ConfigOverrides {
                addr,
                fetch_timeout_ms,
                user_agent,
            });
            tracing::debug!("Resolved config: {config:?}");
            pagefeed_server::serve(&config).await?;
        }

        Commands::Fetch {
            url,
            filter,
            area,
            selector,
            output_type,
            title,
            description,
            format_regex,
            format_replace,
            template,
            fetch_timeout_ms,
        } => {
            let config = ServerConfig::resolve(&ConfigOverrides {
                fetch_timeout_ms,
                ..Default::default()
            });
            let params = RawParams {
                filter,
                area,
                selector,
                output_type,
                title,
                description,
                format_regex,
                format_replace,
                template,
            };

            let service = FeedService::new(&config)?;
            let response = service.handle(&url, &params).await;
            println!("{}", response.body.trim_end());
            if !response.is_success() {
                std::process::exit(1);
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "pagefeed-server", &mut std::io::stdout());
        }
    }

    Ok(())
}
