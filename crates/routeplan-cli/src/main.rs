use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "routeplan",
    about = "routeplan — compile gateway Mappings into an ordered route table",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a snapshot and print the route table.
    ///
    /// A fatal error (unknown mapping kind, duplicate resource key) exits
    /// non-zero and prints no table.
    Compile {
        /// Snapshot file with [[mappings]] and [[tls_contexts]]
        #[arg(short, long)]
        snapshot: String,
        /// routeplan.toml (default: built-in kinds)
        #[arg(short, long)]
        config: Option<String>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Compile a snapshot and report only warnings and errors.
    Check {
        #[arg(short, long)]
        snapshot: String,
        #[arg(short, long)]
        config: Option<String>,
        /// Exit non-zero when the pass produced warnings
        #[arg(long)]
        deny_warnings: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("routeplan=info".parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            snapshot,
            config,
            format,
        } => commands::compile::compile(&snapshot, config.as_deref(), &format),
        Commands::Check {
            snapshot,
            config,
            deny_warnings,
        } => commands::compile::check(&snapshot, config.as_deref(), deny_warnings),
    }
}
