// command line interface

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

use crate::{Claude, Db, Dispatcher, Error, Server, config, stdio, tools};

#[derive(Parser)]
#[command(name = "cliniq", about = "AI-driven appointment server for postgres")]
struct Cli {
    /// database connection url (falls back to PG_* variables)
    #[arg(long, short, env = "DATABASE_URL", global = true)]
    db: Option<String>,

    /// api key for the ai service
    #[arg(long, short = 'k', global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// start as http server
    Serve {
        /// port number
        #[arg(long, short, default_value = "3000")]
        port: u16,

        /// host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let db = Db::connect(&config::database_url(cli.db)).await?;

    // the direct database tools still work without an api key; only `ask`
    // needs the ai client
    let ai = match Claude::new(cli.api_key) {
        Ok(claude) => Some(claude),
        Err(Error::MissingApiKey) => {
            tracing::warn!("no api key found; natural-language queries disabled");
            None
        }
        Err(e) => return Err(e.into()),
    };

    let registry = tools::default_registry()?;
    let dispatcher = Dispatcher::new(db, ai, registry);

    match cli.command {
        Some(Commands::Serve { port, host }) => Ok(Server::run(dispatcher, &host, port).await?),
        None => Ok(stdio::run(dispatcher).await?),
    }
}
