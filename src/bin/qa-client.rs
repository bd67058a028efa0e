use std::path::PathBuf;

use clap::Parser;
use qa_forum::client::{api::DEFAULT_API_URL, shell::Shell, HttpForumClient, SessionStore};

#[derive(Parser)]
#[command(name = "qa-client")]
#[command(about = "Terminal client for the Q&A forum")]
#[command(version)]
struct Cli {
    #[arg(long, env = "QA_API_URL", default_value = DEFAULT_API_URL, help = "API base URL, including /api")]
    api_url: String,

    #[arg(long, env = "QA_SESSION_FILE", help = "Where the login session is kept")]
    session_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout belongs to the shell
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let session_file = match cli.session_file {
        Some(path) => path,
        None => SessionStore::default_path()?,
    };

    let shell = Shell::new(HttpForumClient::new(cli.api_url), SessionStore::new(session_file))?;
    shell.run().await
}
