use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use constitution_gpt::{chat, config::SessionArgs, constants, web_server, ChatConfig};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the Constitution GPT web UI.
    Start {
        #[arg(long, env = "CGPT_HOST", default_value = "0.0.0.0", help = "Address to bind the web server to.")]
        host: String,
        #[arg(long, env = "CGPT_PORT", default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(long, help = "Directory holding the page templates.")]
        templates: Option<String>,
        #[arg(long, help = "Directory holding static assets.")]
        static_dir: Option<String>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Chat with Constitution GPT in the terminal.
    Chat {
        #[command(flatten)]
        session: SessionArgs,
    },
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g. RUST_LOG=info,constitution_gpt=debug)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("Constitution GPT starting with command: {:?}", cli.command);

    let mut config = ChatConfig::default();

    match cli.command {
        Commands::Start {
            host,
            port,
            templates,
            static_dir,
            session,
        } => {
            config.host = host;
            config.port = port;
            if let Some(dir) = templates {
                config.templates_dir = dir;
            }
            if let Some(dir) = static_dir {
                config.static_dir = dir;
            }
            session.apply(&mut config);

            let mut web_server_handle = tokio::spawn(async move {
                if let Err(e) = web_server::start_web_server(config).await {
                    error!("Web server failed: {:?}", e);
                }
            });

            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl-C received, initiating shutdown...");
                }
                res = &mut web_server_handle => {
                    match res {
                        Ok(_) => info!("Web server task completed unexpectedly."),
                        Err(e) if e.is_panic() => error!("Web server task panicked: {:?}", e),
                        Err(e) => error!("Web server task failed: {:?}", e),
                    }
                }
            }

            if !web_server_handle.is_finished() {
                info!("Aborting web server task...");
                web_server_handle.abort();
            }
            info!("Shutdown complete.");
        }
        Commands::Chat { session } => {
            session.apply(&mut config);
            info!("Starting interactive chat session...");
            chat::run_terminal_chat(&config)
                .await
                .context("Chat session failed")?;
        }
    }

    Ok(())
}
