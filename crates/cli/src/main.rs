use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use cli::output::Console;
use helpdesk_core::config;
use helpdesk_core::pipeline::{Reporter, RunMode, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(about = "Support triage and policy answering assistant", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Triage the sample messages, then answer them from the policy documents
    Run {
        /// Which phases to run
        #[arg(long, value_enum, default_value_t = Phase::All)]
        only: Phase,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Classify a single support message
    Triage {
        message: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the policy index and answer one question
    Ask {
        question: String,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Build the policy index and print its report
    Index {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Phase {
    Triage,
    Rag,
    All,
}

impl From<Phase> for RunMode {
    fn from(p: Phase) -> Self {
        match p {
            Phase::Triage => RunMode::Triage,
            Phase::Rag => RunMode::Rag,
            Phase::All => RunMode::All,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;
    info!(
        provider = %cfg.provider.name,
        docs_dir = %cfg.rag.docs_dir,
        "configuration loaded"
    );
    let session = Session::from_config(cfg)?;

    match cli.command {
        Commands::Run { only, json } => {
            let mut console = Console::new(std::io::stdout(), json);
            let summary = session.run(only.into(), &mut console).await?;
            console.summary(&summary)?;
        }
        Commands::Triage { message, json } => {
            let mut console = Console::new(std::io::stdout(), json);
            let result = session.triage(&message).await;
            console.triage(&message, &result)?;
        }
        Commands::Ask { question, json } => {
            let mut console = Console::new(std::io::stdout(), json);
            let answerer = session.build_answerer().await?;
            if !json {
                console.index_built(answerer.index().report())?;
            }
            if !answerer.is_enabled() {
                console.rag_disabled()?;
                return Ok(());
            }
            let result = answerer.ask(&question).await;
            console.answer(&question, &result)?;
        }
        Commands::Index { json } => {
            let mut console = Console::new(std::io::stdout(), json);
            let answerer = session.build_answerer().await?;
            console.index_built(answerer.index().report())?;
        }
    }
    Ok(())
}
