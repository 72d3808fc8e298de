use std::fs::{self, File};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use termchat::core::config::{CliOverrides, load_config, resolve, termchat_home};
use termchat::core::state::App;
use termchat::core::store::JsonChatStore;
use termchat::inference::{CompletionProvider, OpenAiProvider};
use termchat::tui;

#[derive(Parser)]
#[command(name = "termchat", about = "Chat with OpenAI models from the terminal")]
struct Args {
    /// Model name (overrides OPEN_AI_MODEL and the config file)
    #[arg(short, long)]
    model: Option<String>,

    /// Directory holding saved conversations
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log verbosity for ~/.termchat/termchat.log
    #[arg(long, default_value = "debug")]
    log_level: LevelFilter,
}

fn init_logging(level: LevelFilter) {
    let Some(home) = termchat_home() else {
        return;
    };
    if fs::create_dir_all(&home).is_err() {
        return;
    }
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(home.join("termchat.log")) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();
    init_logging(args.log_level);

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("termchat: {e}");
            return ExitCode::FAILURE;
        }
    };
    let cli = CliOverrides {
        model: args.model,
        data_dir: args.data_dir,
    };
    let resolved = resolve(&config, &cli);
    info!(
        "termchat starting up: model={}, data_dir={}",
        resolved.model,
        resolved.data_dir.display()
    );

    let store = match JsonChatStore::open(&resolved.data_dir) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open chat store: {}", e);
            eprintln!(
                "termchat: cannot open chat store at {}: {e}",
                resolved.data_dir.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let openai = OpenAiProvider::new(
        resolved.api_key.clone(),
        resolved.organization.clone(),
        Some(resolved.base_url.clone()),
        resolved.model.clone(),
        resolved.request_timeout,
    );
    info!(
        "Using {} provider with model {} ({})",
        openai.name(),
        openai.model(),
        resolved.base_url
    );
    let provider: Arc<dyn CompletionProvider> = Arc::new(openai);

    let size = crossterm::terminal::size().unwrap_or((80, 24));
    let app = App::from_config(Box::new(store), &resolved, size);

    match tui::run(app, provider) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Terminal error: {}", e);
            eprintln!("termchat: {e}");
            ExitCode::FAILURE
        }
    }
}
