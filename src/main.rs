mod api;
mod app;
mod board;
mod config;
mod daily;
mod error;
mod grouping;
mod models;
mod parser;
mod slots;
mod storage;
mod ui;

use crate::api::{ClassifierConfig, PriorityClassifier};
use crate::app::App;
use crate::board::TaskBoard;
use crate::config::Config;
use crate::slots::SlotWindow;
use crate::storage::FileStore;
use chrono::Local;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &Config) -> io::Result<()> {
    fs::create_dir_all(&config.data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())?;

    // The terminal belongs to the UI, so logs go to a file
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    init_logging(&config)?;

    let classifier = PriorityClassifier::new(ClassifierConfig::from(&config));
    let mut board = TaskBoard::new(
        FileStore::new(&config.data_dir),
        SlotWindow::new(config.start_hour, config.end_hour),
    );
    board.initialize(Local::now().date_naive());

    let app = App::new(board, classifier);

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = ui::run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("UI loop failed: {:?}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
