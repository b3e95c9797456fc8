use std::{sync::Arc, thread};

use colored::Colorize;
use config::ConfigError;
use console::Console;
use encore_collab::SessionEvent;
use log::{error, info};
use thiserror::Error;
use tokio::runtime::{self, Runtime};

use crate::logging::LogColor;

mod config;
mod console;
mod logging;

pub struct Encore {
    console: Arc<Console>,
    finished: tokio::sync::mpsc::UnboundedReceiver<console::Finished>,
    runtime: Runtime,
}

#[derive(Debug, Error)]
enum EncoreError {
    #[error("Could not load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

impl Encore {
    fn new() -> Result<Self, EncoreError> {
        info!("Building async runtime...");
        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("encore-async")
            .build()
            .map_err(|e| EncoreError::Fatal(e.to_string()))?;

        let config = config::load_config()?;
        let (console, finished) = Console::new(config);

        Ok(Self {
            console,
            finished,
            runtime,
        })
    }

    fn run(self) -> anyhow::Result<()> {
        let events = self.console.collab().events();
        thread::spawn(move || {
            for event in events.iter() {
                log_event(&event);
            }
        });

        let console = self.console;
        let finished = self.finished;

        self.runtime.block_on(async move {
            tokio::spawn(console.clone().forward_finished(finished));
            console.run().await
        })
    }
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Opened { destination } => info!("Session opened in {}", destination),
        SessionEvent::ItemStarted { title, .. } => info!("Started {}", title),
        SessionEvent::ItemErrored { reason, .. } => info!("Passed over an item: {}", reason),
        SessionEvent::QueueUpdated { length, .. } => info!("{} item(s) queued", length),
        SessionEvent::Closed {
            destination,
            reason,
        } => info!("Session in {} closed {}", destination, reason),
        SessionEvent::StateChanged { .. } => {}
    }
}

impl EncoreError {
    fn hint(&self) -> String {
        match self {
            EncoreError::Config(_) => format!(
                "Check the file at {}, or set ENCORE_CONFIG to another one.",
                config::config_path().display()
            ),
            EncoreError::Fatal(_) => "This error is fatal, and should not happen.".to_string(),
        }
    }
}

fn main() {
    if let Err(e) = logging::init_logger() {
        eprintln!("Could not initialize logging: {}", e);
        return;
    }

    match Encore::new() {
        Ok(encore) => {
            info!("Initialized successfully.");

            if let Err(e) = encore.run() {
                error!("{:#}", e);
            }
        }
        Err(error) => {
            error!(
                "{} Read the error below to troubleshoot the issue.",
                "Encore failed to start!".bold().color(LogColor::RED)
            );
            error!("{}", error);
            error!(
                "{}",
                format!("Hint: {}", error.hint())
                    .color(LogColor::DIMMED)
                    .italic()
            );
        }
    }
}
