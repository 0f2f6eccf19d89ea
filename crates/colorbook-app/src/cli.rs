//! Command-line entry points.

use crate::app::App;
use crate::catalog::{ImageCatalog, page_key};
use crate::error::AppError;
use crate::loader::FileImageSource;
use crate::script::parse_actions;
use clap::{Parser, Subcommand};
use colorbook_core::{FileStorage, LoadOutcome, Notice, PersistenceGateway, SessionConfig};
use kurbo::Size;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Colorbook: fill and draw on coloring pages from the terminal.
#[derive(Parser, Debug)]
#[command(name = "colorbook", version, about)]
pub struct CliArgs {
    /// JSON session config; missing fields keep their defaults.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where saved progress lives (default: the user data directory).
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a page, replay actions on it and save progress.
    Paint {
        /// The coloring page.
        image: PathBuf,

        /// Actions such as `color=#ff0000`, `fill@120,80`, `draw@0,0;40,40`, `undo`.
        actions: Vec<String>,

        /// Display width in display pixels.
        #[arg(long, default_value_t = 800.0)]
        width: f64,

        /// Display height in display pixels.
        #[arg(long, default_value_t = 600.0)]
        height: f64,

        /// Ignore saved progress and start from the blank page.
        #[arg(long)]
        fresh: bool,

        /// Write the display surface here (PNG, JPEG or WEBP by extension).
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// List the pages in a directory, marking those in progress.
    Catalog {
        dir: PathBuf,
    },
    /// List pages with saved progress.
    Saved,
    /// Delete saved progress for one page.
    Clear {
        image: PathBuf,
    },
    /// Delete all saved progress.
    ForgetAll,
}

/// Run a parsed command line.
pub fn run(args: CliArgs) -> Result<(), AppError> {
    let config = load_config(args.config.as_deref())?;
    let storage = Arc::new(match &args.storage_dir {
        Some(dir) => FileStorage::new(dir.clone())?,
        None => FileStorage::default_location()?,
    });
    log::debug!("Saved progress in {}", storage.base_path().display());

    match args.command {
        Command::Paint {
            image,
            actions,
            width,
            height,
            fresh,
            output,
        } => {
            let actions = parse_actions(&actions)?;
            let key = page_key(&image);
            let mut app = App::new(config, storage, FileImageSource::new(), Size::new(width, height))?;

            if let LoadOutcome::Failed(e) = app.open(&key, fresh) {
                eprintln!("warning: could not load {}: {}", image.display(), e);
            }
            for action in &actions {
                app.apply(action);
            }
            app.drain_saves();
            report_notices(app.take_notices());

            if let Some(output) = output {
                app.export(&output)?;
            }
        }
        Command::Catalog { dir } => {
            let mut catalog = ImageCatalog::scan(&dir)?;
            catalog.mark_saved(&pollster::block_on(storage.list()));
            for entry in catalog.entries() {
                let marker = if entry.in_progress { "*" } else { " " };
                println!("{} {}", marker, entry.name);
            }
        }
        Command::Saved => {
            let mut keys = pollster::block_on(storage.list());
            keys.sort();
            for key in keys {
                println!("{}", key);
            }
        }
        Command::Clear { image } => {
            pollster::block_on(storage.delete(&page_key(&image)))?;
            log::info!("Cleared saved progress for {}", image.display());
        }
        Command::ForgetAll => {
            pollster::block_on(storage.clear())?;
            log::info!("Cleared all saved progress");
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig, AppError> {
    match path {
        Some(path) => Ok(SessionConfig::from_json(&std::fs::read_to_string(path)?)?),
        None => Ok(SessionConfig::default()),
    }
}

fn report_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice {
            Notice::LoadFailed(_) => {}
            Notice::DeleteFailed(e) => eprintln!("warning: {}", e),
        }
    }
}
