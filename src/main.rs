use std::fs::{self, File};
use std::path::{Path, PathBuf};

use clap::Parser;
use justdoit::cli::{self, Cli};
use justdoit::core::config::{self, Overrides};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config_path = args
        .config
        .clone()
        .or_else(config::config_path)
        .unwrap_or_else(|| PathBuf::from("justdoit.toml"));

    // Logger first, so config loading can report what it finds.
    init_logging(&config::log_file_path(&config_path));
    log::set_max_level(config::startup_log_level());

    let file_config = config::load_config(&config_path)?;
    let overrides = Overrides {
        todo_dir: args.dir.clone(),
        list: args.list.clone(),
    };
    let resolved = config::resolve(&file_config, &overrides);
    log::set_max_level(resolved.log_level);

    log::info!(
        "justdoit starting (todo dir {}, list {})",
        resolved.todo_dir.display(),
        resolved.default_list
    );

    let mut stdout = std::io::stdout().lock();
    cli::run(args.command, &resolved, &mut stdout)
}

/// File logger at `log_file`. The logger itself passes every level; the
/// global max level set by the caller does the filtering.
/// Logging is best effort: if the file can't be opened, the app runs silent.
fn init_logging(log_file: &Path) {
    if let Some(dir) = log_file.parent() {
        if fs::create_dir_all(dir).is_err() {
            return;
        }
    }

    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(file) = File::options().create(true).append(true).open(log_file) {
        let _ = WriteLogger::init(LevelFilter::Trace, log_config, file);
    }
}
