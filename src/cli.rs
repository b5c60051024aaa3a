//! # Command Line
//!
//! Thin front end over the core: each subcommand opens what it needs, makes
//! one call into the store or workspace, and prints the result.
//! Output goes to the writer passed in, so commands are testable without a
//! terminal.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::core::config::ResolvedConfig;
use crate::core::generate::{completed_count, generate};
use crate::core::store::TodoStore;
use crate::core::todo::TodoItem;
use crate::core::workspace::{Workspace, WorkspaceError, list_file_name, list_stem};

#[derive(Parser, Debug)]
#[command(name = "justdoit", about = "Personal todo lists, one JSON file each")]
pub struct Cli {
    /// Config file [default: ~/.justdoit/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the lists
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// List to work on [default: from config]
    #[arg(short, long, global = true)]
    pub list: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show all lists with open/done counts
    Lists {
        /// Show archived lists instead
        #[arg(long)]
        archived: bool,
    },
    /// Print the items of a list
    Show,
    /// Add a todo on top of the list
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Mark a todo done, or reopen it
    Toggle { id: u64 },
    /// Change the title of a todo
    Edit {
        id: u64,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Remove a todo
    Rm { id: u64 },
    /// Create a new list
    New { name: String },
    /// Delete a list file
    Delete { name: String },
    /// Move a list into the archive
    Archive { name: String },
    /// Move a list out of the archive
    Unarchive { name: String },
    /// Write a large synthetic list for testing
    Generate {
        /// Number of todos to generate
        #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
        /// Percentage of todos marked as completed (0-100)
        #[arg(long, default_value_t = 33.0)]
        completion: f64,
        /// Output file [default: <todo_dir>/test_<count>.json]
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Execute `command` against the lists described by `config`.
pub fn run(command: Command, config: &ResolvedConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let ws = Workspace::open(&config.todo_dir, &config.archive_dir)
        .context("failed to prepare todo directory")?;
    let list = config.default_list.as_str();
    info!("Running {:?} (list {})", command, list);

    match command {
        Command::Lists { archived } => {
            if archived {
                print_lists(&ws.archived()?, ws.archive_dir(), None, out)?;
            } else {
                ws.ensure_default(list)?;
                print_lists(&ws.lists()?, ws.todo_dir(), Some(list), out)?;
            }
        }
        Command::Show => {
            let store = open_store(&ws, list)?;
            print_store(list, &store, out)?;
        }
        Command::Add { title } => {
            let title = join_title(&title)?;
            let mut store = open_store(&ws, list)?;
            let id = store.add(title)?;
            writeln!(out, "Added #{id} to {}", list_stem(list))?;
        }
        Command::Toggle { id } => {
            let mut store = open_store(&ws, list)?;
            if !store.toggle_id(id)? {
                writeln!(out, "No todo #{id} in {}", list_stem(list))?;
                return Ok(());
            }
            let done = store.get(id).is_some_and(|item| item.completed);
            let verb = if done { "Completed" } else { "Reopened" };
            writeln!(out, "{verb} #{id}")?;
            if store.all_completed() {
                writeln!(
                    out,
                    "All complete! Archive this list with `justdoit archive {}`",
                    list_stem(list)
                )?;
            }
        }
        Command::Edit { id, title } => {
            let title = join_title(&title)?;
            let mut store = open_store(&ws, list)?;
            if store.update_id(id, title)? {
                writeln!(out, "Updated #{id}")?;
            } else {
                writeln!(out, "No todo #{id} in {}", list_stem(list))?;
            }
        }
        Command::Rm { id } => {
            let mut store = open_store(&ws, list)?;
            if store.delete_id(id)? {
                writeln!(out, "Deleted #{id}")?;
            } else {
                writeln!(out, "No todo #{id} in {}", list_stem(list))?;
            }
        }
        Command::New { name } => {
            let store = ws.create(&name)?;
            writeln!(out, "Created {}", store.path().display())?;
        }
        Command::Delete { name } => {
            ws.delete(&name)?;
            writeln!(out, "Deleted {}", list_file_name(&name)?)?;
            if ws.ensure_default(list)? {
                writeln!(out, "Created {}", list_file_name(list)?)?;
            }
        }
        Command::Archive { name } => {
            let to = ws.archive(&name)?;
            writeln!(out, "Archived to {}", to.display())?;
            if ws.ensure_default(list)? {
                writeln!(out, "Created {}", list_file_name(list)?)?;
            }
        }
        Command::Unarchive { name } => {
            let to = ws.unarchive(&name)?;
            writeln!(out, "Unarchived to {}", to.display())?;
        }
        Command::Generate {
            count,
            completion,
            output,
        } => {
            if !(0.0..=100.0).contains(&completion) {
                bail!("completion percentage must be between 0 and 100");
            }
            let count = usize::try_from(count).context("count is too large")?;
            let output =
                output.unwrap_or_else(|| ws.todo_dir().join(format!("test_{count}.json")));

            let store = TodoStore::from_document(&output, generate(count, completion, chrono::Utc::now()));
            store.save()?;

            let size = fs::metadata(&output)
                .with_context(|| format!("failed to stat {}", output.display()))?
                .len();
            let done = completed_count(count, completion);
            writeln!(out, "Generated {}", output.display())?;
            writeln!(out, "  Todos: {count} ({done} completed, {} incomplete)", count - done)?;
            writeln!(
                out,
                "  Size: {:.2} MB ({size} bytes)",
                size as f64 / (1024.0 * 1024.0)
            )?;
        }
    }
    Ok(())
}

/// Open a list; a corrupted file is reported and replaced by an empty store.
/// The raw bytes are already safe in `<file>.corrupted` at that point.
fn open_store(ws: &Workspace, name: &str) -> anyhow::Result<TodoStore> {
    match ws.open_list(name) {
        Ok(store) => Ok(store),
        Err(WorkspaceError::Store(e)) if e.is_corrupted() => {
            warn!("{e}");
            eprintln!("warning: {e}; continuing with an empty list");
            Ok(TodoStore::fresh(ws.list_path(name)?))
        }
        Err(e) => Err(e).with_context(|| format!("failed to open list {name}")),
    }
}

fn join_title(words: &[String]) -> anyhow::Result<String> {
    let title = words.join(" ").trim().to_string();
    if title.is_empty() {
        bail!("todo title cannot be empty");
    }
    Ok(title)
}

fn print_lists(
    files: &[String],
    dir: &Path,
    current: Option<&str>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if files.is_empty() {
        writeln!(out, "No lists in {}", dir.display())?;
        return Ok(());
    }
    let current = current.and_then(|name| list_file_name(name).ok());
    for file in files {
        let marker = if current.as_deref() == Some(file.as_str()) { '*' } else { ' ' };
        let summary = match TodoStore::peek(dir.join(file)) {
            Ok(store) => {
                let (open, done) = store.counts();
                format!("{open} open, {done} done")
            }
            Err(e) if e.is_corrupted() => "corrupted".to_string(),
            Err(e) => {
                warn!("Failed to read {}: {}", file, e);
                "unreadable".to_string()
            }
        };
        writeln!(out, "{marker} {:<24} {summary}", list_stem(file))?;
    }
    Ok(())
}

fn print_store(name: &str, store: &TodoStore, out: &mut impl Write) -> anyhow::Result<()> {
    let (open, done) = store.counts();
    writeln!(out, "{} ({open} open, {done} done)", list_stem(name))?;
    if store.is_empty() {
        writeln!(out, "No todos yet. Add one with `justdoit add <title>`.")?;
        return Ok(());
    }
    for item in store.items() {
        writeln!(out, "{}", format_item(item))?;
    }
    Ok(())
}

fn format_item(item: &TodoItem) -> String {
    let checkbox = if item.completed { "[x]" } else { "[ ]" };
    let created = item.created_at.with_timezone(&Local).format("%b %d");
    format!("{:>5}  {checkbox} {}  ({created})", format!("#{}", item.id), item.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::scratch;
    use clap::CommandFactory;
    use log::LevelFilter;
    use tempfile::TempDir;

    fn test_config() -> (TempDir, ResolvedConfig) {
        let dir = scratch();
        let todo_dir = dir.path().join("todos");
        let config = ResolvedConfig {
            archive_dir: todo_dir.join("archive"),
            todo_dir,
            default_list: "default".to_string(),
            log_level: LevelFilter::Off,
        };
        (dir, config)
    }

    fn exec(config: &ResolvedConfig, command: Command) -> String {
        let mut out = Vec::new();
        run(command, config, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_global_flags() {
        let cli = Cli::try_parse_from(["justdoit", "add", "buy", "milk", "--list", "groceries"]).unwrap();
        assert_eq!(cli.list.as_deref(), Some("groceries"));
        assert_eq!(cli.command, Command::Add { title: words("buy milk") });
    }

    #[test]
    fn test_parse_generate_rejects_zero_count() {
        assert!(Cli::try_parse_from(["justdoit", "generate", "--count", "0"]).is_err());
    }

    #[test]
    fn test_add_toggle_show() {
        let (_dir, config) = test_config();

        assert_eq!(exec(&config, Command::Add { title: words("buy milk") }), "Added #1 to default\n");
        exec(&config, Command::Add { title: words("walk dog") });
        assert_eq!(exec(&config, Command::Toggle { id: 1 }), "Completed #1\n");

        let shown = exec(&config, Command::Show);
        let lines: Vec<&str> = shown.lines().collect();
        assert_eq!(lines[0], "default (1 open, 1 done)");
        assert!(lines[1].contains("#2  [ ] walk dog"));
        assert!(lines[2].contains("#1  [x] buy milk"));
    }

    #[test]
    fn test_toggle_last_open_item_suggests_archive() {
        let (_dir, config) = test_config();
        exec(&config, Command::Add { title: words("only thing") });

        let out = exec(&config, Command::Toggle { id: 1 });

        assert!(out.contains("All complete!"));
        assert!(out.contains("justdoit archive default"));
    }

    #[test]
    fn test_unknown_id_reports_and_succeeds() {
        let (_dir, config) = test_config();
        exec(&config, Command::Add { title: words("a") });

        assert_eq!(exec(&config, Command::Toggle { id: 42 }), "No todo #42 in default\n");
        assert_eq!(exec(&config, Command::Rm { id: 42 }), "No todo #42 in default\n");
        assert_eq!(
            exec(&config, Command::Edit { id: 42, title: words("x") }),
            "No todo #42 in default\n"
        );
    }

    #[test]
    fn test_edit_and_rm() {
        let (_dir, config) = test_config();
        exec(&config, Command::Add { title: words("typo") });

        assert_eq!(exec(&config, Command::Edit { id: 1, title: words("fixed") }), "Updated #1\n");
        assert!(exec(&config, Command::Show).contains("fixed"));
        assert_eq!(exec(&config, Command::Rm { id: 1 }), "Deleted #1\n");
        assert!(exec(&config, Command::Show).contains("No todos yet"));
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let (_dir, config) = test_config();
        let mut out = Vec::new();

        let err = run(Command::Add { title: vec!["  ".to_string()] }, &config, &mut out).unwrap_err();

        assert!(err.to_string().contains("cannot be empty"));
        assert!(!config.todo_dir.join("default.json").exists());
    }

    #[test]
    fn test_lists_creates_default_and_marks_current() {
        let (_dir, config) = test_config();
        exec(&config, Command::New { name: "groceries".to_string() });

        let out = exec(&config, Command::Lists { archived: false });
        // groceries exists, so no default is created
        assert!(out.contains("groceries"));
        assert!(!out.contains("* default"));

        exec(&config, Command::Delete { name: "groceries".to_string() });
        let out = exec(&config, Command::Lists { archived: false });
        assert!(out.starts_with("* default"));
        assert!(out.contains("0 open, 0 done"));
    }

    #[test]
    fn test_archive_and_unarchive() {
        let (_dir, config) = test_config();
        exec(&config, Command::New { name: "other".to_string() });
        exec(&config, Command::Add { title: words("ship") });

        let out = exec(&config, Command::Archive { name: "default".to_string() });
        assert!(out.contains("Archived to"));
        assert!(!out.contains("Created"));
        assert!(exec(&config, Command::Lists { archived: true }).contains("default"));
        assert!(exec(&config, Command::Show).contains("No todos yet"));

        let out = exec(&config, Command::Unarchive { name: "default".to_string() });
        assert!(out.contains("Unarchived to"));
        assert!(exec(&config, Command::Show).contains("ship"));
    }

    #[test]
    fn test_archiving_only_list_recreates_default() {
        let (_dir, config) = test_config();
        exec(&config, Command::Add { title: words("ship") });

        let out = exec(&config, Command::Archive { name: "default".to_string() });

        assert!(out.contains("Created default.json"));
        assert!(config.todo_dir.join("default.json").is_file());
        assert!(config.archive_dir.join("default.json").is_file());
    }

    #[test]
    fn test_corrupted_list_continues_empty() {
        let (_dir, config) = test_config();
        fs::create_dir_all(&config.todo_dir).unwrap();
        let path = config.todo_dir.join("default.json");
        fs::write(&path, b"{ broken").unwrap();

        let out = exec(&config, Command::Add { title: words("fresh start") });

        assert_eq!(out, "Added #1 to default\n");
        assert_eq!(fs::read(config.todo_dir.join("default.json.corrupted")).unwrap(), b"{ broken");
        assert!(exec(&config, Command::Lists { archived: false }).contains("1 open, 0 done"));
    }

    #[test]
    fn test_lists_does_not_back_up_corrupted_files() {
        let (_dir, config) = test_config();
        fs::create_dir_all(&config.todo_dir).unwrap();
        fs::write(config.todo_dir.join("default.json"), b"{ broken").unwrap();

        let out = exec(&config, Command::Lists { archived: false });

        assert!(out.contains("corrupted"));
        assert!(!config.todo_dir.join("default.json.corrupted").exists());
    }

    #[test]
    fn test_generate_writes_loadable_file() {
        let (_dir, config) = test_config();

        let out = exec(
            &config,
            Command::Generate {
                count: 300,
                completion: 10.0,
                output: None,
            },
        );

        assert!(out.contains("Todos: 300 (30 completed, 270 incomplete)"));
        let store = TodoStore::open(config.todo_dir.join("test_300.json")).unwrap();
        assert_eq!(store.counts(), (270, 30));
        assert_eq!(store.next_id(), 301);
    }

    #[test]
    fn test_generate_rejects_bad_percentage() {
        let (_dir, config) = test_config();
        let mut out = Vec::new();
        let command = Command::Generate {
            count: 10,
            completion: 120.0,
            output: None,
        };

        assert!(run(command, &config, &mut out).is_err());
    }
}
