use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use oldfiles_cleaner::editor::{self, read_selection, select_with_fzf, sort_paths};
use oldfiles_cleaner::io_utils::{cleaner_cli_error, io_cli_error, simple_cli_error};
use oldfiles_cleaner::{
    detect_interrupted, stage_filtered_from, Config, Predicate, PredicateSet, SortOrder,
};

const LOG_ENV: &str = "OLDFILES_CLEANER_LOG";

/// Delete items from Neovim oldfiles.
#[derive(Parser)]
#[command(name = "oldfiles-cleaner", version, arg_required_else_help = true)]
struct Args {
    /// List oldfiles and exit
    #[arg(short, long)]
    list: bool,
    /// Delete oldfiles that do not exist in the filesystem
    #[arg(short, long)]
    gone: bool,
    /// Do not confirm before deleting
    #[arg(short, long)]
    yes: bool,
    /// Pick oldfiles to delete with fzf (TAB selects multiple items)
    #[arg(short, long)]
    fzf: bool,
    /// Order of listed and offered oldfiles
    #[arg(long, value_enum)]
    sort: Option<SortOrder>,
    /// ShaDa file to edit instead of asking nvim
    #[arg(long)]
    shada: Option<PathBuf>,
    /// nvim executable
    #[arg(long)]
    nvim: Option<OsString>,
    /// fzf executable
    #[arg(long = "fzf-cmd")]
    fzf_cmd: Option<OsString>,
    /// Print a JSON summary on stdout
    #[arg(long)]
    json: bool,
    /// Verbose logging on stderr
    #[arg(long)]
    debug: bool,
    /// Delete oldfiles matching these regular expressions
    patterns: Vec<String>,
}

#[derive(Serialize, Default)]
struct Report {
    removed: Vec<String>,
    removed_records: usize,
    kept: usize,
    skipped: usize,
    committed: bool,
    backup: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let fallback = if debug { "oldfiles_cleaner=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(args.debug);

    let mut cfg = Config::from_env();
    if let Some(path) = &args.shada {
        cfg.shada = Some(path.clone());
    }
    if let Some(nvim) = &args.nvim {
        cfg.nvim = nvim.clone();
    }
    if let Some(fzf) = &args.fzf_cmd {
        cfg.fzf = fzf.clone();
    }
    if let Some(sort) = args.sort {
        cfg.sort = sort;
    }

    let shada = editor::shada_path(&cfg).map_err(|e| cleaner_cli_error("locating history file", e))?;

    if args.list {
        let mut files = editor::oldfiles(&cfg, &shada).map_err(|e| cleaner_cli_error("listing oldfiles", e))?;
        sort_paths(&mut files, cfg.sort);
        let mut out = io::stdout().lock();
        for file in &files {
            out.write_all(file)?;
            out.write_all(b"\n")?;
        }
        return Ok(());
    }

    if let Some(state) = detect_interrupted(&shada).map_err(|e| cleaner_cli_error("checking history file", e))? {
        return Err(cleaner_cli_error("refusing to continue", state.into()).into());
    }

    let console = Console { json: args.json };
    let mut predicates = PredicateSet::new();
    if args.gone {
        predicates.push(Predicate::Gone);
    }
    for pattern in &args.patterns {
        let p = Predicate::pattern(pattern).map_err(|e| cleaner_cli_error("parsing pattern", e))?;
        predicates.push(p);
    }

    let stdin_is_tty = io::stdin().is_terminal();
    let mut selection = Vec::new();
    if !stdin_is_tty {
        selection.extend(read_selection(io::stdin().lock())?);
    }
    if args.fzf {
        let mut files = editor::oldfiles(&cfg, &shada).map_err(|e| cleaner_cli_error("listing oldfiles", e))?;
        sort_paths(&mut files, cfg.sort);
        let picked = select_with_fzf(&cfg, &files).map_err(|e| cleaner_cli_error("selecting oldfiles", e))?;
        if picked.is_empty() {
            console.say("Nothing selected.");
            return console.finish(&Report::default());
        }
        selection.extend(picked);
    }
    if !selection.is_empty() {
        predicates.push(Predicate::selected(selection));
    }

    let input = File::open(&shada).map_err(|e| io_cli_error("opening history file", &shada, e))?;
    let (staged, summary) = stage_filtered_from(input, &shada, &predicates)
        .map_err(|e| cleaner_cli_error("filtering history", e))?;
    if summary.skipped > 0 {
        tracing::warn!(
            skipped = summary.skipped,
            "some records could not be re-encoded and will be lost"
        );
    }
    let mut report = Report {
        removed: summary
            .removed
            .iter()
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect(),
        removed_records: summary.removed_records,
        kept: summary.kept,
        skipped: summary.skipped,
        ..Report::default()
    };

    if summary.removed.is_empty() {
        staged.abandon()?;
        console.say("Nothing to delete.");
        return console.finish(&report);
    }

    if args.yes {
        for item in &report.removed {
            console.say(&format!("Deleting: {item}"));
        }
    } else {
        console.say("Items to delete:");
        for item in &report.removed {
            console.say(&format!("  {item}"));
        }
        match confirm("Really delete from oldfiles? [Y/n]: ", stdin_is_tty)? {
            Some(true) => {}
            Some(false) => {
                staged.abandon()?;
                return console.finish(&report);
            }
            None => {
                staged.abandon()?;
                return Err(simple_cli_error(
                    "No terminal available to confirm deletion. Rerun with --yes.",
                )
                .into());
            }
        }
    }

    console.say(&format!(
        "Shada backup: {}",
        oldfiles_cleaner::backup_path(&shada).display()
    ));
    let committed = staged
        .commit()
        .map_err(|e| cleaner_cli_error("installing filtered history", e))?;
    report.committed = true;
    report.backup = Some(committed.backup);
    console.say("Done");
    console.finish(&report)
}

/// Prose goes to stdout unless a JSON report was requested.
struct Console {
    json: bool,
}

impl Console {
    fn say(&self, line: &str) {
        if self.json {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    fn finish(&self, report: &Report) -> Result<(), Box<dyn std::error::Error>> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        Ok(())
    }
}

/// Ask a yes/no question. Answers come from stdin when it is a terminal,
/// otherwise from `/dev/tty`. `None` means no terminal could be reached.
fn confirm(prompt: &str, stdin_is_tty: bool) -> io::Result<Option<bool>> {
    let mut answer = String::new();
    if stdin_is_tty {
        prompt_stderr(prompt)?;
        io::stdin().lock().read_line(&mut answer)?;
    } else {
        let Ok(tty) = File::open("/dev/tty") else {
            return Ok(None);
        };
        prompt_stderr(prompt)?;
        BufReader::new(tty).read_line(&mut answer)?;
    }
    let answer = answer.trim().to_ascii_lowercase();
    Ok(Some(matches!(answer.as_str(), "" | "y" | "yes")))
}

fn prompt_stderr(prompt: &str) -> io::Result<()> {
    let mut err = io::stderr().lock();
    err.write_all(prompt.as_bytes())?;
    err.flush()
}
