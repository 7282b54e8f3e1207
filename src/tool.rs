// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! CLI tool for experimenting with cuckoo tables

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use cuckoo_table::{Action, Config, Item, SharedCuckooTable, MAX_BUCKET_SIZE, MAX_DEPTH};
use humansize::{SizeFormatter, BINARY};
use rustyline::DefaultEditor;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
    registry::Registry,
};

macro_rules! die {
    ($fmt:literal, $($arg:tt)*) => {{
        eprintln!($fmt, $($arg)*);
        std::process::exit(1);
    }};

    ($msg:literal) => {{
        eprintln!($msg);
        std::process::exit(1);
    }};
}

#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

pub fn init_tracing(quiet: bool, verbose: u8) -> (bool, LevelFilter) {
    let is_verbose = !quiet && verbose > 0;

    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    // The library logs through the log crate
    tracing_log::LogTracer::init().expect("Failed to set log tracer");

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("CUCKOO_LOG")
        .from_env_lossy()
        .add_directive(
            "rustyline=warn"
                .parse()
                .expect("Failed to parse rustyline directive"),
        );

    let subscriber = Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact(),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        die!("INTERNAL ERROR: setting default tracing::subscriber failed");
    }

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing_panic::panic_hook(info);
        prev_hook(info);
    }));

    (is_verbose, level_filter)
}

fn parse_bucket_size(s: &str) -> Result<u8, String> {
    let n = s.parse::<u8>().map_err(|e| e.to_string())?;

    if (1..=MAX_BUCKET_SIZE).contains(&n) {
        Ok(n)
    } else {
        Err(format!("must be between 1 and {MAX_BUCKET_SIZE}"))
    }
}

fn parse_max_depth(s: &str) -> Result<u8, String> {
    let n = s.parse::<u8>().map_err(|e| e.to_string())?;

    if n <= MAX_DEPTH {
        Ok(n)
    } else {
        Err(format!("must be at most {MAX_DEPTH}"))
    }
}

/// CLI tool for experimenting with cuckoo tables
#[derive(Parser, Debug)]
#[command(name = "cuckoo")]
#[command(about = "CLI tool for experimenting with cuckoo tables")]
struct ToolArgs {
    /// Suppress all output except for errors. This overrides the -v flag.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Turn on verbose output. Supply -v multiple times to increase verbosity.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Each table holds 2^POWER buckets
    #[arg(short, long, default_value_t = 10, value_name = "POWER")]
    power: u8,

    /// Slots per bucket
    #[arg(short, long, default_value_t = 4, value_parser = parse_bucket_size)]
    bucket_size: u8,

    /// Maximum number of items relocated by a single insert
    #[arg(short = 'd', long, default_value_t = 4, value_parser = parse_max_depth)]
    max_depth: u8,

    /// Reject inserts of keys that are already present
    #[arg(short, long, default_value_t = false)]
    lookup_on_insert: bool,

    /// Print every relocation
    #[arg(short, long, default_value_t = false)]
    trace_moves: bool,

    /// Command to run (if omitted, starts interactive shell)
    #[command(subcommand)]
    command: Option<ToolCommand>,
}

#[derive(Subcommand, Debug, Clone)]
enum ToolCommand {
    /// Get the value for a key
    Get {
        /// The key to look up
        key: String,
    },
    /// Show the slot a key is stored in
    Where {
        /// The key to look up
        key: String,
    },
    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,
        /// The value to store
        value: u64,
    },
    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },
    /// List all items in table order
    #[command(visible_alias = "list", visible_alias = "ls")]
    Scan {
        /// Optional prefix to filter keys
        prefix: Option<String>,

        /// Show the slot of each item
        #[arg(short = 'l', long = "long")]
        long: bool,
    },
    /// Count the number of items
    Count,
    /// Remove all items
    Flush,
    /// Show table geometry and fill level
    Info,
    /// Show operation statistics
    Stats,
    /// Show the occupancy of every bucket
    Dump,
    /// Show the table configuration
    Config,
}

// Internal shell commands, include all external tool commands
#[derive(Parser, Debug)]
#[command(name = "")]
#[command(no_binary_name = true)]
#[command(disable_version_flag = true)]
#[command(help_template = "
{version}

Available Commands:

{subcommands}

Use `help COMMAND` or `COMMAND --help` for more details.

")]
struct ShellArgs {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum ShellCommand {
    #[command(flatten)]
    ToolCmd(ToolCommand),

    /// Exit the current shell
    #[command(visible_alias = "quit")]
    Exit,
}

struct Session {
    table: SharedCuckooTable,
}

impl Session {
    fn open(args: &ToolArgs) -> cuckoo_table::Result<Self> {
        let config = Config::new(args.power)
            .bucket_size(args.bucket_size)
            .max_depth(args.max_depth)
            .lookup_on_insert(args.lookup_on_insert);

        let config = if args.trace_moves {
            config.event_listener(|action: &Action| {
                if let Action::Moved { .. } = action {
                    println!("{action}");
                }
            })
        } else {
            config
        };

        Ok(Self {
            table: config.build_shared()?,
        })
    }
}

fn print_info(session: &Session) {
    let table = session.table.lock();

    let len = table.len();
    let capacity = table.capacity();
    let slot_bytes = capacity * std::mem::size_of::<Option<Item>>();

    println!("Table power: {}", table.table_power());
    println!("Buckets per table: {}", 1_usize << table.table_power());
    println!("Bucket size: {}", table.bucket_size());
    println!("Capacity: {capacity}");
    println!("Items: {len}");

    #[allow(clippy::cast_precision_loss)]
    let fill = len as f64 / capacity as f64;
    println!("Load factor: {:.1}%", fill * 100.0);

    println!("Slot memory: {}", SizeFormatter::new(slot_bytes, BINARY));
}

fn handle_get(session: &Session, key: &str) {
    match session.table.lookup(key) {
        Ok(Some(value)) => println!("{value}"),
        Ok(None) => println!("(not found)"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn handle_where(session: &Session, key: &str) {
    match session.table.lookup_verbose(key) {
        Ok(Some((_, location))) => println!("{location}"),
        Ok(None) => println!("(not found)"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn handle_set(session: &Session, key: &str, value: u64) {
    match session.table.insert(Item::new(key, value)) {
        Ok(()) => println!("OK (set)"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn handle_del(session: &Session, key: &str) {
    match session.table.remove(key) {
        Ok(value) => println!("OK (removed {value})"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn handle_scan(session: &Session, prefix: Option<&str>, long: bool) {
    let table = session.table.lock();

    let mut count = 0;

    for (location, item) in table.iter() {
        let key = String::from_utf8_lossy(item.key_bytes());

        if let Some(p) = prefix {
            if !key.starts_with(p) {
                continue;
            }
        }

        if long {
            println!("{key} = {} [{location}]", item.value());
        } else {
            println!("{key} = {}", item.value());
        }

        count += 1;
    }

    println!("OK ({count} items)");
}

fn handle_flush(session: &Session) {
    session.table.flush();
    println!("OK (flushed)");
}

fn print_text(text: cuckoo_table::Result<String>) {
    match text {
        Ok(text) => print!("{text}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

/// Result of executing a command
enum CommandResult {
    Continue,
    Exit,
}

/// Execute a parsed command
fn execute_command(session: &Session, cmd: ToolCommand) -> CommandResult {
    match cmd {
        ToolCommand::Get { key } => handle_get(session, &key),
        ToolCommand::Where { key } => handle_where(session, &key),
        ToolCommand::Set { key, value } => handle_set(session, &key, value),
        ToolCommand::Del { key } => handle_del(session, &key),
        ToolCommand::Scan { prefix, long } => handle_scan(session, prefix.as_deref(), long),
        ToolCommand::Count => println!("{}", session.table.len()),
        ToolCommand::Flush => handle_flush(session),
        ToolCommand::Info => print_info(session),
        ToolCommand::Stats => print_text(session.table.stats_dump()),
        ToolCommand::Dump => print_text(session.table.table_dump()),
        ToolCommand::Config => print_text(session.table.config_dump()),
    }
    CommandResult::Continue
}

fn execute_shell_command(session: &Session, cmd: ShellCommand) -> CommandResult {
    match cmd {
        ShellCommand::ToolCmd(tool_cmd) => execute_command(session, tool_cmd),
        ShellCommand::Exit => CommandResult::Exit,
    }
}

/// Parse and run a shell command line
fn run_shell_command(session: &Session, line: &str) -> CommandResult {
    let line = line.trim();
    if line.is_empty() {
        return CommandResult::Continue;
    }

    let tokens = match shlex::split(line) {
        Some(t) if !t.is_empty() => t,
        Some(_) => return CommandResult::Continue,
        None => {
            eprintln!("error: unclosed quote");
            return CommandResult::Continue;
        }
    };

    match ShellArgs::try_parse_from(&tokens) {
        Ok(args) => execute_shell_command(session, args.command),
        Err(e) => {
            eprintln!("{e}");
            CommandResult::Continue
        }
    }
}

fn run_shell(session: &Session) {
    if io::stdin().is_terminal() {
        run_shell_interactive(session);
    } else {
        run_shell_non_interactive(session);
    }
}

fn run_shell_interactive(session: &Session) {
    println!("Welcome to the cuckoo table shell");
    println!("Type 'help' for available commands, 'exit' to quit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Error initializing line editor: {e}");
            return;
        }
    };

    loop {
        match rl.readline("cuckoo> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {}
            Err(rustyline::error::ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        }
    }
}

fn run_shell_non_interactive(session: &Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if stdout.flush().is_err() {
            die!("can't flush stdout");
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(e) => {
                die!("Error reading input: {}", e);
            }
        }
    }
}

fn main() {
    let args = ToolArgs::parse();
    let (verbose, level_filter) = init_tracing(args.quiet, args.verbose);

    let cmd = ToolArgs::command();

    info!(
        "starting {} ({} {}), log level: {level_filter}",
        cmd.get_name(),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let session = match Session::open(&args) {
        Ok(s) => s,
        Err(e) => {
            let note = if verbose {
                ""
            } else {
                ". Note: Use -v (one or multiple times) for more information"
            };
            die!("Error creating table: {}{}", e, note);
        }
    };

    match args.command {
        Some(cmd) => {
            execute_command(&session, cmd);
        }
        None => run_shell(&session),
    }
}
