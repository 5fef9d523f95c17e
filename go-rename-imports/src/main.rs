use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{ArgAction, ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, Level};

use go_rename_imports::{
    commit, file_diff, format_import_line, list_file_imports, modify_file, parse_ordered,
    resolve_inputs, DiffStats, ImportCommand, Pattern, PatternKind,
};

#[derive(Parser)]
#[command(name = "go-rename-imports")]
#[command(about = "Rename, add, delete and list import paths in Go source files")]
#[command(long_about = "Rewrites the import declarations of Go source files.

Only the import specs that change are touched: comments, blank lines and the
rest of the file keep their exact bytes. Nothing is written unless -w is given.

COMMON USE CASES:
  Move a package and fix every importer:
    go-rename-imports rename -w -e example.com/old/pkg|example.com/new/pkg ./...

  Move a whole tree, most specific prefix first:
    go-rename-imports rename -w -p internal/syscall/|export/syscall/ -p internal/|special/ src

  Drop a dependency:
    go-rename-imports delete -w -e github.com/pkg/errors .")]
#[command(after_help = "Directories are walked recursively for *.go files, skipping *_test.go and
testdata/ directories. Plain files are used as given.")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); logs go to stderr
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MutateArgs {
    /// Modify files in place (default is a dry run)
    #[arg(short = 'w', long = "write")]
    write: bool,

    /// Print a unified diff of every file that changes
    #[arg(long)]
    diff: bool,

    /// Go files or directories to process
    #[arg(required = true, value_name = "FILE/DIR")]
    paths: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename import paths, exactly (-e) or by prefix (-p)
    #[command(alias = "rename-imports")]
    #[command(after_help = "EXAMPLES:
    go-rename-imports rename -e old/path|new/path main.go
    go-rename-imports rename -w -p internal/|special/ src

Patterns apply in the order given. Once an import has been renamed by one
pattern, later patterns in the same run leave it alone.")]
    Rename {
        /// Exact rename OLD|NEW (repeatable)
        #[arg(short = 'e', long = "exact", value_name = "OLD|NEW", required_unless_present = "prefix")]
        exact: Vec<String>,

        /// Prefix rename OLD_PREFIX|NEW_PREFIX (repeatable)
        #[arg(short = 'p', long = "prefix", value_name = "OLD|NEW")]
        prefix: Vec<String>,

        #[command(flatten)]
        args: MutateArgs,
    },

    /// Prefix rename with every -e pattern taken as a prefix
    #[command(hide = true)]
    RenamePrefixImports {
        /// Prefix rename OLD_PREFIX|NEW_PREFIX (repeatable)
        #[arg(short = 'e', long = "prefix", value_name = "OLD|NEW", required = true)]
        prefix: Vec<String>,

        #[command(flatten)]
        args: MutateArgs,
    },

    /// Add imports
    #[command(alias = "add-imports")]
    Add {
        /// Import path to add (repeatable)
        #[arg(short = 'e', long = "import", value_name = "PKG", required = true)]
        imports: Vec<String>,

        #[command(flatten)]
        args: MutateArgs,
    },

    /// Delete imports (aliased imports are kept)
    #[command(alias = "delete-imports")]
    Delete {
        /// Import path to delete (repeatable)
        #[arg(short = 'e', long = "import", value_name = "PKG", required = true)]
        imports: Vec<String>,

        #[command(flatten)]
        args: MutateArgs,
    },

    /// Print the Go files the inputs resolve to, one per line
    FindGoFiles {
        /// Go files or directories
        #[arg(required = true, value_name = "FILE/DIR")]
        paths: Vec<PathBuf>,
    },

    /// Print every import path, one per line
    ListImports {
        /// Follow each import with the file it came from
        #[arg(long)]
        show_path: bool,

        /// Go files or directories
        #[arg(required = true, value_name = "FILE/DIR")]
        paths: Vec<PathBuf>,
    },
}

/// Accept the Go-style single-dash spelling of long flags.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            if arg == "-show-path" {
                OsString::from("--show-path")
            } else {
                arg
            }
        })
        .collect()
}

/// Help and version exit 0; every other argument error prints usage and exits 1.
fn exit_on_usage_error(err: clap::Error) -> ! {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => {
            let _ = err.print();
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Pair the values of a repeatable argument with their command-line positions,
/// so `-e` and `-p` patterns can be merged back into the order they were given.
fn tagged<'a>(
    values: &'a [String],
    matches: &ArgMatches,
    id: &str,
    kind: PatternKind,
) -> Vec<(usize, PatternKind, &'a str)> {
    matches
        .indices_of(id)
        .into_iter()
        .flatten()
        .zip(values)
        .map(|(index, value)| (index, kind, value.as_str()))
        .collect()
}

fn main() -> Result<()> {
    let matches = Cli::command()
        .try_get_matches_from(normalize_args(std::env::args_os()))
        .unwrap_or_else(|err| exit_on_usage_error(err));
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| exit_on_usage_error(err));

    init_logging(cli.verbose);

    let (_, sub) = matches.subcommand().context("missing command")?;

    match cli.command {
        Commands::FindGoFiles { paths } => {
            let mut out = io::stdout().lock();
            for file in resolve_inputs(&paths)? {
                writeln!(out, "{}", file.display())?;
            }
        }

        Commands::ListImports { show_path, paths } => {
            let mut out = io::stdout().lock();
            for file in resolve_inputs(&paths)? {
                for import in list_file_imports(&file)? {
                    writeln!(out, "{}", format_import_line(&import, &file, show_path))?;
                }
            }
        }

        Commands::Rename { exact, prefix, args } => {
            let tagged_patterns = tagged(&exact, sub, "exact", PatternKind::Exact)
                .into_iter()
                .chain(tagged(&prefix, sub, "prefix", PatternKind::Prefix));
            let patterns = parse_ordered(tagged_patterns, ImportCommand::Rename)?;
            run_mutation(ImportCommand::Rename, &patterns, &args)?;
        }

        Commands::RenamePrefixImports { prefix, args } => {
            let patterns = parse_ordered(tagged(&prefix, sub, "prefix", PatternKind::Prefix), ImportCommand::Rename)?;
            run_mutation(ImportCommand::Rename, &patterns, &args)?;
        }

        Commands::Add { imports, args } => {
            let patterns = parse_ordered(tagged(&imports, sub, "imports", PatternKind::Exact), ImportCommand::Add)?;
            run_mutation(ImportCommand::Add, &patterns, &args)?;
        }

        Commands::Delete { imports, args } => {
            let patterns = parse_ordered(tagged(&imports, sub, "imports", PatternKind::Exact), ImportCommand::Delete)?;
            run_mutation(ImportCommand::Delete, &patterns, &args)?;
        }
    }

    Ok(())
}

fn run_mutation(command: ImportCommand, patterns: &[Pattern], args: &MutateArgs) -> Result<()> {
    let files = resolve_inputs(&args.paths)?;
    let mut stats = DiffStats::default();
    let mut modified = 0usize;
    let mut written = 0usize;

    for path in &files {
        let target = modify_file(path, command, patterns)?;

        if target.modified {
            modified += 1;
        }
        if args.diff {
            if let Some(diff) = file_diff(&target.path, &target.original, &target.rendered) {
                io::stdout().write_all(diff.unified.as_bytes())?;
                stats.record(&diff);
            }
        }
        if commit(&target, args.write)? {
            written += 1;
        }
    }

    info!(
        command = %command,
        files = files.len(),
        modified,
        written,
        diffed = stats.files,
        lines_added = stats.lines_added,
        lines_removed = stats.lines_removed,
        "done"
    );

    if !args.write && modified > 0 {
        info!("dry run: use -w to write {} modified file(s)", modified);
    }

    Ok(())
}
