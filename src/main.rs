use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use dep_patcher::{
    builtin_specs, load_specs, run_patches, Outcome, PatchSpec, PathResolver, RunMode, RunReport,
};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the project root when no argument is given.
const ROOT_ENV: &str = "DEP_PATCHER_ROOT";

#[derive(Parser)]
#[command(name = "dep-patcher")]
#[command(
    about = "Apply guarded, idempotent fixes to files inside installed dependencies",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Project root (defaults to $DEP_PATCHER_ROOT, then the directory above this executable's)
    project_root: Option<PathBuf>,

    /// Patch file, or directory of *.toml patch files; replaces the built-in catalog
    #[arg(short, long = "patches", value_name = "PATH")]
    patches: Vec<PathBuf>,

    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long, conflicts_with = "verify")]
    dry_run: bool,

    /// Fail unless every patch is already applied; never modifies files
    #[arg(long)]
    verify: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// List the loaded patches and exit
    #[arg(long)]
    list: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let specs = load_catalog(&cli.patches)?;

    if cli.list {
        cmd_list(&specs);
        return Ok(());
    }

    let mode = if cli.verify {
        RunMode::Verify
    } else if cli.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Apply
    };

    let root = resolve_project_root(cli.project_root)?;
    let resolver = PathResolver::new(&root)
        .with_context(|| format!("invalid project root {}", root.display()))?;

    let report = run_patches(&resolver, &specs, mode);

    match cli.format {
        Format::Json => println!("{}", report.to_json()?),
        Format::Text => print_report(resolver.project_root(), &report, cli.diff),
    }

    if !report.success() {
        std::process::exit(1);
    }

    Ok(())
}

/// Patch files given on the command line, or the built-in catalog.
fn load_catalog(paths: &[PathBuf]) -> Result<Vec<PatchSpec>> {
    if paths.is_empty() {
        return builtin_specs().context("built-in patch catalog is invalid");
    }
    Ok(load_specs(paths)?)
}

/// Resolve the project root
///
/// Priority order:
/// 1. Positional argument
/// 2. DEP_PATCHER_ROOT environment variable
/// 3. One directory above the directory holding this executable
fn resolve_project_root(cli_root: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_root {
        return path
            .canonicalize()
            .with_context(|| format!("project root {} does not exist", path.display()));
    }

    if let Ok(env_path) = env::var(ROOT_ENV) {
        let path = PathBuf::from(&env_path);
        if path.is_dir() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: {} is set but is not a directory: {}",
                ROOT_ENV, env_path
            )
            .yellow()
        );
    }

    let exe = env::current_exe().context("cannot locate the running executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .with_context(|| {
            format!(
                "cannot derive a project root from {}; pass it as an argument",
                exe.display()
            )
        })
}

fn print_report(root: &Path, report: &RunReport, show_diff: bool) {
    println!("Project root: {}", root.display());
    match report.mode {
        RunMode::DryRun => println!("{}", "[DRY RUN - no files will be modified]".cyan()),
        RunMode::Verify => println!("{}", "[VERIFY - checking patches are applied]".cyan()),
        RunMode::Apply => {}
    }
    println!();

    for entry in &report.entries {
        match &entry.outcome {
            Outcome::Applied { .. } => {
                let verb = if report.mode == RunMode::DryRun {
                    "would apply"
                } else {
                    "applied"
                };
                println!(
                    "{} {}: {} to {} ({})",
                    "✓".green(),
                    entry.id,
                    verb,
                    entry.target,
                    entry.outcome
                );
                if show_diff {
                    if let Some(change) = &entry.change {
                        display_diff(&entry.target.relative(), &change.before, change.after());
                    }
                }
            }
            Outcome::AlreadyApplied => {
                println!(
                    "{} {}: already applied to {}",
                    "⊙".yellow(),
                    entry.id,
                    entry.target
                );
            }
            Outcome::Failed(err) => {
                eprintln!("{} {}: Failed - {}", "✗".red(), entry.id, err);
                eprintln!("  Target: {}", entry.target);
                if let dep_patcher::PatchError::Drifted { .. } = err {
                    eprintln!("  Possible causes:");
                    eprintln!("    - The dependency was upgraded and the code changed");
                    eprintln!("    - The fix was released upstream in a different form");
                    eprintln!("    - The file was edited by hand");
                }
            }
        }
    }

    let applied_label = if report.mode == RunMode::DryRun {
        "would apply"
    } else {
        "applied"
    };
    println!();
    println!(
        "{} {} {}, {} already applied, {} failed",
        "Summary:".bold(),
        format!("{}", report.applied()).green(),
        applied_label,
        format!("{}", report.already_applied()).yellow(),
        format!("{}", report.failed()).red()
    );
}

/// Show unified diff between original and patched content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    // dependency bundles are large; show three lines of context per hunk
    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            println!("{}", "...".dimmed());
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let line = match change.tag() {
                    ChangeTag::Delete => format!("-{}", change).red(),
                    ChangeTag::Insert => format!("+{}", change).green(),
                    ChangeTag::Equal => format!(" {}", change).normal(),
                };
                print!("{}", line);
                if change.missing_newline() {
                    println!();
                }
            }
        }
    }
    println!();
}

fn cmd_list(specs: &[PatchSpec]) {
    println!("{} ({} patches)", "Patch catalog".bold(), specs.len());
    for spec in specs {
        println!(
            "  - {} -> {} ({} edit(s))",
            spec.id.bold(),
            spec.target,
            spec.edits.len()
        );
        if let Some(description) = &spec.description {
            println!("      {}", description.dimmed());
        }
    }
}
