//! Command-line interface for the statute reader.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use console::style;
use serde::Serialize;

use crate::config::{validate_date, DEFAULT_LAW_ID, DEFAULT_LAW_NAME};
use crate::error::{Result, StatuteError};
use crate::markup::extract_from_xhtml;
use crate::model::Law;
use crate::reconcile::reconcile;
use crate::temporal::{apply_effective_date, build_schedule, validate_markers};
use crate::text::extract_from_reader;

/// Statute reader - Extract statutes from markup and plain text.
#[derive(Parser)]
#[command(name = "statute-reader")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// One statute rendering plus the identity to give it.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// XHTML rendering of the statute
    #[arg(long, conflicts_with = "text", required_unless_present = "text")]
    pub html: Option<PathBuf>,

    /// Plain-text rendering of the statute
    #[arg(long, required_unless_present = "html")]
    pub text: Option<PathBuf>,

    /// Law name stored on the extracted tree
    #[arg(long)]
    pub name: Option<String>,

    /// Law identifier stored on the extracted tree (e.g., 2010:110)
    #[arg(long)]
    pub id: Option<String>,
}

impl SourceArgs {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_LAW_NAME)
    }

    fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(DEFAULT_LAW_ID)
    }

    fn load(&self) -> Result<Law> {
        match (&self.html, &self.text) {
            (Some(path), _) => load_markup(path, self.name(), self.id()),
            (None, Some(path)) => load_text(path, self.name(), self.id()),
            (None, None) => Err(StatuteError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "either --html or --text is required",
            ))),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the statute tree, optionally resolved for one date.
    Extract {
        #[command(flatten)]
        source: SourceArgs,

        /// Keep only the paragraph variants in force on this date (YYYY-MM-DD)
        #[arg(short, long)]
        effective_date: Option<String>,

        /// Write the tree as YAML to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report invalid, unresolved and inline markers.
    Validate {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the report as YAML to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List dated transitions relative to a reference date.
    Schedule {
        #[command(flatten)]
        source: SourceArgs,

        /// Reference date in YYYY-MM-DD format (default: today)
        #[arg(short, long)]
        date: Option<String>,

        /// Write the report as YAML to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare the markup and plain-text renderings of one statute.
    Reconcile {
        /// XHTML rendering of the statute
        #[arg(long)]
        html: PathBuf,

        /// Plain-text rendering of the statute
        #[arg(long)]
        text: PathBuf,

        /// File with finding keys to ignore, one per line
        #[arg(long)]
        allow_list: Option<PathBuf>,

        /// Law name stored on both trees
        #[arg(long)]
        name: Option<String>,

        /// Law identifier stored on both trees
        #[arg(long)]
        id: Option<String>,

        /// Write the report as YAML to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    execute(cli.command)
}

/// Execute one parsed command.
pub fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Extract {
            source,
            effective_date,
            output,
        } => extract_command(&source, effective_date.as_deref(), output.as_deref()),
        Commands::Validate { source, output } => validate_command(&source, output.as_deref()),
        Commands::Schedule {
            source,
            date,
            output,
        } => schedule_command(&source, date.as_deref(), output.as_deref()),
        Commands::Reconcile {
            html,
            text,
            allow_list,
            name,
            id,
            output,
        } => {
            let name = name.as_deref().unwrap_or(DEFAULT_LAW_NAME);
            let id = id.as_deref().unwrap_or(DEFAULT_LAW_ID);
            reconcile_command(&html, &text, allow_list.as_deref(), name, id, output.as_deref())
        }
    }
}

fn load_markup(path: &Path, name: &str, id: &str) -> Result<Law> {
    let input = fs::read_to_string(path)?;
    extract_from_xhtml(&input, name, id)
}

fn load_text(path: &Path, name: &str, id: &str) -> Result<Law> {
    let reader = BufReader::new(File::open(path)?);
    extract_from_reader(reader, name, id)
}

fn extract_command(
    source: &SourceArgs,
    effective_date: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let date = effective_date.map(validate_date).transpose()?;
    let mut law = source.load()?;

    println!("  Law: {}", style(&law.name).green());
    println!("  Chapters: {}", law.chapters().count());
    println!("  Paragraphs: {}", law.paragraph_count());

    if let Some(date) = date {
        let report = apply_effective_date(&mut law, date);
        println!(
            "  Variants in force on {}: {} kept, {} dropped",
            style(date).green(),
            report.selected_variants,
            report.dropped_variants
        );
        if report.ambiguous_groups > 0 {
            println!(
                "  Ambiguous paragraphs: {}",
                style(report.ambiguous_groups).yellow().bold()
            );
        }
    }

    law.materialize_synthetic_chapters();
    save_report(&law, output)
}

fn validate_command(source: &SourceArgs, output: Option<&Path>) -> Result<()> {
    let law = source.load()?;
    let report = validate_markers(&law);

    let verdict = if report.is_clean() {
        style("clean").green().bold()
    } else {
        style("findings").yellow().bold()
    };
    println!("  Markers: {verdict}");
    println!("  Invalid: {}", report.invalid_count);
    println!("  Unresolved: {}", report.unresolved_count);
    println!("  Inline in text: {}", report.inline_in_text_count);

    save_report(&report, output)
}

fn schedule_command(source: &SourceArgs, date: Option<&str>, output: Option<&Path>) -> Result<()> {
    let reference_date = match date {
        Some(date) => validate_date(date)?,
        None => chrono::Local::now().date_naive(),
    };
    let law = source.load()?;
    let report = build_schedule(&law, reference_date);

    println!("  Reference date: {}", style(reference_date).green());
    println!(
        "  Dated transitions: {} ({} upcoming)",
        report.total_dated_transitions, report.upcoming_transitions
    );
    match report.next_transition_date {
        Some(next) => println!("  Next transition: {}", style(next).cyan()),
        None => println!("  Next transition: {}", style("none").dim()),
    }

    save_report(&report, output)
}

fn reconcile_command(
    html: &Path,
    text: &Path,
    allow_list: Option<&Path>,
    name: &str,
    id: &str,
    output: Option<&Path>,
) -> Result<()> {
    let markup_law = load_markup(html, name, id)?;
    let text_law = load_text(text, name, id)?;

    let mut result = reconcile(&markup_law, &text_law);
    if let Some(path) = allow_list {
        let allowed = read_allow_list(path)?;
        let before = result.finding_count;
        result = result.without_allowed(&allowed);
        tracing::info!(
            allowed = before - result.finding_count,
            remaining = result.finding_count,
            "Applied allow-list"
        );
    }

    print!("{}", result.as_text());
    save_report(&result, output)
}

/// Finding keys from an allow-list file. Blank lines and `#` comments are
/// ignored.
fn read_allow_list(path: &Path) -> Result<HashSet<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

fn save_report<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let Some(path) = output else {
        return Ok(());
    };
    write_yaml(value, path)?;
    println!();
    println!("{} {}", style("Saved to:").green().bold(), path.display());
    Ok(())
}

/// Write `value` as YAML, through a temp file renamed into place.
fn write_yaml<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = serde_yaml_ng::to_string(value)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.yaml".to_string());
    let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

    {
        let mut file = File::create(&temp_file)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    // On Windows, rename fails if the destination already exists
    #[cfg(target_os = "windows")]
    if path.exists() {
        fs::remove_file(path)?;
    }

    fs::rename(&temp_file, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_cli_parse_extract_html() {
        let cli = Cli::parse_from([
            "statute-reader",
            "extract",
            "--html",
            "law.xhtml",
            "--effective-date",
            "2025-01-01",
        ]);

        let Commands::Extract {
            source,
            effective_date,
            output,
        } = cli.command
        else {
            unreachable!("expected extract");
        };
        assert_eq!(source.html, Some(PathBuf::from("law.xhtml")));
        assert!(source.text.is_none());
        assert_eq!(effective_date, Some("2025-01-01".to_string()));
        assert!(output.is_none());
    }

    #[test]
    fn test_cli_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["statute-reader", "validate"]).is_err());
        assert!(Cli::try_parse_from([
            "statute-reader",
            "validate",
            "--html",
            "a.xhtml",
            "--text",
            "a.txt"
        ])
        .is_err());
    }

    #[test]
    fn test_cli_parse_schedule_with_date() {
        let cli = Cli::parse_from([
            "statute-reader",
            "schedule",
            "--text",
            "law.txt",
            "-d",
            "2028-07-01",
        ]);

        let Commands::Schedule { source, date, .. } = cli.command else {
            unreachable!("expected schedule");
        };
        assert_eq!(source.text, Some(PathBuf::from("law.txt")));
        assert_eq!(date, Some("2028-07-01".to_string()));
    }

    #[test]
    fn test_cli_parse_reconcile() {
        let cli = Cli::parse_from([
            "statute-reader",
            "reconcile",
            "--html",
            "law.xhtml",
            "--text",
            "law.txt",
            "--allow-list",
            "allowed.txt",
        ]);

        let Commands::Reconcile {
            html,
            text,
            allow_list,
            ..
        } = cli.command
        else {
            unreachable!("expected reconcile");
        };
        assert_eq!(html, PathBuf::from("law.xhtml"));
        assert_eq!(text, PathBuf::from("law.txt"));
        assert_eq!(allow_list, Some(PathBuf::from("allowed.txt")));
    }

    #[test]
    fn test_read_allow_list_skips_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("allowed.txt");
        fs::write(
            &path,
            "# known differences\n\nparagraph_text_format_only:K1 P2#V1\n  chapter_missing_text:K3  \n",
        )
        .unwrap();

        let allowed = read_allow_list(&path).unwrap();
        assert_eq!(allowed.len(), 2);
        assert!(allowed.contains("paragraph_text_format_only:K1 P2#V1"));
        assert!(allowed.contains("chapter_missing_text:K3"));
    }

    #[test]
    fn test_write_yaml_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("law.yaml");
        fs::write(&path, "old").unwrap();

        let law = Law::new("Testlag", "2024:1");
        write_yaml(&law, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("name: Testlag"));
        assert!(!dir.path().join(".law.yaml.tmp").exists());
    }

    #[test]
    fn test_extract_rejects_bad_date() {
        let source = SourceArgs {
            html: None,
            text: Some(PathBuf::from("does-not-matter.txt")),
            name: None,
            id: None,
        };
        let err = extract_command(&source, Some("2025-13-01"), None).unwrap_err();
        assert!(matches!(err, StatuteError::InvalidDate(_)));
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempdir().unwrap();
        let source = SourceArgs {
            html: None,
            text: Some(dir.path().join("missing.txt")),
            name: None,
            id: None,
        };
        assert!(matches!(source.load(), Err(StatuteError::Io(_))));
    }
}
