use std::fs;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{Parser, Subcommand};
use newsdigest_md::{
    distinct_titles, emit_output, extract_issue_date, group_by_category, prepare_working_text, write_atomic,
    ArticleParser, CategoryValidator, Config, Corrections, IssueDate, Normalizer, ParseOutcome, Selection,
};
use tracing::info;

const EXIT_INPUT: i32 = 1;
const EXIT_CATEGORIES: i32 = 2;
const EXIT_CONFIG: i32 = 3;
const EXIT_EMPTY_SELECTION: i32 = 4;
const EXIT_WRITE: i32 = 6;

#[derive(Parser)]
#[command(author, version, about = "Pick articles from a news digest and emit them as a normalized Markdown file")]
struct Cli {
    /// YAML config file (vocabulary, threshold, markers, output dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the working text for an uploaded source file
    Prepare { source: PathBuf, working: PathBuf },
    /// Parse a working file and print grouped records as JSON
    List { working: PathBuf },
    /// Emit the selected articles and remove them from the working file
    Extract {
        working: PathBuf,
        /// Article title to select (repeatable)
        #[arg(long = "select")]
        titles: Vec<String>,
        /// Block position to select (repeatable)
        #[arg(long = "at")]
        positions: Vec<usize>,
        #[arg(long, default_value = "Kurznachrichten")]
        title: String,
        #[arg(long)]
        year: Option<u16>,
        #[arg(long)]
        month: Option<u8>,
    },
    /// Print the normalized form of a generated file
    Normalize {
        file: PathBuf,
        #[arg(long, default_value = "Kurznachrichten")]
        title: String,
        #[arg(long)]
        year: u16,
        #[arg(long)]
        month: u8,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn fail(tool: &str, error: impl ToString, code: i32) -> ! {
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": tool,
            "error": error.to_string(),
            "error_code": code
        })
    );
    exit(code);
}

fn read_text(tool: &str, path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| fail(tool, format!("{}: {}", path.display(), e), EXIT_INPUT))
}

fn load_config(path: Option<&Path>) -> Config {
    let cfg = match path {
        Some(p) => Config::load(p).unwrap_or_else(|e| fail("load_config", e, EXIT_CONFIG)),
        None => Config::default(),
    };
    cfg.with_env_overrides()
}

fn issue_date(year: Option<u16>, month: Option<u8>, fallback: IssueDate) -> IssueDate {
    let year = year.unwrap_or(fallback.year());
    let month = month.unwrap_or(fallback.month());
    IssueDate::new(year, month).unwrap_or_else(|e| fail("issue_date", e, EXIT_INPUT))
}

/// Parse the working text and apply category corrections.
fn parse_and_validate(cfg: &Config, parser: &ArticleParser, text: &str) -> (ParseOutcome, Corrections) {
    let mut outcome = parser.parse(text).unwrap_or_else(|e| fail("parse", e, EXIT_INPUT));
    for w in &outcome.warnings {
        eprintln!("{}", serde_json::json!({ "tool": "parse", "warning": w.to_string() }));
    }
    let corrections = CategoryValidator::new(cfg)
        .validate(&mut outcome.records)
        .unwrap_or_else(|e| fail("validate_categories", e, EXIT_CATEGORIES));
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": "validate_categories",
            "records": outcome.records.len(),
            "corrections": corrections.summary()
        })
    );
    (outcome, corrections)
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref());
    let parser = ArticleParser::new(&cfg);

    match cli.command {
        Command::Prepare { source, working } => {
            let src = read_text("prepare", &source);
            let date = extract_issue_date(&src).unwrap_or_default();
            let text = prepare_working_text(&src);
            write_atomic(&working, &text, true).unwrap_or_else(|e| fail("prepare", e, EXIT_WRITE));
            eprintln!(
                "{}",
                serde_json::json!({
                    "tool": "prepare",
                    "working": working,
                    "year": date.year(),
                    "month": date.month(),
                    "length": text.len()
                })
            );
        }
        Command::List { working } => {
            let text = read_text("list", &working);
            let (outcome, _) = parse_and_validate(&cfg, &parser, &text);
            let groups = group_by_category(&outcome.records, &cfg.uncategorized_label);
            let listing = serde_json::json!({
                "unique_titles": distinct_titles(&outcome.records),
                "groups": groups,
            });
            match serde_json::to_string_pretty(&listing) {
                Ok(s) => println!("{}", s),
                Err(e) => fail("list", e, EXIT_INPUT),
            }
        }
        Command::Extract { working, titles, positions, title, year, month } => {
            let text = read_text("extract", &working);
            let date = issue_date(year, month, IssueDate::default());
            let mut selection = Selection::by_titles(titles);
            selection.positions.extend(positions);
            if selection.is_empty() {
                fail("extract", "nothing to do: no articles selected", EXIT_EMPTY_SELECTION);
            }

            let (outcome, corrections) = parse_and_validate(&cfg, &parser, &text);
            let selected = selection.pick(&outcome.records);
            let rendered = parser
                .render_selection(&selected, &title, date)
                .unwrap_or_else(|e| fail("render_selection", e, EXIT_EMPTY_SELECTION));
            let normalized = Normalizer::new(&cfg).with_corrections(corrections).normalize(&rendered, &title, date);
            let paths = emit_output(&normalized, &title, &cfg.output_dir)
                .unwrap_or_else(|e| fail("emit_output", e, EXIT_WRITE));
            info!(path = %paths.md_path, articles = selected.len(), "output written");
            eprintln!(
                "{}",
                serde_json::json!({
                    "tool": "emit_output",
                    "md_path": paths.md_path,
                    "sha256": paths.sha256,
                    "articles": selected.len()
                })
            );

            let remaining = parser
                .remaining_after_removal(&text, &selection)
                .unwrap_or_else(|e| fail("remaining_after_removal", e, EXIT_INPUT));
            write_atomic(&working, &remaining, true).unwrap_or_else(|e| fail("update_working", e, EXIT_WRITE));
            eprintln!(
                "{}",
                serde_json::json!({
                    "tool": "update_working",
                    "working": working,
                    "length": remaining.len()
                })
            );
        }
        Command::Normalize { file, title, year, month } => {
            let text = read_text("normalize", &file);
            let date = issue_date(Some(year), Some(month), IssueDate::default());
            let normalizer =
                Normalizer::for_text(&cfg, &text).unwrap_or_else(|e| fail("validate_categories", e, EXIT_CATEGORIES));
            print!("{}", normalizer.normalize(&text, &title, date));
        }
    }
}
