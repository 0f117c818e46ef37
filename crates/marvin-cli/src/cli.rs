//! CLI definition and command dispatch for Marvin.
//!
//! This module defines the command-line interface using `clap` and provides
//! the `run()` function that dispatches commands to `marvin-core`.
//!
//! ## Configuration Precedence
//!
//! 1. CLI flags (e.g., `--project`, `--verbose`)
//! 2. Environment variables (`MARVIN_PROJECT`, `MARVIN_VERBOSE`, `MARVIN_COLOR`)
//! 3. Project config (`.marvin/config.yaml`)
//! 4. Built-in defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::ui::{table, ColorMode, MessageType, Style};

use marvin_core::{
    build_import_plan, execute_import_plan, format_plan_summary, ConflictStrategy, DocumentFilter,
    DocumentPatch, ImportOptions, MarvinError, Project, ProjectConfig, SourceStatus,
};

// ============================================================================
// CLI Definition
// ============================================================================

/// Version string including git commit hash
const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Marvin – typed project documents with safe imports
#[derive(Parser, Debug)]
#[command(name = "marvin")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, env = "MARVIN_VERBOSE")]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output mode: always, never, or auto
    #[arg(long, global = true, env = "MARVIN_COLOR", default_value = "auto")]
    pub color: String,

    /// Project directory (default: search upward from the current directory)
    #[arg(long, global = true, env = "MARVIN_PROJECT")]
    pub project: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a Marvin project in the current directory
    #[command(after_help = r#"EXAMPLES:
    marvin init
    marvin init --name "Platform rewrite"
"#)]
    Init {
        /// Project name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Show document counts and source processing status
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List documents
    #[command(after_help = r#"EXAMPLES:
    marvin list
    marvin list --type decision --status open
    marvin list --tag imported --json
"#)]
    List {
        /// Only documents of this type
        #[arg(long = "type", value_name = "TYPE")]
        doc_type: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        owner: Option<String>,

        /// Only documents carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show one document
    Show {
        /// Document identifier (e.g. D-001)
        id: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Create a document with the next free identifier
    #[command(after_help = r#"EXAMPLES:
    marvin new decision --title "Use REST for the public API"
    marvin new action --title "Write ADR" --owner alice --tag api --tag docs
"#)]
    New {
        /// Document type (decision, action, question, or a registered type)
        #[arg(value_name = "TYPE")]
        doc_type: String,

        #[arg(long)]
        title: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Update fields of an existing document
    Update {
        /// Document identifier
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Track reference files in `.marvin/sources/`
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },

    /// Import documents or reference files from another location
    #[command(after_help = r#"EXAMPLES:
    # Preview what would happen
    marvin import ../old-project --dry-run

    # Import, dropping documents whose ids already exist
    marvin import ./exported-docs --conflict skip

    # Import raw files into the intake directory
    marvin import ~/Downloads/specs --tag q3-review
"#)]
    Import {
        /// File or directory to import
        path: PathBuf,

        /// Conflict strategy: renumber, skip, or overwrite
        #[arg(long, default_value = "renumber")]
        conflict: String,

        /// Tag added to every imported document
        #[arg(long)]
        tag: Option<String>,

        /// Print the plan without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Optional frontmatter fields shared by `new` and `update`.
#[derive(clap::Args, Debug, Default)]
pub struct FieldArgs {
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub owner: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    /// Tag (repeatable). On update, replaces the tag list.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Document body
    #[arg(long)]
    pub content: Option<String>,
}

impl FieldArgs {
    fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.owner.is_none()
            && self.priority.is_none()
            && self.tags.is_empty()
            && self.content.is_none()
    }

    fn into_patch(self, title: Option<String>) -> (DocumentPatch, Option<String>) {
        let patch = DocumentPatch {
            title,
            status: self.status,
            owner: self.owner,
            priority: self.priority,
            tags: Some(self.tags).filter(|t| !t.is_empty()),
            ..Default::default()
        };
        (patch, self.content)
    }
}

#[derive(Subcommand, Debug)]
pub enum SourcesAction {
    /// Detect added, changed and removed reference files
    Scan {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List tracked reference files
    List {
        /// Only entries with this status (pending, processing, completed, error)
        #[arg(long)]
        status: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

// ============================================================================
// Entry point
// ============================================================================

/// Output settings shared by every handler.
struct Output {
    style: Style,
    quiet: bool,
}

impl Output {
    /// Print an informational line unless `--quiet`.
    fn say(&self, msg_type: MessageType, text: &str) {
        if !self.quiet {
            println!("{}", self.style.message(msg_type, text));
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Warnings always, debug output with --verbose.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = format!("marvin_core={},marvin_cli={}", log_level, log_level);

    tracing_subscriber::fmt()
        .with_env_filter(&filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let color_mode = cli.color.parse::<ColorMode>().unwrap_or_default();
    let out = Output {
        style: Style::new(color_mode),
        quiet: cli.quiet,
    };

    let start_dir = cli.project.clone().unwrap_or_else(|| PathBuf::from("."));

    match dispatch(&out, &start_dir, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", render_error(&out.style, &e));
            ExitCode::FAILURE
        }
    }
}

/// Run one command. Everything except `init` needs an existing project.
fn dispatch(out: &Output, start_dir: &Path, command: Command) -> Result<(), MarvinError> {
    let project = || -> Result<Project, MarvinError> {
        let project = Project::discover(start_dir)?;
        tracing::debug!(root = %project.root().display(), "Using project");
        Ok(project)
    };

    match command {
        Command::Init { name } => handle_init(out, start_dir, name),
        Command::Status { json } => handle_status(out, &project()?, json),
        Command::List {
            doc_type,
            status,
            owner,
            tag,
            json,
        } => {
            let filter = DocumentFilter {
                doc_type,
                status,
                owner,
                tag,
            };
            handle_list(out, &project()?, filter, json)
        }
        Command::Show { id, json } => handle_show(out, &project()?, &id, json),
        Command::New {
            doc_type,
            title,
            fields,
        } => handle_new(out, &project()?, &doc_type, title, fields),
        Command::Update { id, title, fields } => {
            handle_update(out, &project()?, &id, title, fields)
        }
        Command::Sources { action } => match action {
            SourcesAction::Scan { json } => handle_sources_scan(out, &project()?, json),
            SourcesAction::List { status, json } => {
                handle_sources_list(out, &project()?, status, json)
            }
        },
        Command::Import {
            path,
            conflict,
            tag,
            dry_run,
            json,
        } => handle_import(out, &project()?, &path, &conflict, tag, dry_run, json),
    }
}

/// Attach a hint to errors the user can act on.
fn render_error(style: &Style, error: &MarvinError) -> String {
    let hint = match error {
        MarvinError::ProjectNotFound(_) => Some("Run `marvin init` or pass --project <DIR>"),
        MarvinError::UnknownDocumentType(_) => {
            Some("Register the type under documentTypes in .marvin/config.yaml")
        }
        MarvinError::SourceNotFound(_) => Some("Run `marvin sources scan` first"),
        MarvinError::InvalidProjectConfig(_) | MarvinError::InvalidDocumentType { .. } => {
            Some("Check .marvin/config.yaml")
        }
        _ => None,
    };
    style.error_with_context(&error.to_string(), None, hint)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), MarvinError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command handlers
// ============================================================================

fn handle_init(out: &Output, root: &Path, name: Option<String>) -> Result<(), MarvinError> {
    let name = match name {
        Some(name) => name,
        None => root
            .canonicalize()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "marvin".to_string()),
    };

    let project = Project::init(root, ProjectConfig::default_for_init(name))?;
    out.say(
        MessageType::Ok,
        &format!(
            "Initialized Marvin project `{}` at {}",
            project.name(),
            project.root().display()
        ),
    );
    if !out.quiet {
        println!();
        println!("{}", out.style.message(MessageType::Hint, "Next steps:"));
        println!("  1. Record a decision: marvin new decision --title \"...\"");
        println!("  2. Bring in files:    marvin import <PATH> --dry-run");
    }
    Ok(())
}

fn handle_status(out: &Output, project: &Project, json: bool) -> Result<(), MarvinError> {
    let status = project.status()?;
    if json {
        return print_json(&status);
    }

    let style = &out.style;
    println!("{}", style.section("STATUS"));
    println!();
    println!("  {}", style.key_value("Project", &status.name));
    println!("  {}", style.key_value("Root", &status.root.display().to_string()));
    println!(
        "  {}",
        style.key_value("Documents", &status.total_documents().to_string())
    );
    let s = &status.sources;
    println!(
        "  {}",
        style.key_value(
            "Sources",
            &format!(
                "{} tracked (pending={} processing={} completed={} error={})",
                s.total(),
                s.pending,
                s.processing,
                s.completed,
                s.error
            )
        )
    );
    println!();
    println!("{}", style.section("DOCUMENTS"));
    println!();
    println!("{}", table::render_counts_table(&status.documents));
    Ok(())
}

fn handle_list(
    out: &Output,
    project: &Project,
    filter: DocumentFilter,
    json: bool,
) -> Result<(), MarvinError> {
    let store = project.open_store()?;
    if let Some(doc_type) = &filter.doc_type {
        store.registration(doc_type)?;
    }

    let docs = store.list(&filter)?;
    if json {
        return print_json(&docs);
    }

    if docs.is_empty() {
        out.say(MessageType::Info, "No documents found");
        return Ok(());
    }
    println!("{}", table::render_documents_table(&docs));
    Ok(())
}

fn handle_show(out: &Output, project: &Project, id: &str, json: bool) -> Result<(), MarvinError> {
    let store = project.open_store()?;
    let doc = store
        .get(id)?
        .ok_or_else(|| MarvinError::DocumentNotFound(id.to_string()))?;

    if json {
        return print_json(&doc);
    }

    let style = &out.style;
    let fm = &doc.frontmatter;
    println!("{} {}", style.doc_id(&fm.id), style.section(&fm.title));
    println!();
    println!("  {}", style.key_value("Type", &fm.doc_type));
    println!("  {}", style.key_value("Status", &style.status(&fm.status)));
    if let Some(owner) = &fm.owner {
        println!("  {}", style.key_value("Owner", owner));
    }
    if let Some(priority) = &fm.priority {
        println!("  {}", style.key_value("Priority", priority));
    }
    if !fm.tags.is_empty() {
        println!("  {}", style.key_value("Tags", &fm.tags.join(", ")));
    }
    if let Some(source) = &fm.source {
        println!("  {}", style.key_value("Source", source));
    }
    for (key, value) in &fm.extra {
        let rendered = serde_yaml::to_string(value)?;
        println!("  {}", style.key_value(key, rendered.trim_end()));
    }
    println!("  {}", style.key_value("Created", &fm.created));
    println!("  {}", style.key_value("Updated", &fm.updated));
    println!(
        "  {}",
        style.key_value("File", &style.file_path(&doc.file_path.display().to_string()))
    );

    if !doc.content.is_empty() {
        println!();
        println!("{}", doc.content);
    }
    Ok(())
}

fn handle_new(
    out: &Output,
    project: &Project,
    doc_type: &str,
    title: String,
    fields: FieldArgs,
) -> Result<(), MarvinError> {
    let mut store = project.open_store()?;
    let (patch, content) = fields.into_patch(Some(title));
    let doc = store.create(doc_type, patch, content.as_deref())?;

    out.say(
        MessageType::Ok,
        &format!("Created {}: {}", out.style.doc_id(doc.id()), doc.frontmatter.title),
    );
    if !out.quiet {
        println!(
            "{}",
            out.style
                .message_detail("File", &doc.file_path.display().to_string())
        );
    }
    Ok(())
}

fn handle_update(
    out: &Output,
    project: &Project,
    id: &str,
    title: Option<String>,
    fields: FieldArgs,
) -> Result<(), MarvinError> {
    if title.is_none() && fields.is_empty() {
        return Err(MarvinError::InvalidArgument(
            "Nothing to update. Pass at least one of --title, --status, --owner, --priority, --tag, --content".to_string(),
        ));
    }

    let mut store = project.open_store()?;
    let (patch, content) = fields.into_patch(title);
    let doc = store.update(id, patch, content.as_deref())?;

    out.say(
        MessageType::Ok,
        &format!("Updated {}: {}", out.style.doc_id(doc.id()), doc.frontmatter.title),
    );
    Ok(())
}

fn handle_sources_scan(out: &Output, project: &Project, json: bool) -> Result<(), MarvinError> {
    fs::create_dir_all(project.sources_dir())?;
    let mut manifest = project.open_manifest();
    let scan = manifest.scan()?;

    if json {
        return print_json(&scan);
    }

    if scan.is_empty() {
        out.say(MessageType::Info, "No changes in sources");
        return Ok(());
    }

    out.say(
        MessageType::Ok,
        &format!(
            "Scanned sources: {} added, {} changed, {} removed",
            scan.added.len(),
            scan.changed.len(),
            scan.removed.len()
        ),
    );
    if !out.quiet {
        for name in &scan.added {
            println!("{}", out.style.list_item("+", name));
        }
        for name in &scan.changed {
            println!("{}", out.style.list_item("~", name));
        }
        for name in &scan.removed {
            println!("{}", out.style.list_item("-", name));
        }
    }
    if !scan.removed.is_empty() {
        out.say(
            MessageType::Warn,
            &format!(
                "{} file(s) disappeared from sources and are no longer tracked",
                scan.removed.len()
            ),
        );
    }
    Ok(())
}

fn handle_sources_list(
    out: &Output,
    project: &Project,
    status: Option<String>,
    json: bool,
) -> Result<(), MarvinError> {
    let status = status.map(|s| s.parse::<SourceStatus>()).transpose()?;
    let manifest = project.open_manifest();
    let entries = manifest.list(status);

    if json {
        let map: std::collections::BTreeMap<_, _> = entries.into_iter().collect();
        return print_json(&map);
    }

    if entries.is_empty() {
        out.say(MessageType::Info, "No tracked sources");
        return Ok(());
    }
    println!("{}", table::render_sources_table(&entries));
    Ok(())
}

fn handle_import(
    out: &Output,
    project: &Project,
    path: &Path,
    conflict: &str,
    tag: Option<String>,
    dry_run: bool,
    json: bool,
) -> Result<(), MarvinError> {
    let mut options = ImportOptions::new(conflict.parse::<ConflictStrategy>()?);
    if let Some(tag) = tag {
        options = options.with_tag(tag);
    }

    let mut store = project.open_store()?;
    let plan = build_import_plan(path, &store, project.marvin_dir(), &options)?;

    if plan.is_empty() {
        if json {
            return print_json(&plan);
        }
        out.say(
            MessageType::Info,
            &format!("Nothing to import from {} ({})", path.display(), plan.classification),
        );
        return Ok(());
    }

    if dry_run {
        if json {
            return print_json(&plan);
        }
        print!("{}", format_plan_summary(&plan));
        println!();
        out.say(MessageType::Hint, "Dry run: no changes were made");
        return Ok(());
    }

    if !json && !out.quiet {
        print!("{}", format_plan_summary(&plan));
        println!();
    }

    let result = execute_import_plan(&plan, &mut store, project.marvin_dir(), &options)?;
    if json {
        return print_json(&result);
    }

    out.say(
        MessageType::Ok,
        &format!(
            "Imported {} document(s), copied {} file(s), skipped {}",
            result.imported, result.copied, result.skipped
        ),
    );
    if result.copied > 0 && !out.quiet {
        println!(
            "{}",
            out.style
                .message(MessageType::Hint, "Run `marvin sources scan` to track copied files")
        );
    }
    Ok(())
}
