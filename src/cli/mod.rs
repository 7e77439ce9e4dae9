//! Command-line interface for sieve.
//!
//! Provides commands for opening a review, inspecting items and their
//! highlighted sources, recording decisions, editing citations and queries,
//! and exporting or uploading the result.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

use crate::adapters::{AnthropicRewriter, LangSmithUploader};
use crate::citation::resolve_span_with_method;
use crate::config;
use crate::review::{
    filtered_indices, next_index, next_pending, prev_index, ItemSource, KnowledgeBase, LoadMode,
    OpenOutcome, ReviewError, ReviewFilters, ReviewItem, ReviewSession, StatusFilter,
};

pub mod cite;
pub mod render;

/// sieve - review generated queries and their citations
#[derive(Parser, Debug)]
#[command(name = "sieve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Knowledge-base directory of markdown documents
    #[arg(long, global = true, env = "SIEVE_KB", default_value = "kb")]
    pub kb: PathBuf,

    /// Generated output file (JSONL); the review file lives next to it
    #[arg(long, global = true, env = "SIEVE_OUTPUT", default_value = "output.jsonl")]
    pub output: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open a review for the output file
    Load {
        /// Continue the existing review
        #[arg(long, conflicts_with = "fresh")]
        resume: bool,

        /// Discard the existing review and start over
        #[arg(long)]
        fresh: bool,
    },

    /// Show review progress
    Status,

    /// List items matching the filters
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show an item with its highlighted source
    Show {
        /// Item index
        index: usize,

        /// Document to display (defaults to the first cited document)
        #[arg(long)]
        doc: Option<String>,

        /// Citation label to focus (1-based)
        #[arg(long)]
        citation: Option<usize>,
    },

    /// Resolve selected text to a span in a document
    Span {
        /// Document ID
        #[arg(long)]
        doc: String,

        /// Selected text
        text: String,
    },

    /// Accept an item
    Accept {
        index: usize,
    },

    /// Reject an item
    Reject {
        index: usize,
    },

    /// Return an item to pending
    Reset {
        index: usize,
    },

    /// Set reviewer notes on an item
    Note {
        index: usize,

        /// Notes text (replaces existing notes)
        text: String,
    },

    /// Add or remove citations
    Cite {
        #[command(subcommand)]
        command: cite::CiteCommands,
    },

    /// Replace an item's query directly or via the rewrite model
    #[command(group(ArgGroup::new("rewrite").required(true).args(["query", "instruction"])))]
    Rewrite {
        index: usize,

        /// New query text
        #[arg(long)]
        query: Option<String>,

        /// Instruction for the rewrite model
        #[arg(long)]
        instruction: Option<String>,
    },

    /// Find the next item to review
    Next {
        /// Current item index
        #[arg(long)]
        after: Option<usize>,

        /// Move backwards
        #[arg(long, conflicts_with = "pending")]
        back: bool,

        /// Skip to the next pending item, wrapping around
        #[arg(long)]
        pending: bool,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show available filter values (JSON)
    Filters,

    /// Export the review file
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        to: Option<PathBuf>,
    },

    /// Upload accepted items as a dataset
    Upload {
        /// Dataset name
        #[arg(long)]
        dataset: String,

        /// Dataset description
        #[arg(long)]
        description: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Status filter for CLI (maps to StatusFilter)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    All,
    Pending,
    Accepted,
    Rejected,
}

impl From<StatusArg> for StatusFilter {
    fn from(s: StatusArg) -> Self {
        match s {
            StatusArg::All => StatusFilter::All,
            StatusArg::Pending => StatusFilter::Pending,
            StatusArg::Accepted => StatusFilter::Accepted,
            StatusArg::Rejected => StatusFilter::Rejected,
        }
    }
}

/// Item filters shared by `list` and `next`
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Review status
    #[arg(long, value_enum, default_value = "all")]
    pub status: StatusArg,

    /// Category (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Language (repeatable)
    #[arg(long = "language")]
    pub languages: Vec<String>,

    /// Cited document (repeatable)
    #[arg(long = "doc")]
    pub doc_ids: Vec<String>,

    /// Only items flagged with typos
    #[arg(long, conflicts_with = "no_typos")]
    pub typos: bool,

    /// Only items without typos
    #[arg(long)]
    pub no_typos: bool,

    /// Only items whose query or citations were edited
    #[arg(long)]
    pub modified: bool,

    /// Case-insensitive query substring
    #[arg(long, default_value = "")]
    pub search: String,
}

impl From<FilterArgs> for ReviewFilters {
    fn from(args: FilterArgs) -> Self {
        let has_typos = match (args.typos, args.no_typos) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        ReviewFilters {
            status: args.status.into(),
            categories: args.categories,
            languages: args.languages,
            doc_ids: args.doc_ids,
            has_typos,
            modified_only: args.modified,
            search: args.search,
        }
    }
}

/// Knowledge base and output file the command works on
struct Workspace {
    kb: PathBuf,
    output: PathBuf,
}

impl Workspace {
    async fn open(&self, mode: LoadMode) -> Result<OpenOutcome> {
        let cfg = config::config()?;
        ReviewSession::open(&self.kb, &self.output, mode, cfg).await
    }

    /// Resume the review, seeding it on first use
    async fn session(&self) -> Result<ReviewSession> {
        match self.open(LoadMode::Resume).await? {
            OpenOutcome::Ready { session, .. } => Ok(session),
            OpenOutcome::ExistingReview { path, count } => {
                Err(ReviewError::ExistingReview { path, count }.into())
            }
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let workspace = Workspace {
            kb: self.kb,
            output: self.output,
        };

        match self.command {
            Commands::Load { resume, fresh } => {
                let mode = if fresh {
                    LoadMode::Reset
                } else if resume {
                    LoadMode::Resume
                } else {
                    LoadMode::Detect
                };
                load_review(&workspace, mode).await
            }
            Commands::Status => show_status(&workspace.session().await?),
            Commands::List { filters } => list_items(&workspace.session().await?, filters.into()),
            Commands::Show {
                index,
                doc,
                citation,
            } => show_item(&workspace.session().await?, index, doc, citation),
            Commands::Span { doc, text } => resolve_selection(&workspace, &doc, &text).await,
            Commands::Accept { index } => {
                let mut session = workspace.session().await?;
                print_item_line(session.accept(index).await?);
                print_next_pending(&session, index);
                Ok(())
            }
            Commands::Reject { index } => {
                let mut session = workspace.session().await?;
                print_item_line(session.reject(index).await?);
                print_next_pending(&session, index);
                Ok(())
            }
            Commands::Reset { index } => {
                let mut session = workspace.session().await?;
                print_item_line(session.reset(index).await?);
                Ok(())
            }
            Commands::Note { index, text } => {
                let mut session = workspace.session().await?;
                session.set_notes(index, text).await?;
                println!("Notes saved for item {}", index);
                Ok(())
            }
            Commands::Cite { command } => {
                let mut session = workspace.session().await?;
                cite::execute(&mut session, command).await
            }
            Commands::Rewrite {
                index,
                query,
                instruction,
            } => rewrite_item(&mut workspace.session().await?, index, query, instruction).await,
            Commands::Next {
                after,
                back,
                pending,
                filters,
            } => next_item(&workspace.session().await?, after, back, pending, filters.into()),
            Commands::Filters => {
                let options = workspace.session().await?.filter_options();
                println!("{}", serde_json::to_string_pretty(&options)?);
                Ok(())
            }
            Commands::Export { to } => export_review(&workspace.session().await?, to).await,
            Commands::Upload {
                dataset,
                description,
            } => upload_dataset(&workspace.session().await?, &dataset, description.as_deref()).await,
            Commands::Config => show_config(),
        }
    }
}

/// Open the review and report where items came from
async fn load_review(workspace: &Workspace, mode: LoadMode) -> Result<()> {
    match workspace.open(mode).await? {
        OpenOutcome::ExistingReview { path, count } => {
            eprintln!("A previous review exists: {} ({} items)", path.display(), count);
            eprintln!("Run 'sieve load --resume' to continue or 'sieve load --fresh' to start over.");
        }
        OpenOutcome::Ready { session, source } => {
            let from = match source {
                ItemSource::ReviewFile => "resumed from review file",
                ItemSource::Output => "seeded from output",
            };
            println!("Loaded {} items ({})", session.items().len(), from);
            println!("Documents: {}", session.kb().len());
            println!("Review file: {}", session.review_path().display());
        }
    }
    Ok(())
}

fn show_status(session: &ReviewSession) -> Result<()> {
    let stats = session.stats();
    let info = session.info();

    println!("Review file:    {}", info.review_path.display());
    if let Some(root) = session.kb().root() {
        println!("Knowledge base: {}", root.display());
    }
    println!("Documents:      {}", info.doc_ids.len());
    println!();
    println!("Total:    {}", stats.total);
    println!("Accepted: {}", stats.accepted);
    println!("Rejected: {}", stats.rejected);
    println!("Pending:  {}", stats.pending);

    Ok(())
}

fn list_items(session: &ReviewSession, filters: ReviewFilters) -> Result<()> {
    let indices = filtered_indices(session.items(), &filters);

    if indices.is_empty() {
        println!("No items match the filters");
        return Ok(());
    }

    println!("{:<6} {:<9} {:<14} {:<8} {}", "INDEX", "STATUS", "CATEGORY", "LANG", "QUERY");
    println!("{}", "-".repeat(90));

    for index in &indices {
        print_item_line(&session.items()[*index]);
    }

    println!("\nShowing {} of {} items", indices.len(), session.items().len());
    Ok(())
}

fn print_item_line(item: &ReviewItem) {
    let marker = if item.is_modified() { "*" } else { "" };
    println!(
        "{:<6} {:<9} {:<14} {:<8} {}{}",
        item.index,
        item.status.to_string(),
        item.classification.category.as_deref().unwrap_or("-"),
        item.classification.language.as_deref().unwrap_or("-"),
        truncate(&item.query, 55),
        marker
    );
}

fn print_next_pending(session: &ReviewSession, index: usize) {
    match session.next_pending(Some(index)) {
        Some(next) => eprintln!("Next pending: {}", next),
        None => eprintln!("All items reviewed"),
    }
}

/// Truncate to `max` characters, adding "..." when cut
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

fn show_item(
    session: &ReviewSession,
    index: usize,
    doc: Option<String>,
    citation: Option<usize>,
) -> Result<()> {
    let item = session.item(index)?;

    let focused = match citation {
        Some(0) => anyhow::bail!("Citation labels start at 1"),
        Some(label) if label > item.citations.len() => {
            return Err(ReviewError::CitationIndexOutOfRange {
                index: label - 1,
                len: item.citations.len(),
            }
            .into());
        }
        Some(label) => Some(label - 1),
        None => None,
    };

    println!("Item {} [{}]", item.index, item.status);
    println!();
    println!("Query:");
    println!("  {}", item.query);
    if let Some(original) = &item.original_query {
        println!("Original query:");
        println!("  {}", original);
    }

    let classification = &item.classification;
    println!();
    println!("Classification:");
    for (label, value) in [
        ("category", &classification.category),
        ("language", &classification.language),
        ("tone", &classification.tone),
        ("style", &classification.style),
    ] {
        if let Some(value) = value {
            println!("  {}: {}", label, value);
        }
    }
    println!("  has_typos: {}", classification.has_typos);
    for (key, value) in &classification.extra {
        println!("  {}: {}", key, value);
    }

    if !item.reviewer_notes.is_empty() {
        println!();
        println!("Notes:");
        println!("  {}", item.reviewer_notes);
    }

    let doc_id = doc
        .or_else(|| focused.map(|i| item.citations[i].doc_id.clone()))
        .or_else(|| item.doc_ids().first().map(|id| id.to_string()));

    let Some(doc_id) = doc_id else {
        println!();
        println!("No citations");
        return Ok(());
    };

    let document = session.kb().get(&doc_id).ok_or_else(|| ReviewError::DocumentNotFound {
        doc_id: doc_id.clone(),
    })?;
    let segments = session.segments_for(index, &doc_id)?;

    println!();
    println!("Citations in {}:", doc_id);
    for line in render::render_legend(&item.citations, &doc_id, document) {
        println!("{}", line);
    }

    let others: Vec<&str> = item.doc_ids().into_iter().filter(|id| *id != doc_id).collect();
    if !others.is_empty() {
        println!("Also cited: {}", others.join(", "));
    }

    println!();
    println!("=== {} ===", doc_id);
    println!("{}", render::render_segments(&segments, focused));

    Ok(())
}

async fn resolve_selection(workspace: &Workspace, doc_id: &str, text: &str) -> Result<()> {
    let kb = KnowledgeBase::load(&workspace.kb).await?;
    let document = kb.get(doc_id).ok_or_else(|| ReviewError::DocumentNotFound {
        doc_id: doc_id.to_string(),
    })?;

    let (span, method) = resolve_span_with_method(document, text).ok_or_else(|| {
        ReviewError::SpanNotFound {
            doc_id: doc_id.to_string(),
        }
    })?;

    tracing::debug!(method = method.as_str(), "Resolved selection");
    println!("{}", serde_json::to_string_pretty(&span)?);
    Ok(())
}

async fn rewrite_item(
    session: &mut ReviewSession,
    index: usize,
    query: Option<String>,
    instruction: Option<String>,
) -> Result<()> {
    let item = match (query, instruction) {
        (Some(query), _) => session.rewrite_query(index, query).await?,
        (None, Some(instruction)) => {
            let cfg = config::config()?;
            let rewriter = AnthropicRewriter::from_settings(&cfg.rewrite)?;
            session.rewrite_with(&rewriter, index, &instruction).await?
        }
        (None, None) => anyhow::bail!("Provide --query or --instruction"),
    };

    println!("Item {} query:", item.index);
    println!("  {}", item.query);
    if let Some(original) = &item.original_query {
        println!("Original:");
        println!("  {}", original);
    }
    Ok(())
}

fn next_item(
    session: &ReviewSession,
    after: Option<usize>,
    back: bool,
    pending: bool,
    filters: ReviewFilters,
) -> Result<()> {
    let items = session.items();
    let filtered = filtered_indices(items, &filters);

    let next = if pending {
        next_pending(items, &filtered, after)
    } else if back {
        prev_index(&filtered, after)
    } else {
        next_index(&filtered, after)
    };

    match next {
        Some(index) => print_item_line(&items[index]),
        None if pending => println!("No pending items"),
        None => println!("No items match the filters"),
    }
    Ok(())
}

async fn export_review(session: &ReviewSession, to: Option<PathBuf>) -> Result<()> {
    let content = session.export().await?;

    match to {
        Some(path) => {
            tokio::fs::write(&path, &content)
                .await
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            eprintln!("Exported {} items to {}", session.items().len(), path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

async fn upload_dataset(session: &ReviewSession, dataset: &str, description: Option<&str>) -> Result<()> {
    let cfg = config::config()?;
    let uploader = LangSmithUploader::from_settings(&cfg.upload)?;

    let receipt = session.upload_accepted(&uploader, dataset, description).await?;

    println!("Uploaded {} items to dataset '{}'", receipt.count, dataset);
    println!("  {}", receipt.url);
    Ok(())
}

/// Show resolved configuration
fn show_config() -> Result<()> {
    let cfg = config::config()?;
    let key_state = |key: &Option<String>| if key.is_some() { "set" } else { "not set" };

    println!("sieve configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Review file name: {}", cfg.review_file_name);
    println!();
    println!("Rewrite:");
    println!("  Model:      {}", cfg.rewrite.model);
    println!("  Max tokens: {}", cfg.rewrite.max_tokens);
    println!("  Base URL:   {}", cfg.rewrite.base_url);
    println!("  API key:    {}", key_state(&cfg.rewrite.api_key));
    println!();
    println!("Upload:");
    println!("  Endpoint:   {}", cfg.upload.endpoint);
    println!("  Web URL:    {}", cfg.upload.web_url);
    println!("  API key:    {}", key_state(&cfg.upload.api_key));
    println!();
    println!("HTTP timeout: {}s", cfg.rewrite.timeout_seconds);

    Ok(())
}
