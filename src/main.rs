use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use contest_rag::corpus::{build_corpus, load_corpus_dir};
use contest_rag::embedding::resolve_embedder_batched;
use contest_rag::ingest::build_index_from_corpus;
use contest_rag::{Plan, RetrievalAgent};

#[derive(Debug, Parser)]
#[command(version, about = "Contest announcement retrieval", rename_all = "kebab")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the vector index from fabricated contests or a directory of .txt files.
    Ingest(IngestArgs),
    /// Query the index and print the response payload as JSON.
    Ask(AskArgs),
}

#[derive(Debug, Args)]
struct IngestArgs {
    #[arg(long)]
    index_dir: Option<PathBuf>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long, default_value_t = 20)]
    num_contests: usize,
    #[arg(long, default_value_t = 128)]
    batch_size: usize,
    /// Index these files instead of fabricated contests.
    #[arg(long, value_name = "DIR")]
    docs_dir: Option<PathBuf>,
    #[arg(long, default_value_t = 800)]
    max_chars: usize,
}

impl IngestArgs {
    /// Index directory and embedding model, falling back to `base` like `ask` does.
    fn target(&self, base: Plan) -> (PathBuf, String) {
        (
            self.index_dir.clone().unwrap_or(base.index_dir),
            self.model.clone().unwrap_or(base.embedding_model),
        )
    }
}

#[derive(Debug, Args)]
struct AskArgs {
    query: String,
    #[arg(long)]
    index_dir: Option<PathBuf>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    top_k: Option<usize>,
    #[arg(long)]
    min_score: Option<f32>,
    #[arg(long)]
    min_mean_topk: Option<f32>,
    #[arg(long)]
    max_context: Option<usize>,
    #[arg(long)]
    force_rag_only: bool,
    /// Never draft an answer unless --force-rag-only is set.
    #[arg(long)]
    no_draft: bool,
}

impl AskArgs {
    fn plan(&self, base: Plan) -> Plan {
        Plan {
            index_dir: self.index_dir.clone().unwrap_or(base.index_dir),
            embedding_model: self.model.clone().unwrap_or(base.embedding_model),
            top_k: self.top_k.unwrap_or(base.top_k),
            min_score: self.min_score.unwrap_or(base.min_score),
            min_mean_topk: self.min_mean_topk.unwrap_or(base.min_mean_topk),
            max_context: self.max_context.unwrap_or(base.max_context),
            force_rag_only: self.force_rag_only || base.force_rag_only,
            return_draft_when_enough: !self.no_draft && base.return_draft_when_enough,
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Ingest(args) => ingest(args),
        Command::Ask(args) => ask(args),
    }
}

fn ingest(args: IngestArgs) -> Result<()> {
    let corpus = match &args.docs_dir {
        Some(dir) => load_corpus_dir(dir, args.max_chars)?,
        None => build_corpus(args.num_contests),
    };
    let (index_dir, model) = args.target(Plan::from_env()?);
    let embedder = resolve_embedder_batched(&model, args.batch_size)?;

    let stats = build_index_from_corpus(&corpus, &index_dir, embedder.as_ref(), args.batch_size)?;
    info!(
        indexed = stats.indexed,
        dim = stats.dim,
        index_dir = %index_dir.display(),
        model = %model,
        "index build complete"
    );
    Ok(())
}

fn ask(args: AskArgs) -> Result<()> {
    let plan = args.plan(Plan::from_env()?);
    let agent = RetrievalAgent::new(plan);

    let payload = agent.handle(&args.query, None)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
