//! Interactive terminal client for the grounded RAG core
//!
//! Run with: cargo run -p grounded-rag --features cli --bin grounded-rag-query

use clap::Parser;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use grounded_rag::{
    config::RagConfig,
    service::{Providers, QueryService},
    types::{MetadataExt, QueryAnswer},
    Error,
};

/// Characters of chunk content shown per source
const PREVIEW_CHARS: usize = 250;

#[derive(Parser)]
#[command(name = "grounded-rag-query")]
#[command(about = "Ask questions against a persisted document index")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding index.vec, index.json and metadata.json
    #[arg(short, long)]
    index_dir: Option<PathBuf>,

    /// Number of chunks to retrieve per question
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grounded_rag=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = RagConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.index_dir {
        config.index.persist_dir = dir;
    }
    config.validate()?;

    println!("{}", style("Initializing RAG system...").dim());

    let providers = Providers::from_config(&config)?;
    let service = match QueryService::load(&config, providers).await {
        Ok(service) => service,
        Err(Error::MissingIndexFile(path)) => {
            eprintln!(
                "{} Required index file not found: {}",
                style("Error:").red().bold(),
                path.display()
            );
            eprintln!("Please run the ingestion step first to build the index.");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let top_k = service.resolve_top_k(cli.top_k);
    let stats = service.stats();
    println!(
        "{} {} chunks loaded (dimension {})",
        style("Ready:").green().bold(),
        stats.corpus_chunks,
        stats.dimensions
    );
    println!("Type 'exit' or 'quit' to leave.\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", style("Question>").cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let question = line?;
        let question = question.trim();

        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        match service.ask(question, top_k).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => eprintln!("{} {}", style("Query failed:").red(), e),
        }
    }

    println!("Goodbye.");
    Ok(())
}

fn print_answer(answer: &QueryAnswer) {
    let rule = "=".repeat(60);

    println!("\n{}", style(&rule).dim());
    println!("{}", answer.answer_text);
    println!("{}\n", style(&rule).dim());

    if answer.cited_sources.is_empty() {
        println!("{}\n", style("No sources retrieved.").yellow());
        return;
    }

    println!("{}", style("Sources:").bold());
    for source in &answer.cited_sources {
        let metadata = &source.hit.metadata;

        println!(
            "  [{}] score {:.4} | {} ({})",
            source.display_index,
            source.hit.similarity_score,
            metadata.source(),
            metadata.doc_type()
        );
        if let Some(page) = metadata.page() {
            println!("      page {}", page);
        }

        let preview: String = source.hit.content.chars().take(PREVIEW_CHARS).collect();
        let ellipsis = if source.hit.content.chars().count() > PREVIEW_CHARS { "..." } else { "" };
        println!("      {}{}", style(preview.replace('\n', " ")).dim(), ellipsis);
    }
    println!();
}
