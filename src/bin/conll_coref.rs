//! conll-coref - CoNLL-2012 coreference annotation CLI
//!
//! Thin glue over the library: parse files, inspect the enumerated candidate
//! pairs, and rewrite the coreference column.
//!
//! # Usage
//!
//! ```bash
//! # Parse a file and print document/mention/pair statistics
//! conll-coref parse dev/cctv_0000.auto_conll
//!
//! # Dump the enumerated (antecedent, anaphor) candidate pairs
//! conll-coref pairs dev/cctv_0000.auto_conll --limit 20
//!
//! # Round-trip the gold mentions as singleton clusters into <file>_out
//! conll-coref rewrite dev/cctv_0000.auto_conll
//!
//! # Rewrite using the gold-label oracle instead of singletons
//! conll-coref rewrite dev/cctv_0000.auto_conll --oracle
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use conll_coref::{ConllFile, OracleClassifier, PairClassifier, Result};

/// CoNLL-2012 coreference annotation toolkit
#[derive(Parser)]
#[command(name = "conll-coref")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and report statistics
    #[command(visible_alias = "p")]
    Parse {
        /// Annotation file to parse
        file: PathBuf,
        /// Emit statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dump enumerated candidate pairs
    Pairs {
        /// Annotation file to parse
        file: PathBuf,
        /// Print at most this many pairs per document
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Rewrite the coreference column into a `_out` sibling file
    Rewrite {
        /// Annotation file to rewrite
        file: PathBuf,
        /// Output path (defaults to `<file>_out`)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Cluster with the gold-label oracle instead of one singleton
        /// cluster per gold mention
        #[arg(long)]
        oracle: bool,
    },
}

#[derive(Serialize)]
struct FileStats {
    path: PathBuf,
    documents: usize,
    sentences: usize,
    tokens: usize,
    mentions: usize,
    pairs: usize,
}

fn stats(file: &mut ConllFile) -> Result<FileStats> {
    let mut sentences = 0;
    let mut tokens = 0;
    let mut mentions = 0;
    let mut pairs = 0;
    for doc in &mut file.documents {
        pairs += doc.collect_pairs()?.len();
        sentences += doc.sentences.len();
        tokens += doc.sentences.iter().map(|s| s.records.len()).sum::<usize>();
        mentions += doc.mentions().count();
    }
    Ok(FileStats {
        path: file.path.clone(),
        documents: file.documents.len(),
        sentences,
        tokens,
        mentions,
        pairs,
    })
}

fn cmd_parse(path: PathBuf, json: bool) -> Result<()> {
    let mut file = ConllFile::read(&path)?;
    let stats = stats(&mut file)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats).expect("stats serialize"));
    } else {
        println!("{}", stats.path.display());
        println!("  documents: {}", stats.documents);
        println!("  sentences: {}", stats.sentences);
        println!("  tokens:    {}", stats.tokens);
        println!("  mentions:  {}", stats.mentions);
        println!("  pairs:     {}", stats.pairs);
    }
    Ok(())
}

fn cmd_pairs(path: PathBuf, limit: Option<usize>) -> Result<()> {
    let mut file = ConllFile::read(&path)?;
    for (d, doc) in file.documents.iter_mut().enumerate() {
        let pairs = doc.collect_pairs()?;
        println!("document {d}: {} pairs", pairs.len());
        for pair in pairs.iter().take(limit.unwrap_or(usize::MAX)) {
            println!(
                "  s{}[{},{}] <- s{}[{},{}]  gold={}",
                pair.antecedent.sentence,
                pair.antecedent.span.start,
                pair.antecedent.span.end,
                pair.anaphor.sentence,
                pair.anaphor.span.start,
                pair.anaphor.span.end,
                pair.label,
            );
        }
    }
    Ok(())
}

fn cmd_rewrite(path: PathBuf, output: Option<PathBuf>, oracle: bool) -> Result<()> {
    let mut file = ConllFile::read(&path)?;
    for doc in &mut file.documents {
        if oracle {
            let predictions = OracleClassifier.predict(doc.collect_pairs()?);
            let clusters = doc.cluster(&predictions)?;
            doc.write_results(&clusters)?;
        } else {
            doc.write_gold_singletons()?;
        }
    }
    let out = match output {
        Some(out) => {
            file.write_to(&out)?;
            out
        }
        None => file.write()?,
    };
    println!("wrote {}", out.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Parse { file, json } => cmd_parse(file, json),
        Commands::Pairs { file, limit } => cmd_pairs(file, limit),
        Commands::Rewrite {
            file,
            output,
            oracle,
        } => cmd_rewrite(file, output, oracle),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
