use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use word_embedding_loader::format::Format;
use word_embedding_loader_utils::{
    detect_format, format_listing, read_embeddings, write_embeddings, InputFormat,
};

#[derive(Parser)]
#[command(name = "wel")]
#[command(about = "Convert and inspect word embedding files")]
#[command(version)]
struct Cli {
    /// Log debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert embeddings to another format
    Convert {
        /// Input embeddings
        input: String,

        /// Output embeddings
        output: String,

        /// Output format: glove, word2vec-text, word2vec-binary
        #[arg(short, long, value_name = "FORMAT")]
        to_format: String,

        /// Input format: auto, glove, word2vec-text, word2vec-binary
        #[arg(short, long, value_name = "FORMAT", default_value = "auto")]
        from_format: String,

        /// Frequency vocabulary, only its tokens are converted
        #[arg(long, value_name = "FILE")]
        vocab: Option<String>,

        /// Maximum vocabulary size
        #[arg(long, value_name = "N")]
        max_vocab: Option<usize>,
    },

    /// Print the detected format of an embedding file
    CheckFormat {
        /// Input embeddings
        input: String,
    },

    /// List the supported formats
    List,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(err) = run(cli.command) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Convert {
            input,
            output,
            to_format,
            from_format,
            vocab,
            max_vocab,
        } => {
            let input_format = InputFormat::try_from(&from_format)?;
            let output_format: Format = to_format
                .parse()
                .with_context(|| format!("Cannot parse output format '{}'", to_format))?;

            let store = read_embeddings(&input, input_format, vocab.as_deref(), max_vocab)?;
            write_embeddings(&store, &output, output_format)?;
        }
        Command::CheckFormat { input } => {
            let format = detect_format(&input)?;
            println!("{}: {}", format.name(), format.description());
        }
        Command::List => {
            for line in format_listing() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
