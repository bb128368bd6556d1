use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use swbalign::{
    align_corpus, analyze_corpus, create_output, execute_pairs, load_vocab_file,
    normalize_corpus, open_append, AlignConfig, DialogueActVocab, NormalizeConfig, PairWriter,
    PairsConfig, RowWriter, RunReport,
};

#[derive(Parser)]
#[command(name = "swbalign")]
#[command(
    author,
    version,
    about = "Switchboard utterance/response dataset builder",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pair every A line with the B line that directly follows it
    Align {
        /// Root of the tab-separated transcript tree
        #[arg(short, long)]
        input: PathBuf,

        /// Dataset file, appended to
        #[arg(short, long)]
        output: PathBuf,

        /// Path under the root to skip (repeatable, replaces the defaults)
        #[arg(long)]
        ignore: Vec<PathBuf>,

        /// Truncate the dataset file instead of appending
        #[arg(long)]
        truncate: bool,

        /// Fail on the first malformed line instead of skipping the rest of the file
        #[arg(long)]
        strict: bool,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Merge turns and filter dialogue acts into label,text rows
    Normalize {
        /// Root of the dialogue-act corpus (one subdirectory per group)
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Vocabulary file, one label per line (defaults to the Switchboard set)
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Substring a transcript file name must contain
        #[arg(long, default_value = ".utt")]
        marker: String,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Normalize the corpus and pair each A turn with the B turn answering it
    Pairs {
        /// Root of the dialogue-act corpus (one subdirectory per group)
        #[arg(short, long)]
        input: PathBuf,

        /// Vocabulary file, one label per line (defaults to the Switchboard set)
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Substring a transcript file name must contain
        #[arg(long, default_value = ".utt")]
        marker: String,

        /// Training pairs output
        #[arg(short, long)]
        output: PathBuf,

        /// Held-out pairs output
        #[arg(long)]
        test_output: Option<PathBuf>,

        /// Fraction of pairs, from the end, to hold out (0-1)
        #[arg(long, default_value = "0.0")]
        test_fraction: f64,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report corpus statistics without writing a dataset
    Analyze {
        /// Root of the dialogue-act corpus
        #[arg(short, long)]
        input: PathBuf,

        /// Vocabulary file, one label per line
        #[arg(long)]
        vocab: Option<PathBuf>,

        /// Substring a transcript file name must contain
        #[arg(long, default_value = ".utt")]
        marker: String,

        /// Number of labels to list
        #[arg(long, default_value = "20")]
        top: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Align {
            input,
            output,
            ignore,
            truncate,
            strict,
            report,
            verbose,
        } => {
            setup_logging(verbose);
            let mut config = AlignConfig {
                strict,
                ..Default::default()
            };
            if !ignore.is_empty() {
                config.ignore = ignore;
            }
            run_align(&input, &output, truncate, &config, report.as_deref())
        }
        Commands::Normalize {
            input,
            output,
            vocab,
            marker,
            report,
            verbose,
        } => {
            setup_logging(verbose);
            let config = NormalizeConfig {
                vocab: load_vocab(vocab.as_deref())?,
                file_marker: marker,
            };
            run_normalize(&input, &output, &config, report.as_deref())
        }
        Commands::Pairs {
            input,
            vocab,
            marker,
            output,
            test_output,
            test_fraction,
            report,
            verbose,
        } => {
            setup_logging(verbose);
            if !(0.0..1.0).contains(&test_fraction) {
                bail!("--test-fraction must be in [0, 1), got {}", test_fraction);
            }
            let normalize = NormalizeConfig {
                vocab: load_vocab(vocab.as_deref())?,
                file_marker: marker,
            };
            let config = PairsConfig { test_fraction };
            run_pairs(
                &input,
                &output,
                test_output.as_deref(),
                &normalize,
                &config,
                report.as_deref(),
            )
        }
        Commands::Analyze {
            input,
            vocab,
            marker,
            top,
            verbose,
        } => {
            setup_logging(verbose);
            let vocab = load_vocab(vocab.as_deref())?;
            run_analyze(&input, &vocab, &marker, top)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_vocab(path: Option<&Path>) -> Result<DialogueActVocab> {
    let vocab = match path {
        Some(path) => load_vocab_file(path).context("Failed to load vocabulary")?,
        None => DialogueActVocab::default(),
    };
    if vocab.is_empty() {
        bail!("Vocabulary is empty");
    }
    info!("Using {} dialogue-act labels", vocab.len());
    Ok(vocab)
}

fn run_align(
    input: &Path,
    output: &Path,
    truncate: bool,
    config: &AlignConfig,
    report: Option<&Path>,
) -> Result<()> {
    info!("Aligning corpus {:?} into {:?}", input, output);
    let mut writer = PairWriter::new(open_append(output, truncate)?);
    let stats = align_corpus(input, &mut writer, config)?;
    writer.finish()?;

    if let Some(path) = report {
        RunReport::new("align", &stats).write_json(path)?;
        info!("Report written to {:?}", path);
    }
    Ok(())
}

fn run_normalize(
    input: &Path,
    output: &Path,
    config: &NormalizeConfig,
    report: Option<&Path>,
) -> Result<()> {
    info!("Normalizing corpus {:?} into {:?}", input, output);
    let mut writer = RowWriter::new(create_output(output)?);
    let stats = normalize_corpus(input, &mut writer, config)?;
    writer.finish()?;

    info!(
        "Complete: {} rows, {} turns started, {} continuations merged, {} fragments abandoned",
        stats.rows_written, stats.started, stats.continued, stats.abandoned
    );

    if let Some(path) = report {
        RunReport::new("normalize", &stats).write_json(path)?;
        info!("Report written to {:?}", path);
    }
    Ok(())
}

fn run_pairs(
    input: &Path,
    output: &Path,
    test_output: Option<&Path>,
    normalize: &NormalizeConfig,
    config: &PairsConfig,
    report: Option<&Path>,
) -> Result<()> {
    info!("Building pairs from corpus {:?}", input);
    let mut train = PairWriter::new(create_output(output)?);
    let mut test = match test_output {
        Some(path) => Some(PairWriter::new(create_output(path)?)),
        None => None,
    };

    let stats = execute_pairs(input, &mut train, test.as_mut(), normalize, config)?;
    train.finish()?;
    if let Some(test) = test {
        test.finish()?;
    }

    if let Some(path) = report {
        RunReport::new("pairs", &stats).write_json(path)?;
        info!("Report written to {:?}", path);
    }
    Ok(())
}

fn run_analyze(input: &Path, vocab: &DialogueActVocab, marker: &str, top: usize) -> Result<()> {
    let analysis = analyze_corpus(input, vocab, marker)?;

    println!("Corpus Analysis");
    println!("===============");
    println!("Files: {}", analysis.files);
    println!("Lines: {}", analysis.lines);
    println!("Parsed lines: {}", analysis.parsed_lines);
    println!("Irregular lines: {}", analysis.irregular_lines);
    println!("Parse failures: {}", analysis.parse_failures);
    println!("Disfluent (@) lines: {}", analysis.disfluent_lines);
    println!(
        "Speaker lines: A {}, B {}",
        analysis.speaker_a_lines, analysis.speaker_b_lines
    );
    println!("Out-of-vocabulary lines: {}", analysis.out_of_vocab_lines);
    println!();

    println!("Dialogue Acts");
    println!("-------------");
    let total = analysis.parsed_lines.max(1) as f64;
    for entry in analysis.labels.iter().take(top) {
        println!(
            "{:<6} {:>8} {:>6.2}%{}",
            entry.label,
            entry.count,
            entry.count as f64 / total * 100.0,
            if entry.in_vocab { "" } else { "  (not in vocabulary)" }
        );
    }
    if analysis.labels.len() > top {
        println!("... {} more labels", analysis.labels.len() - top);
    }

    Ok(())
}
