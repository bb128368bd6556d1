use std::io::Write;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::io::{PairWriter, RowSink};
use crate::models::{AlignedPair, NormalizedRow, Speaker};
use crate::stages::{normalize_corpus, NormalizeConfig};

/// Configuration for building utterance/response pairs
#[derive(Debug, Clone)]
pub struct PairsConfig {
    /// Share of pairs, taken from the end, held out for testing (0 to <1)
    pub test_fraction: f64,
}

impl Default for PairsConfig {
    fn default() -> Self {
        Self { test_fraction: 0.0 }
    }
}

/// Counters for a pair-building run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairsStats {
    pub files: usize,
    pub rows: usize,
    pub parse_failures: usize,
    pub pairs: usize,
    pub train_pairs: usize,
    pub test_pairs: usize,
}

/// Collects normalized turns and keeps every A turn answered by the B turn
/// right after it in the same group
#[derive(Debug, Default)]
pub struct PairCollector {
    last: Option<(Speaker, NormalizedRow)>,
    pairs: Vec<AlignedPair>,
    rows: usize,
}

impl PairCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[AlignedPair] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<AlignedPair> {
        self.pairs
    }
}

impl RowSink for PairCollector {
    fn write_row(&mut self, speaker: Speaker, row: &NormalizedRow) -> Result<()> {
        if let Some((Speaker::A, previous)) = &self.last {
            if speaker == Speaker::B {
                self.pairs.push(AlignedPair::from_rows(previous, row));
            }
        }
        self.last = Some((speaker, row.clone()));
        self.rows += 1;
        Ok(())
    }

    fn write_separator(&mut self) -> Result<()> {
        self.last = None;
        Ok(())
    }

    fn end_group(&mut self) -> Result<()> {
        self.last = None;
        Ok(())
    }

    fn rows(&self) -> usize {
        self.rows
    }
}

/// Number of trailing pairs held out for `fraction`
pub fn holdout_len(total: usize, fraction: f64) -> usize {
    if !(0.0..1.0).contains(&fraction) {
        return 0;
    }
    (total as f64 * fraction).floor() as usize
}

/// Normalize the corpus under `root` and write its A/B pairs, the head to
/// `train` and the held-out tail to `test`
pub fn execute_pairs<W: Write, T: Write>(
    root: &Path,
    train: &mut PairWriter<W>,
    test: Option<&mut PairWriter<T>>,
    normalize: &NormalizeConfig,
    config: &PairsConfig,
) -> Result<PairsStats> {
    let mut collector = PairCollector::new();
    let normalized = normalize_corpus(root, &mut collector, normalize)?;
    let pairs = collector.into_pairs();

    let held_out = if test.is_some() {
        holdout_len(pairs.len(), config.test_fraction)
    } else {
        0
    };
    let split = pairs.len() - held_out;

    for pair in &pairs[..split] {
        train.write_pair(pair)?;
    }
    if let Some(test) = test {
        for pair in &pairs[split..] {
            test.write_pair(pair)?;
        }
    }

    let stats = PairsStats {
        files: normalized.files,
        rows: normalized.rows_written,
        parse_failures: normalized.parse_failures,
        pairs: pairs.len(),
        train_pairs: split,
        test_pairs: held_out,
    };

    info!(
        "Built {} pairs from {} turns ({} train, {} test)",
        stats.pairs, stats.rows, stats.train_pairs, stats.test_pairs
    );

    Ok(stats)
}
