use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::io::{list_utt_files, open_transcript, transcript_lines, RowSink};
use crate::models::{ConversationState, DialogueActVocab, NormalizedRow, TranscriptLine, Turn};

/// Label that marks an utterance as continuing whatever act came before
pub const CONTINUATION_LABEL: &str = "%";

/// Configuration for the dialogue-act normalizer
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    /// Labels a turn may start with
    pub vocab: DialogueActVocab,
    /// Substring a file name must contain to be processed
    pub file_marker: String,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            vocab: DialogueActVocab::default(),
            file_marker: ".utt".to_string(),
        }
    }
}

/// What a single line did to the conversation state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Same speaker, text merged onto the accumulated turn
    Continued,
    /// Same speaker switched to a new act; the partial turn was discarded
    Replaced,
    /// Same speaker, but neither a continuation nor an acceptable new act
    Dropped,
    /// New speaker started a turn
    Started,
    /// New speaker's first line was unusable; state was reset
    Abandoned,
    /// Out-of-sequence line; a separator was written
    Boundary,
}

/// Counters for a normalizer run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub files: usize,
    pub lines: usize,
    pub irregular_lines: usize,
    pub parse_failures: usize,
    pub continued: usize,
    pub replaced: usize,
    pub dropped: usize,
    pub started: usize,
    pub abandoned: usize,
    pub boundaries: usize,
    pub rows_written: usize,
}

impl NormalizeStats {
    fn record(&mut self, step: Step) {
        match step {
            Step::Continued => self.continued += 1,
            Step::Replaced => self.replaced += 1,
            Step::Dropped => self.dropped += 1,
            Step::Started => self.started += 1,
            Step::Abandoned => self.abandoned += 1,
            Step::Boundary => self.boundaries += 1,
        }
    }

    fn merge(&mut self, other: &NormalizeStats) {
        self.files += other.files;
        self.lines += other.lines;
        self.irregular_lines += other.irregular_lines;
        self.parse_failures += other.parse_failures;
        self.continued += other.continued;
        self.replaced += other.replaced;
        self.dropped += other.dropped;
        self.started += other.started;
        self.abandoned += other.abandoned;
        self.boundaries += other.boundaries;
        self.rows_written += other.rows_written;
    }
}

/// A line may open or replace a turn only if its act is known and it
/// carries no disfluency marker
fn is_acceptable(line: &TranscriptLine, vocab: &DialogueActVocab) -> bool {
    vocab.contains(&line.label) && !line.disfluent
}

/// Write the accumulated turn if both of its fields are filled
fn flush_turn<S: RowSink>(state: &ConversationState, out: &mut S) -> Result<bool> {
    match state.last_speaker {
        Some(speaker) if state.turn.is_complete() => {
            out.write_row(speaker, &NormalizedRow::from_turn(&state.turn))?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Apply one parsed line to the conversation state
pub fn normalize_line<S: RowSink>(
    state: &mut ConversationState,
    line: &TranscriptLine,
    vocab: &DialogueActVocab,
    out: &mut S,
) -> Result<Step> {
    let same_speaker = state.is_same_speaker(line.speaker);

    if line.utterance > 1 && same_speaker {
        let continues_act = line.label == state.turn.label || line.label == CONTINUATION_LABEL;
        if continues_act && line.starts_lowercase() {
            state.turn.extend(&line.text);
            Ok(Step::Continued)
        } else if is_acceptable(line, vocab) {
            state.turn = Turn::from_line(line);
            Ok(Step::Replaced)
        } else {
            Ok(Step::Dropped)
        }
    } else if !same_speaker && line.utterance == 1 {
        flush_turn(state, out)?;
        if is_acceptable(line, vocab) {
            state.last_speaker = Some(line.speaker);
            state.turn = Turn::from_line(line);
            Ok(Step::Started)
        } else {
            out.write_separator()?;
            state.reset();
            Ok(Step::Abandoned)
        }
    } else {
        out.write_separator()?;
        Ok(Step::Boundary)
    }
}

/// Normalize one conversation. State starts fresh and the pending turn is
/// flushed at the end.
pub fn normalize_reader<R: BufRead, S: RowSink>(
    reader: R,
    vocab: &DialogueActVocab,
    out: &mut S,
    source: &Path,
) -> Result<NormalizeStats> {
    let mut stats = NormalizeStats {
        files: 1,
        ..Default::default()
    };
    let rows_before = out.rows();
    let mut state = ConversationState::new();

    for (index, line) in transcript_lines(reader).enumerate() {
        let line = line.context("Failed to read line")?;
        stats.lines += 1;

        match line.and_then(|l| TranscriptLine::parse(&l)) {
            Ok(parsed) => {
                let step = normalize_line(&mut state, &parsed, vocab, out)?;
                stats.record(step);
            }
            Err(e) if e.is_irregular() => {
                debug!("{:?}:{}: skipped {}", source, index + 1, e);
                stats.irregular_lines += 1;
            }
            Err(e) => {
                warn!("{:?}:{}: {}", source, index + 1, e);
                stats.parse_failures += 1;
            }
        }
    }

    flush_turn(&state, out)?;
    out.end_group()?;

    stats.rows_written = out.rows() - rows_before;
    Ok(stats)
}

/// Normalize a single transcript file
pub fn normalize_file<S: RowSink>(
    path: &Path,
    vocab: &DialogueActVocab,
    out: &mut S,
) -> Result<NormalizeStats> {
    let reader = open_transcript(path)?;
    normalize_reader(reader, vocab, out, path)
        .with_context(|| format!("Failed to normalize {:?}", path))
}

/// Normalize every `root/<group>/*<marker>*` transcript into `out`
pub fn normalize_corpus<S: RowSink>(
    root: &Path,
    out: &mut S,
    config: &NormalizeConfig,
) -> Result<NormalizeStats> {
    let files = list_utt_files(root, &config.file_marker)?;
    info!(
        "Normalizing {} transcripts under {:?} with {} labels",
        files.len(),
        root,
        config.vocab.len()
    );

    let mut stats = NormalizeStats::default();
    for path in &files {
        let file_stats = normalize_file(path, &config.vocab, out)?;
        debug!("{:?}: {} rows", path, file_stats.rows_written);
        stats.merge(&file_stats);
    }

    info!(
        "Normalized {} files: {} rows, {} irregular lines, {} parse failures",
        stats.files, stats.rows_written, stats.irregular_lines, stats.parse_failures
    );
    if stats.parse_failures > 0 {
        warn!("{} lines could not be parsed", stats.parse_failures);
    }

    Ok(stats)
}
