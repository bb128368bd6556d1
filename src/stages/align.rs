use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::LineError;
use crate::io::{open_transcript, transcript_lines, walk_corpus, PairWriter};
use crate::models::{AlignedPair, Speaker, TabbedLine};

/// Configuration for the corpus aligner
#[derive(Debug, Clone)]
pub struct AlignConfig {
    /// Paths relative to the corpus root that are skipped entirely
    pub ignore: Vec<PathBuf>,
    /// Fail the run on the first malformed line instead of abandoning the file
    pub strict: bool,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            ignore: vec![
                PathBuf::from("doc"),
                PathBuf::from("README"),
                PathBuf::from("dataset_small_test_file.txt"),
            ],
            strict: false,
        }
    }
}

/// A line that stopped processing of its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number
    pub line_number: usize,
    pub error: LineError,
}

/// Outcome of aligning a single transcript
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignFileResult {
    /// Lines read, including the malformed one if any
    pub lines: usize,
    pub pairs: usize,
    /// Set when the file was abandoned part way
    pub malformed: Option<MalformedLine>,
}

/// Counters for a whole aligner run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlignStats {
    pub files: usize,
    pub files_aborted: usize,
    pub lines: usize,
    pub pairs: usize,
}

fn line_text((line_number, line): &(usize, TabbedLine)) -> Result<&str, MalformedLine> {
    line.require_text().map_err(|error| MalformedLine {
        line_number: *line_number,
        error,
    })
}

/// Build the pair for an A line followed by a B line. Both lines need
/// their text; the error names the line that lacks it.
fn pair_lines(
    previous: &(usize, TabbedLine),
    current: &(usize, TabbedLine),
) -> Result<AlignedPair, MalformedLine> {
    let utterance = line_text(previous)?;
    let response = line_text(current)?;
    Ok(AlignedPair::new(&previous.1.label, utterance, &current.1.label, response))
}

/// Align one transcript: every A line immediately followed by a B line
/// becomes a pair. Stops at the first malformed line.
pub fn align_reader<R: BufRead, W: Write>(
    reader: R,
    out: &mut PairWriter<W>,
) -> Result<AlignFileResult> {
    let mut result = AlignFileResult::default();
    let mut last: Option<(usize, TabbedLine)> = None;

    for (index, line) in transcript_lines(reader).enumerate() {
        let line = line.context("Failed to read line")?;
        let line_number = index + 1;
        result.lines += 1;

        let current = match line.and_then(|l| TabbedLine::parse(&l)) {
            Ok(current) => (line_number, current),
            Err(error) => {
                result.malformed = Some(MalformedLine { line_number, error });
                break;
            }
        };

        if let Some(previous) = &last {
            if previous.1.speaker == Some(Speaker::A) && current.1.speaker == Some(Speaker::B) {
                match pair_lines(previous, &current) {
                    Ok(pair) => {
                        out.write_pair(&pair)?;
                        result.pairs += 1;
                    }
                    Err(malformed) => {
                        result.malformed = Some(malformed);
                        break;
                    }
                }
            }
        }

        last = Some(current);
    }

    Ok(result)
}

/// Align a single file
pub fn align_file<W: Write>(path: &Path, out: &mut PairWriter<W>) -> Result<AlignFileResult> {
    let reader = open_transcript(path)?;
    align_reader(reader, out).with_context(|| format!("Failed to align {:?}", path))
}

/// Align every file under `root`, appending pairs to `out`
pub fn align_corpus<W: Write>(
    root: &Path,
    out: &mut PairWriter<W>,
    config: &AlignConfig,
) -> Result<AlignStats> {
    let files = walk_corpus(root, &config.ignore)?;
    info!("Aligning {} files under {:?}", files.len(), root);

    let mut stats = AlignStats::default();

    for path in &files {
        let result = align_file(path, out)?;
        stats.files += 1;
        stats.lines += result.lines;
        stats.pairs += result.pairs;

        if let Some(malformed) = result.malformed {
            if config.strict {
                bail!(
                    "Malformed line {} in {:?}: {}",
                    malformed.line_number,
                    path,
                    malformed.error
                );
            }
            warn!(
                "Abandoning {:?} at line {}: {}",
                path, malformed.line_number, malformed.error
            );
            stats.files_aborted += 1;
        } else {
            debug!("{:?}: {} pairs", path, result.pairs);
        }
    }

    info!(
        "Aligned {} files: {} pairs, {} files abandoned",
        stats.files, stats.pairs, stats.files_aborted
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn align_str(input: &str) -> (AlignFileResult, String) {
        let mut writer = PairWriter::new(Vec::new());
        let result = align_reader(input.as_bytes(), &mut writer).unwrap();
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        (result, out)
    }

    #[test]
    fn test_pairs_on_a_to_b_switch() {
        let input = "qy\tA.1\tdo you have pets\n\
                     ny\tB.2\tyes two cats\n\
                     sv\tB.3\tthey are great\n\
                     ba\tA.4\tnice\n\
                     sd\tA.5\ti had a dog\n\
                     b\tB.6\tuh-huh\n";
        let (result, out) = align_str(input);

        assert_eq!(result.lines, 6);
        assert_eq!(result.pairs, 2);
        assert!(result.malformed.is_none());
        assert_eq!(
            out,
            "qy\tdo you have pets\tny\tyes two cats\n\
             sd\ti had a dog\tb\tuh-huh\n"
        );
    }

    #[test]
    fn test_b_to_a_switch_emits_nothing() {
        let (result, out) = align_str("sv\tB.1\tfirst\nsv\tA.2\tsecond\n");
        assert_eq!(result.pairs, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_text_is_copied_verbatim() {
        let (_, out) = align_str("sd\tA.1\t  Well,  {F uh } -- /\r\nsv\tB.2\tOkay.  \n");
        assert_eq!(out, "sd\t  Well,  {F uh } -- /\tsv\tOkay.  \n");
    }

    #[test]
    fn test_malformed_line_stops_file() {
        let input = "qy\tA.1\tquestion\n\
                     ny\tB.2\tanswer\n\
                     this line is broken\n\
                     qy\tA.3\tlater\n\
                     ny\tB.4\tnever seen\n";
        let (result, out) = align_str(input);

        assert_eq!(result.pairs, 1);
        assert_eq!(result.lines, 3);
        let malformed = result.malformed.unwrap();
        assert_eq!(malformed.line_number, 3);
        assert_eq!(
            malformed.error,
            LineError::TooFewFields {
                expected: 2,
                found: 1
            }
        );
        assert_eq!(out, "qy\tquestion\tny\tanswer\n");
    }

    #[test]
    fn test_two_field_line_outside_a_pair_is_harmless() {
        let input = "qy\tA.1\tq\n\
                     ny\tB.2\ta\n\
                     x\tA.3\n\
                     qy\tA.4\tlater\n\
                     ny\tB.5\tresp\n";
        let (result, out) = align_str(input);

        assert!(result.malformed.is_none());
        assert_eq!(result.pairs, 2);
        assert_eq!(out, "qy\tq\tny\ta\nqy\tlater\tny\tresp\n");
    }

    #[test]
    fn test_two_field_line_in_a_pair_stops_file() {
        let input = "qy\tA.1\tq\n\
                     ny\tB.2\n\
                     qy\tA.3\tlater\n\
                     ny\tB.4\tresp\n";
        let (result, out) = align_str(input);

        assert_eq!(result.pairs, 0);
        assert_eq!(result.lines, 2);
        assert_eq!(
            result.malformed,
            Some(MalformedLine {
                line_number: 2,
                error: LineError::TooFewFields {
                    expected: 3,
                    found: 2
                },
            })
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_invalid_utf8_stops_only_that_file() {
        let input: &[u8] = b"qy\tA.1\tone\nny\tB.2\ttwo\nsd\tA.3\tcaf\xe9\nsv\tB.4\tnever\n";
        let mut writer = PairWriter::new(Vec::new());
        let result = align_reader(input, &mut writer).unwrap();

        assert_eq!(result.pairs, 1);
        let malformed = result.malformed.unwrap();
        assert_eq!(malformed.line_number, 3);
        assert!(matches!(malformed.error, LineError::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_align_corpus_skips_ignored_and_continues_after_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sw00")).unwrap();
        fs::create_dir_all(root.join("doc")).unwrap();
        fs::write(root.join("sw00/a.txt"), "qy\tA.1\tone\nny\tB.2\ttwo\n").unwrap();
        fs::write(root.join("sw00/b.txt"), "broken\nqy\tA.1\tx\nny\tB.2\ty\n").unwrap();
        fs::write(root.join("sw00/c.txt"), "sd\tA.1\tthree\nsv\tB.2\tfour\n").unwrap();
        fs::write(root.join("doc/d.txt"), "sd\tA.1\tskip\nsv\tB.2\tme\n").unwrap();
        fs::write(root.join("README"), "not a transcript\n").unwrap();

        let mut writer = PairWriter::new(Vec::new());
        let stats = align_corpus(root, &mut writer, &AlignConfig::default()).unwrap();
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();

        assert_eq!(stats.files, 3);
        assert_eq!(stats.files_aborted, 1);
        assert_eq!(stats.pairs, 2);
        assert_eq!(out, "qy\tone\tny\ttwo\nsd\tthree\tsv\tfour\n");
    }

    #[test]
    fn test_strict_mode_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "broken\n").unwrap();

        let config = AlignConfig {
            strict: true,
            ..Default::default()
        };
        let mut writer = PairWriter::new(Vec::new());
        let err = align_corpus(dir.path(), &mut writer, &config).unwrap_err();
        assert!(err.to_string().contains("Malformed line 1"));
    }
}
