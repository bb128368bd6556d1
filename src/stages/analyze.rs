use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::io::{list_utt_files, open_transcript, transcript_lines};
use crate::models::{DialogueActVocab, Speaker, TranscriptLine};

/// How often a dialogue-act label occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
    pub in_vocab: bool,
}

/// Summary of a corpus scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorpusAnalysis {
    pub files: usize,
    pub lines: usize,
    pub parsed_lines: usize,
    pub irregular_lines: usize,
    pub parse_failures: usize,
    pub disfluent_lines: usize,
    pub speaker_a_lines: usize,
    pub speaker_b_lines: usize,
    /// Parsed lines whose label is outside the vocabulary
    pub out_of_vocab_lines: usize,
    /// Sorted by count descending, then label
    pub labels: Vec<LabelCount>,
}

/// Accumulates counts over one or more transcripts
#[derive(Debug, Default)]
struct Tally {
    analysis: CorpusAnalysis,
    labels: HashMap<String, usize>,
}

impl Tally {
    fn scan<R: BufRead>(&mut self, reader: R, vocab: &DialogueActVocab) -> Result<()> {
        self.analysis.files += 1;

        for line in transcript_lines(reader) {
            let line = line.context("Failed to read line")?;
            self.analysis.lines += 1;

            match line.and_then(|l| TranscriptLine::parse(&l)) {
                Ok(parsed) => {
                    self.analysis.parsed_lines += 1;
                    if parsed.disfluent {
                        self.analysis.disfluent_lines += 1;
                    }
                    match parsed.speaker {
                        Speaker::A => self.analysis.speaker_a_lines += 1,
                        Speaker::B => self.analysis.speaker_b_lines += 1,
                    }
                    if !vocab.contains(&parsed.label) {
                        self.analysis.out_of_vocab_lines += 1;
                    }
                    *self.labels.entry(parsed.label).or_insert(0) += 1;
                }
                Err(e) if e.is_irregular() => self.analysis.irregular_lines += 1,
                Err(_) => self.analysis.parse_failures += 1,
            }
        }

        Ok(())
    }

    fn finish(mut self, vocab: &DialogueActVocab) -> CorpusAnalysis {
        let mut labels: Vec<LabelCount> = self
            .labels
            .into_iter()
            .map(|(label, count)| LabelCount {
                in_vocab: vocab.contains(&label),
                label,
                count,
            })
            .collect();
        labels.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
        self.analysis.labels = labels;
        self.analysis
    }
}

/// Analyze a single transcript stream
pub fn analyze_reader<R: BufRead>(reader: R, vocab: &DialogueActVocab) -> Result<CorpusAnalysis> {
    let mut tally = Tally::default();
    tally.scan(reader, vocab)?;
    Ok(tally.finish(vocab))
}

/// Scan every transcript in a dialogue-act corpus without writing output
pub fn analyze_corpus(
    root: &Path,
    vocab: &DialogueActVocab,
    file_marker: &str,
) -> Result<CorpusAnalysis> {
    let files = list_utt_files(root, file_marker)?;
    info!("Analyzing {} transcripts under {:?}", files.len(), root);

    let mut tally = Tally::default();
    for path in &files {
        debug!("Scanning {:?}", path);
        let reader = open_transcript(path)?;
        tally
            .scan(reader, vocab)
            .with_context(|| format!("Failed to scan {:?}", path))?;
    }

    Ok(tally.finish(vocab))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_reader() {
        let input = "FILENAME:\t4325_1632_1519\n\
                     sv A.1 utt1 hello there\n\
                     sv A.1 utt2 how are you\n\
                     b@ B.2 utt1 uh-huh\n\
                     xx B.2 utt2 something\n\
                     sd A1 utt1 broken\n";
        let analysis = analyze_reader(input.as_bytes(), &DialogueActVocab::default()).unwrap();

        assert_eq!(analysis.files, 1);
        assert_eq!(analysis.lines, 6);
        assert_eq!(analysis.parsed_lines, 4);
        assert_eq!(analysis.irregular_lines, 1);
        assert_eq!(analysis.parse_failures, 1);
        assert_eq!(analysis.disfluent_lines, 1);
        assert_eq!(analysis.speaker_a_lines, 2);
        assert_eq!(analysis.speaker_b_lines, 2);
        assert_eq!(analysis.out_of_vocab_lines, 2);
        assert_eq!(
            analysis.labels,
            vec![
                LabelCount {
                    label: "sv".to_string(),
                    count: 2,
                    in_vocab: true
                },
                LabelCount {
                    label: "b@".to_string(),
                    count: 1,
                    in_vocab: false
                },
                LabelCount {
                    label: "xx".to_string(),
                    count: 1,
                    in_vocab: false
                },
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_counts_as_parse_failure() {
        let input: &[u8] = b"sv A.1 utt1 hello there\nsd A.1 utt2 na\xefve\nqy B.1 utt1 really?\n";
        let analysis = analyze_reader(input, &DialogueActVocab::default()).unwrap();

        assert_eq!(analysis.lines, 3);
        assert_eq!(analysis.parsed_lines, 2);
        assert_eq!(analysis.parse_failures, 1);
    }

    #[test]
    fn test_analyze_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let group = dir.path().join("sw00utt");
        std::fs::create_dir_all(&group).unwrap();
        std::fs::write(group.join("a.utt"), "qy A.1 utt1 do you\n").unwrap();
        std::fs::write(group.join("b.utt"), "ny B.1 utt1 yes i do\n").unwrap();

        let analysis =
            analyze_corpus(dir.path(), &DialogueActVocab::default(), ".utt").unwrap();
        assert_eq!(analysis.files, 2);
        assert_eq!(analysis.parsed_lines, 2);
        assert_eq!(analysis.labels.len(), 2);
        assert_eq!(analysis.labels[0].label, "ny");
    }
}
