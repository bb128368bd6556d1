use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::LineError;
use crate::models::DialogueActVocab;

/// Open a transcript for buffered line reading
pub fn open_transcript(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    Ok(BufReader::new(file))
}

/// Lines of a transcript read as raw bytes
///
/// Read errors end the stream; a line that is not valid UTF-8 is reported
/// on its own so the caller can skip it and keep going.
pub struct TranscriptLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Iterator for TranscriptLines<R> {
    type Item = std::io::Result<Result<String, LineError>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                let line = std::str::from_utf8(&self.buf)
                    .map(str::to_string)
                    .map_err(|e| LineError::InvalidUtf8 {
                        valid_up_to: e.valid_up_to(),
                    });
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Iterate the lines of `reader` without failing on bad encoding
pub fn transcript_lines<R: BufRead>(reader: R) -> TranscriptLines<R> {
    TranscriptLines {
        reader,
        buf: Vec::new(),
    }
}

/// Load a dialogue-act vocabulary file, one label per line
pub fn load_vocab_file(path: &Path) -> Result<DialogueActVocab> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    Ok(DialogueActVocab::parse(&content))
}

/// Directory entries sorted by file name
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {:?}", dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list directory: {:?}", dir))?;
    entries.sort();
    Ok(entries)
}

/// Recursively list every file under `root` in sorted order, skipping any
/// path (file or directory) whose path relative to `root` is in `ignore`
pub fn walk_corpus(root: &Path, ignore: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_dir(root, root, ignore, &mut files)?;
    Ok(files)
}

fn walk_dir(root: &Path, dir: &Path, ignore: &[PathBuf], files: &mut Vec<PathBuf>) -> Result<()> {
    for path in sorted_entries(dir)? {
        let relative = path.strip_prefix(root).unwrap_or(&path);
        if ignore.iter().any(|i| i == relative) {
            debug!("Skipping ignored path {:?}", path);
            continue;
        }
        if path.is_dir() {
            walk_dir(root, &path, ignore, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// List `root/<group>/<file>` transcripts whose file name contains `marker`
///
/// Only the two-level layout of the dialogue-act release is scanned; files
/// directly under `root` and deeper nesting are ignored.
pub fn list_utt_files(root: &Path, marker: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for group in sorted_entries(root)? {
        if !group.is_dir() {
            debug!("Skipping non-directory {:?}", group);
            continue;
        }
        for path in sorted_entries(&group)? {
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(marker));
            if matches && path.is_file() {
                files.push(path);
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_walk_corpus_sorted_and_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("sw01/b.txt"));
        touch(&root.join("sw01/a.txt"));
        touch(&root.join("doc/notes.txt"));
        touch(&root.join("README"));
        touch(&root.join("sw00/c.txt"));

        let ignore = vec![PathBuf::from("doc"), PathBuf::from("README")];
        let files = walk_corpus(root, &ignore).unwrap();

        assert_eq!(
            files,
            vec![
                root.join("sw00/c.txt"),
                root.join("sw01/a.txt"),
                root.join("sw01/b.txt"),
            ]
        );
    }

    #[test]
    fn test_list_utt_files_two_levels() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("sw00utt/sw_0001_4325.utt"));
        touch(&root.join("sw00utt/sw_0002_4330.utt"));
        touch(&root.join("sw00utt/notes.txt"));
        touch(&root.join("top.utt"));
        touch(&root.join("sw01utt/deeper/sw_0100_1.utt"));

        let files = list_utt_files(root, ".utt").unwrap();

        assert_eq!(
            files,
            vec![
                root.join("sw00utt/sw_0001_4325.utt"),
                root.join("sw00utt/sw_0002_4330.utt"),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_utt_files(&dir.path().join("absent"), ".utt").is_err());
        assert!(walk_corpus(&dir.path().join("absent"), &[]).is_err());
    }

    #[test]
    fn test_transcript_lines_report_bad_encoding_per_line() {
        let input: &[u8] = b"sv A.1 utt1 hello\r\nsd A.1 utt2 caf\xe9 time\nqy B.1 utt1 ok?";
        let lines: Vec<_> = transcript_lines(input).map(|l| l.unwrap()).collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], Ok("sv A.1 utt1 hello".to_string()));
        assert_eq!(lines[1], Err(LineError::InvalidUtf8 { valid_up_to: 15 }));
        assert_eq!(lines[2], Ok("qy B.1 utt1 ok?".to_string()));
    }

    #[test]
    fn test_load_vocab_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        fs::write(&path, "sv\nsd\n").unwrap();

        let vocab = load_vocab_file(&path).unwrap();
        assert!(vocab.contains("sv"));
        assert!(vocab.contains("sd"));
        assert!(!vocab.contains("qy"));
    }
}
