pub mod error;
pub mod io;
pub mod models;
pub mod stages;

pub use error::{Irregularity, LineError};
pub use io::{
    create_output, list_utt_files, load_vocab_file, open_append, transcript_lines, walk_corpus,
    PairWriter, RowSink, RowWriter, RunReport,
};
pub use models::{
    AlignedPair, ConversationState, DialogueActVocab, NormalizedRow, Speaker, TabbedLine,
    TranscriptLine, Turn,
};
pub use stages::{
    align_corpus, analyze_corpus, execute_pairs, normalize_corpus, AlignConfig, NormalizeConfig,
    PairCollector, PairsConfig,
};
