use crate::error::PersistenceError;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Separator between turns, both on disk and in flattened prompts.
pub const TURN_SEPARATOR: &str = "\n\n";
pub const USER_MARKER: &str = "You: ";
pub const ASSISTANT_MARKER: &str = "AI: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl Speaker {
    pub fn marker(self) -> &'static str {
        match self {
            Speaker::User => USER_MARKER,
            Speaker::Assistant => ASSISTANT_MARKER,
        }
    }
}

/// One user prompt or one assistant response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.speaker.marker(), self.text)
    }
}

/// Joins turns with the blank-line separator, without a trailing separator.
pub fn format_turns(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(TURN_SEPARATOR)
}

/// Parses transcript text back into turns.
///
/// Fragments are split on blank lines, trimmed, and empty ones dropped. A
/// fragment without a speaker marker is a continuation of the preceding turn
/// (a paragraph break inside a reply). A leading unmarked fragment is
/// attributed to the assistant. A line starting with a marker inside a reply
/// still starts a new turn; the format has no escaping.
pub fn parse_transcript(content: &str) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::new();

    for fragment in content.split(TURN_SEPARATOR) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }

        if let Some((speaker, text)) = split_marker(fragment) {
            turns.push(Turn {
                speaker,
                text: text.to_string(),
            });
        } else if let Some(last) = turns.last_mut() {
            last.text.push_str(TURN_SEPARATOR);
            last.text.push_str(fragment);
        } else {
            turns.push(Turn::assistant(fragment));
        }
    }

    turns
}

/// Speaker and text of a fragment that starts with a marker. An empty turn
/// was written as the bare marker, whose trailing space the trim removed.
fn split_marker(fragment: &str) -> Option<(Speaker, &str)> {
    [Speaker::User, Speaker::Assistant]
        .into_iter()
        .find_map(|speaker| {
            let marker = speaker.marker();
            match fragment.strip_prefix(marker) {
                Some(text) => Some((speaker, text)),
                None if fragment == marker.trim_end() => Some((speaker, "")),
                None => None,
            }
        })
}

/// Per-model durable conversation log.
///
/// Each model has exactly one writer at a time (one session per model per
/// process), so implementations need no cross-process locking.
pub trait TranscriptStore: Send + Sync {
    /// Creates an empty backing file if absent.
    fn ensure_exists(&self, model_id: &str) -> Result<(), PersistenceError>;

    /// Reads all turns in append order. A missing transcript is empty.
    fn load(&self, model_id: &str) -> Result<Vec<Turn>, PersistenceError>;

    /// Appends the turns in a single write; prior content is never touched.
    fn append(&self, model_id: &str, turns: &[Turn]) -> Result<(), PersistenceError>;

    /// Truncates the transcript to zero bytes.
    fn clear(&self, model_id: &str) -> Result<(), PersistenceError>;

    /// Writes a new, never-overwritten snapshot file and returns its path.
    fn save_snapshot(&self, model_id: &str, turns: &[Turn]) -> Result<PathBuf, PersistenceError>;
}

/// Plain-text transcripts under a conversations root:
///
/// ```text
/// <root>/<model>.txt                         live transcript
/// <root>/<model>/<model>_<YYYYMMDD_HHMMSS>.txt  history snapshots
/// ```
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    root: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn transcript_path(&self, model_id: &str) -> PathBuf {
        self.root.join(format!("{}.txt", file_stem(model_id)))
    }

    pub fn history_dir(&self, model_id: &str) -> PathBuf {
        self.root.join(file_stem(model_id))
    }

    fn ensure_root(&self) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| PersistenceError::io("create directory", &self.root, e))
    }
}

impl TranscriptStore for FileTranscriptStore {
    fn ensure_exists(&self, model_id: &str) -> Result<(), PersistenceError> {
        self.ensure_root()?;
        let path = self.transcript_path(model_id);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map(|_| ())
            .map_err(|e| PersistenceError::io("create", path, e))
    }

    fn load(&self, model_id: &str) -> Result<Vec<Turn>, PersistenceError> {
        let path = self.transcript_path(model_id);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(parse_transcript(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(PersistenceError::io("read", path, e)),
        }
    }

    fn append(&self, model_id: &str, turns: &[Turn]) -> Result<(), PersistenceError> {
        if turns.is_empty() {
            return Ok(());
        }
        self.ensure_root()?;
        let path = self.transcript_path(model_id);

        let mut entry = String::new();
        for turn in turns {
            entry.push_str(&turn.to_string());
            entry.push_str(TURN_SEPARATOR);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| PersistenceError::io("open", &path, e))?;
        file.write_all(entry.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| PersistenceError::io("append to", &path, e))
    }

    fn clear(&self, model_id: &str) -> Result<(), PersistenceError> {
        let path = self.transcript_path(model_id);
        fs::write(&path, b"").map_err(|e| PersistenceError::io("clear", path, e))
    }

    fn save_snapshot(&self, model_id: &str, turns: &[Turn]) -> Result<PathBuf, PersistenceError> {
        let dir = self.history_dir(model_id);
        fs::create_dir_all(&dir).map_err(|e| PersistenceError::io("create directory", &dir, e))?;

        let stem = file_stem(model_id);
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut body = format_turns(turns);
        body.push_str(TURN_SEPARATOR);

        // Two snapshots within the same second get a numeric suffix.
        let mut attempt = 0u32;
        loop {
            let name = if attempt == 0 {
                format!("{stem}_{stamp}.txt")
            } else {
                format!("{stem}_{stamp}_{attempt}.txt")
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    write_or_remove(&path, file, body.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(PersistenceError::io("create snapshot", path, e)),
            }
        }
    }
}

/// Writes a freshly created snapshot; a failed write leaves no partial file.
fn write_or_remove(path: &Path, mut out: impl Write, body: &[u8]) -> Result<(), PersistenceError> {
    if let Err(e) = out.write_all(body).and_then(|_| out.flush()) {
        drop(out);
        let _ = fs::remove_file(path);
        return Err(PersistenceError::io("write snapshot", path, e));
    }
    Ok(())
}

/// Maps a model identifier such as `llama3.2:latest` to a portable file stem.
///
/// Percent-encoding keeps distinct identifiers on distinct files
/// (`a:b` is `a%3Ab`, `a_b` stays `a_b`).
pub fn file_stem(model_id: &str) -> String {
    if model_id.is_empty() {
        // Encoding never yields a lone `%`.
        return "%".to_string();
    }
    let stem = urlencoding::encode(model_id);

    // Never resolve to the root itself or its parent.
    if stem.chars().all(|c| c == '.') {
        stem.replace('.', "%2E")
    } else {
        stem.into_owned()
    }
}
