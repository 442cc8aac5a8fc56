//! Capture identifiers and input batches
//!
//! An input batch is one file of whitespace-separated capture ids. Each id is
//! sorted into face, person or invalid by its length and a fixed type marker.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Length of a well-formed capture id
pub const ID_LENGTH: usize = 48;

/// Byte range holding the capture type marker
const TYPE_MARKER: std::ops::Range<usize> = 41..43;

/// Marker value identifying a face capture
const FACE_MARKER: &[u8] = b"06";

/// Capture id type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdType {
    Face,
    Person,
    Invalid,
}

/// Classify a capture id. Total: malformed input is `Invalid`, never an error.
pub fn classify(id: &str) -> IdType {
    let id = id.trim();
    if id.len() != ID_LENGTH {
        return IdType::Invalid;
    }
    if &id.as_bytes()[TYPE_MARKER] == FACE_MARKER {
        IdType::Face
    } else {
        IdType::Person
    }
}

/// Batch source errors
#[derive(Debug, Error)]
pub enum BatchError {
    /// Input directory does not exist or is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Input directory could not be listed
    #[error("Cannot list {0}: {1}")]
    List(PathBuf, #[source] walkdir::Error),

    /// Batch file could not be read
    #[error("Read error {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
}

/// One input unit, partitioned by id type.
///
/// Lists keep input order and duplicates, so the three partitions always add
/// up to the number of tokens read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub name: String,
    pub face_ids: Vec<String>,
    pub person_ids: Vec<String>,
    pub invalid_ids: Vec<String>,
}

impl Batch {
    /// Build a batch from raw text
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self::from_bytes(name, text.as_bytes())
    }

    /// Build a batch from raw file content.
    ///
    /// Tokens that are not valid UTF-8 are kept, lossily decoded, as invalid ids.
    pub fn from_bytes(name: impl Into<String>, content: &[u8]) -> Self {
        let mut batch = Batch {
            name: name.into(),
            ..Default::default()
        };
        let tokens = content
            .split(|b| b.is_ascii_whitespace())
            .filter(|token| !token.is_empty());
        for raw in tokens {
            match std::str::from_utf8(raw) {
                Ok(text) => {
                    for token in text.split_whitespace() {
                        batch.push(token.to_string());
                    }
                }
                Err(_) => batch
                    .invalid_ids
                    .push(String::from_utf8_lossy(raw).into_owned()),
            }
        }
        batch
    }

    fn push(&mut self, token: String) {
        match classify(&token) {
            IdType::Face => self.face_ids.push(token),
            IdType::Person => self.person_ids.push(token),
            IdType::Invalid => self.invalid_ids.push(token),
        }
    }

    /// Total number of ids read
    pub fn len(&self) -> usize {
        self.face_ids.len() + self.person_ids.len() + self.invalid_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read one batch file; the file name becomes the batch name
pub fn read_batch_file(path: &Path) -> Result<Batch, BatchError> {
    let content = fs::read(path).map_err(|e| BatchError::Read(path.to_path_buf(), e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let batch = Batch::from_bytes(name, &content);
    debug!(
        "Read batch {}: {} face, {} person, {} invalid",
        batch.name,
        batch.face_ids.len(),
        batch.person_ids.len(),
        batch.invalid_ids.len()
    );
    Ok(batch)
}

/// Read every regular file directly inside `dir`, sorted by file name.
///
/// Subdirectories (including the report output directory) and symlinks are
/// skipped. A file that cannot be read is logged and skipped; an unreadable
/// directory is an error.
pub fn read_batch_dir(dir: &Path) -> Result<Vec<Batch>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::NotADirectory(dir.to_path_buf()));
    }

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            Err(e) if e.depth() == 0 => return Err(BatchError::List(dir.to_path_buf(), e)),
            Err(e) => warn!("Error accessing entry in {}: {}", dir.display(), e),
        }
    }

    let batches = read_batch_files(files);
    info!("Found {} batch file(s) in {}", batches.len(), dir.display());
    Ok(batches)
}

fn read_batch_files(files: Vec<PathBuf>) -> Vec<Batch> {
    let mut batches = Vec::with_capacity(files.len());
    for path in files {
        match read_batch_file(&path) {
            Ok(batch) => batches.push(batch),
            Err(e) => warn!("Skipping batch file: {}", e),
        }
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Build a 48-char id with the given two-character type marker
    fn make_id(prefix: &str, marker: &str) -> String {
        let mut id = format!("{:0<41}", prefix);
        id.push_str(marker);
        id.push_str("00001");
        assert_eq!(id.len(), ID_LENGTH);
        id
    }

    #[test]
    fn test_face_marker() {
        assert_eq!(classify(&make_id("3301", "06")), IdType::Face);
    }

    #[test]
    fn test_other_marker_is_person() {
        assert_eq!(classify(&make_id("3301", "08")), IdType::Person);
        assert_eq!(classify(&make_id("3301", "60")), IdType::Person);
    }

    #[test]
    fn test_wrong_length_is_invalid() {
        assert_eq!(classify(""), IdType::Invalid);
        assert_eq!(classify("06"), IdType::Invalid);
        let mut long = make_id("3301", "06");
        long.push('0');
        assert_eq!(classify(&long), IdType::Invalid);
        let short = &make_id("3301", "06")[..47];
        assert_eq!(classify(short), IdType::Invalid);
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let id = format!("  {}\t", make_id("3301", "06"));
        assert_eq!(classify(&id), IdType::Face);
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        // 16 three-byte chars = 48 bytes; marker bytes are not "06"
        let id = "档".repeat(16);
        assert_eq!(id.len(), ID_LENGTH);
        assert_eq!(classify(&id), IdType::Person);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let id = make_id("1", "06");
        assert_eq!(classify(&id), classify(&id));
    }

    #[test]
    fn test_batch_partition_counts_every_token() {
        let face = make_id("1", "06");
        let person = make_id("2", "08");
        let text = format!("{face}\n{person} bogus\n\n{face}\r\n  tooshort");
        let batch = Batch::from_text("batch-a", &text);

        assert_eq!(batch.name, "batch-a");
        assert_eq!(batch.face_ids, vec![face.clone(), face]);
        assert_eq!(batch.person_ids, vec![person]);
        assert_eq!(batch.invalid_ids, vec!["bogus".to_string(), "tooshort".to_string()]);
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn test_empty_batch() {
        let batch = Batch::from_text("empty", " \n\t ");
        assert!(batch.is_empty());
    }

    #[test]
    fn test_read_batch_dir_sorted_and_skips_subdirs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), make_id("1", "06")).unwrap();
        std::fs::write(dir.path().join("a.txt"), make_id("2", "08")).unwrap();
        std::fs::create_dir(dir.path().join("result")).unwrap();
        std::fs::write(dir.path().join("result").join("old"), "x").unwrap();

        let batches = read_batch_dir(dir.path()).unwrap();
        let names: Vec<&str> = batches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(batches[0].person_ids.len(), 1);
        assert_eq!(batches[1].face_ids.len(), 1);
    }

    #[test]
    fn test_read_batch_dir_missing() {
        let dir = TempDir::new().unwrap();
        let result = read_batch_dir(&dir.path().join("missing"));
        assert!(matches!(result, Err(BatchError::NotADirectory(_))));
    }

    #[test]
    fn test_non_utf8_token_is_invalid_not_fatal() {
        let face = make_id("1", "06");
        let mut content = face.clone().into_bytes();
        // "你好" in GBK
        content.extend_from_slice(b"\n\xc4\xe3\xba\xc3\n");

        let batch = Batch::from_bytes("gbk", &content);
        assert_eq!(batch.face_ids, vec![face]);
        assert_eq!(batch.invalid_ids.len(), 1);
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_read_batch_dir_keeps_file_with_non_utf8_bytes() {
        let dir = TempDir::new().unwrap();
        let mut content = make_id("1", "06").into_bytes();
        content.extend_from_slice(b"\n\xc4\xe3\xba\xc3\n");
        std::fs::write(dir.path().join("walk-gbk"), content).unwrap();
        std::fs::write(dir.path().join("walk-ok"), make_id("2", "08")).unwrap();

        let batches = read_batch_dir(dir.path()).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].name, "walk-gbk");
        assert_eq!(batches[0].face_ids.len(), 1);
        assert_eq!(batches[0].invalid_ids.len(), 1);
        assert_eq!(batches[1].person_ids.len(), 1);
    }

    #[test]
    fn test_unreadable_file_skipped_others_kept() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("walk-1");
        std::fs::write(&good, make_id("1", "06")).unwrap();
        let gone = dir.path().join("walk-0");

        assert!(matches!(read_batch_file(&gone), Err(BatchError::Read(_, _))));
        let batches = read_batch_files(vec![gone, good]);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].name, "walk-1");
    }

    #[test]
    fn test_unicode_whitespace_still_separates_ids() {
        let face = make_id("1", "06");
        let person = make_id("2", "08");
        let text = format!("{}\u{3000}{}", face, person);
        let batch = Batch::from_text("wide-space", &text);
        assert_eq!(batch.face_ids, vec![face]);
        assert_eq!(batch.person_ids, vec![person]);
    }

    #[cfg(unix)]
    #[test]
    fn test_read_batch_dir_skips_symlinks() {
        let dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("ids");
        std::fs::write(&target, make_id("1", "06")).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();
        std::fs::write(dir.path().join("real"), make_id("2", "06")).unwrap();

        let batches = read_batch_dir(dir.path()).unwrap();
        let names: Vec<&str> = batches.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["real"]);
    }
}
