//! Git-LFS pointer detection
//!
//! A pointer file is the small text stub git keeps in place of an LFS
//! object when smudging is disabled:
//!
//! ```text
//! version https://git-lfs.github.com/spec/v1
//! oid sha256:4d7a214614ab2935c943f9e0ff69d22eadbb8f32b1258daaa5e2ca24d17e2393
//! size 12345
//! ```
//!
//! Only the leading bytes of a file are inspected. A stub that carries the
//! version line but lacks a well-formed `oid` or `size` line is still a
//! pointer; the missing field is reported as absent rather than rejected.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Number of leading bytes read from each file
pub const DETECT_LIMIT: u64 = 4096;

/// Version line prefix identifying an LFS pointer
pub const LFS_SIGNATURE: &str = "version https://git-lfs.github.com/spec/";

const OID_PREFIX: &str = "oid sha256:";
const SIZE_PREFIX: &str = "size ";

/// Classification of a single working-copy file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileClass {
    /// An LFS pointer stub; fields are absent when the stub is malformed
    Lfs {
        oid: Option<String>,
        size: Option<u64>,
    },
    /// An ordinary blob with its on-disk size
    Plain { size: u64 },
}

impl FileClass {
    pub fn is_lfs(&self) -> bool {
        matches!(self, FileClass::Lfs { .. })
    }

    pub fn oid(&self) -> Option<&str> {
        match self {
            FileClass::Lfs { oid, .. } => oid.as_deref(),
            FileClass::Plain { .. } => None,
        }
    }

    /// Logical size: the pointer's declared size or the on-disk size
    pub fn size(&self) -> Option<u64> {
        match self {
            FileClass::Lfs { size, .. } => *size,
            FileClass::Plain { size } => Some(*size),
        }
    }
}

/// Classify the file at `path`.
///
/// Reads at most [`DETECT_LIMIT`] bytes; the handle is closed before
/// returning.
pub fn detect(path: &Path) -> io::Result<FileClass> {
    let mut buffer = Vec::with_capacity(DETECT_LIMIT as usize);
    let on_disk_len = {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        file.take(DETECT_LIMIT).read_to_end(&mut buffer)?;
        len
    };
    Ok(classify(&buffer, on_disk_len))
}

/// Classify already-read leading bytes of a file.
pub fn classify(head: &[u8], on_disk_len: u64) -> FileClass {
    let text = String::from_utf8_lossy(head);

    if !contains_ignore_ascii_case(&text, LFS_SIGNATURE) {
        return FileClass::Plain { size: on_disk_len };
    }

    let mut oid = None;
    let mut size = None;

    for line in text.lines() {
        let line = line.trim();
        if oid.is_none() {
            if let Some(rest) = strip_prefix_ignore_ascii_case(line, OID_PREFIX) {
                let hash: String = rest
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                if !hash.is_empty() {
                    oid = Some(hash);
                }
                continue;
            }
        }
        if size.is_none() {
            if let Some(rest) = strip_prefix_ignore_ascii_case(line, SIZE_PREFIX) {
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                size = digits.parse::<u64>().ok();
            }
        }
    }

    FileClass::Lfs { oid, size }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

fn strip_prefix_ignore_ascii_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}
