//! shard file codec
//!
//! a shard is a human-readable banner, a `-- HEADER --` marker, one json
//! header line, a `-- BODY --` marker, and then raw body bytes with no
//! framing at all. the parser is line oriented only up to and including the
//! body marker; everything after the returned offset is binary.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sharing::Share;
use crate::{Error, Result};

pub const HEADER_MARKER: &str = "-- HEADER --";
pub const BODY_MARKER: &str = "-- BODY --";

/// extension of shard files
pub const SHARD_EXTENSION: &str = "horcrux";

/// metadata stored at the top of every shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardHeader {
    /// file name of the source, without directories
    pub original_filename: String,
    /// unix seconds at split start, identifies one split
    pub timestamp: i64,
    /// 1-indexed position of this shard
    pub index: u8,
    /// number of shards produced by the split
    pub total: u8,
    /// number of shards needed to bind
    pub threshold: u8,
    /// this shard's share of the file key
    #[serde(with = "base64_bytes")]
    pub key_fragment: Vec<u8>,
}

impl ShardHeader {
    pub fn share(&self) -> Share {
        Share::new(self.index, self.key_fragment.clone())
    }

    /// true when both headers come from the same split
    pub fn same_split(&self, other: &ShardHeader) -> bool {
        self.original_filename == other.original_filename
            && self.timestamp == other.timestamp
            && self.total == other.total
            && self.threshold == other.threshold
    }

    /// `<stem>_<index>_of_<total>.horcrux`
    pub fn file_name(&self) -> String {
        let stem = Path::new(&self.original_filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}_{}_of_{}.{}", stem, self.index, self.total, SHARD_EXTENSION)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        // a bare file name; anything else could steer bind outside its directory
        let name = Path::new(&self.original_filename);
        if name.file_name() != Some(name.as_os_str()) {
            return Err(format!(
                "original filename {:?} is not a plain file name",
                self.original_filename
            ));
        }
        if self.threshold < 2 || self.threshold > self.total {
            return Err(format!(
                "threshold {} out of range for total {}",
                self.threshold, self.total
            ));
        }
        if self.index == 0 || self.index > self.total {
            return Err(format!("index {} out of range for total {}", self.index, self.total));
        }
        if self.key_fragment.is_empty() {
            return Err("empty key fragment".into());
        }
        Ok(())
    }
}

fn banner(index: u8, total: u8) -> String {
    format!(
        "# THIS FILE IS A HORCRUX.\n\
         # IT IS ONE OF {total} HORCRUXES THAT EACH CONTAIN PART OF AN ORIGINAL FILE.\n\
         # THIS IS HORCRUX NUMBER {index}.\n\
         # IN ORDER TO RESURRECT THIS ORIGINAL FILE YOU MUST FIND THE OTHER {others} HORCRUX(ES) AND THEN BIND THEM.\n",
        total = total,
        index = index,
        others = total.saturating_sub(1),
    )
}

/// write banner, markers and header line; the body follows directly
pub fn write_header<W: Write>(mut writer: W, header: &ShardHeader) -> Result<()> {
    let json = serde_json::to_string(header)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    write!(
        writer,
        "{}\n{}\n{}\n{}\n",
        banner(header.index, header.total),
        HEADER_MARKER,
        json,
        BODY_MARKER
    )?;
    Ok(())
}

fn trim_line(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// read one line including its terminator; `None` at eof
fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<usize>> {
    buf.clear();
    match reader.read_until(b'\n', buf)? {
        0 => Ok(None),
        n => Ok(Some(n)),
    }
}

/// parse the header from the start of a shard
///
/// returns the header and the offset of the first body byte. `origin` only
/// labels errors. the reader is left somewhere past the body marker, callers
/// must seek to the returned offset before reading the body.
pub fn parse_header<R: BufRead>(mut reader: R, origin: &Path) -> Result<(ShardHeader, u64)> {
    let malformed = |reason: &str| Error::malformed(origin, reason);
    let mut buf = Vec::new();
    let mut offset = 0u64;

    // banner
    loop {
        let n = next_line(&mut reader, &mut buf)?
            .ok_or_else(|| malformed("missing header marker"))?;
        offset += n as u64;
        if trim_line(&buf) == HEADER_MARKER.as_bytes() {
            break;
        }
    }

    let n = next_line(&mut reader, &mut buf)?.ok_or_else(|| malformed("missing header line"))?;
    offset += n as u64;
    let header: ShardHeader = serde_json::from_slice(trim_line(&buf))
        .map_err(|e| malformed(&format!("undecodable header: {}", e)))?;
    header.validate().map_err(|reason| malformed(&reason))?;

    loop {
        let n = next_line(&mut reader, &mut buf)?
            .ok_or_else(|| malformed("missing body marker"))?;
        offset += n as u64;
        let line = trim_line(&buf);
        if line == BODY_MARKER.as_bytes() {
            break;
        }
        if !line.is_empty() {
            return Err(malformed("unexpected content between header and body marker"));
        }
    }

    Ok((header, offset))
}

/// where a shard lives and what its header says
#[derive(Debug, Clone)]
pub struct ShardInfo {
    pub path: PathBuf,
    pub header: ShardHeader,
    pub body_offset: u64,
}

/// serde helper storing bytes as standard base64
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
