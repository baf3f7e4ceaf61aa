//! bind orchestrator
//!
//! collects shards of one split, recovers the file key from their fragments
//! and decrypts the payload into a destination file. when every shard is
//! required the bodies are re-interleaved in ascending index order,
//! otherwise any single body holds the whole payload.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cipher::CipherReader;
use crate::header::{parse_header, ShardHeader, ShardInfo, SHARD_EXTENSION};
use crate::mux::Multiplexer;
use crate::sharing::{self, Share};
use crate::{Error, Result};

/// a shard with its body cursor positioned at the first body byte
#[derive(Debug)]
struct OpenShard {
    info: ShardInfo,
    file: File,
}

impl OpenShard {
    fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let (header, body_offset) = parse_header(BufReader::new(&mut file), path)?;
        file.seek(SeekFrom::Start(body_offset))?;
        Ok(Self {
            info: ShardInfo {
                path: path.to_path_buf(),
                header,
                body_offset,
            },
            file,
        })
    }

    fn header(&self) -> &ShardHeader {
        &self.info.header
    }
}

/// validated shards of a single split, ready to bind
#[derive(Debug)]
pub struct ShareSet {
    shards: Vec<OpenShard>,
}

impl ShareSet {
    /// open and validate candidate shard files
    ///
    /// duplicate indices are skipped. fails when shards disagree about which
    /// split they came from, or when fewer than the threshold remain.
    pub fn open<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut shards: Vec<OpenShard> = Vec::new();

        for path in paths {
            let shard = OpenShard::open(path.as_ref())?;

            if let Some(first) = shards.first() {
                if !first.header().same_split(shard.header()) {
                    return Err(Error::InconsistentShards {
                        first: first.info.path.clone(),
                        other: shard.info.path,
                    });
                }
            }

            if shards.iter().any(|s| s.header().index == shard.header().index) {
                debug!(
                    "skipping {}: shard {} already collected",
                    shard.info.path.display(),
                    shard.header().index
                );
                continue;
            }

            debug!("collected shard {} from {}", shard.header().index, shard.info.path.display());
            shards.push(shard);
        }

        let first = shards.first().ok_or(Error::NoShards)?;
        let required = first.header().threshold as usize;
        if shards.len() < required {
            return Err(Error::NotEnoughShards {
                required,
                available: shards.len(),
            });
        }

        Ok(Self { shards })
    }

    /// header of the first collected shard; all agree on split metadata
    pub fn header(&self) -> &ShardHeader {
        self.shards[0].header()
    }

    pub fn original_filename(&self) -> &str {
        &self.header().original_filename
    }

    pub fn shards(&self) -> impl Iterator<Item = &ShardInfo> {
        self.shards.iter().map(|s| &s.info)
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// decrypt the original file into `destination`, returning bytes written
    ///
    /// an existing destination is only replaced when `overwrite` is set.
    pub fn recover_to(self, destination: impl AsRef<Path>, overwrite: bool) -> Result<u64> {
        let destination = destination.as_ref();
        let header = self.header().clone();

        let shares: Vec<Share> = self.shards.iter().map(|s| s.header().share()).collect();
        let key = sharing::combine(&shares)?;

        if header.threshold == header.total {
            debug!("re-interleaving {} shard bodies", self.shards.len());
            let indexed = self
                .shards
                .into_iter()
                .map(|s| (s.info.header.index, BufReader::new(s.file)))
                .collect();
            let body = Multiplexer::from_indexed(indexed, header.total)?;
            decrypt_into(body, &key, destination, overwrite)
        } else {
            // every shard carries the full payload
            let shard = self
                .shards
                .into_iter()
                .next()
                .ok_or(Error::NoShards)?;
            debug!("reading payload from {}", shard.info.path.display());
            decrypt_into(BufReader::new(shard.file), &key, destination, overwrite)
        }
    }
}

fn decrypt_into<R: Read>(body: R, key: &[u8], destination: &Path, overwrite: bool) -> Result<u64> {
    let mut reader = CipherReader::new(body, key)?;
    let mut writer = BufWriter::new(open_destination(destination, overwrite)?);

    let written = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

    info!("restored {} ({} bytes)", destination.display(), written);
    Ok(written)
}

fn open_destination(destination: &Path, overwrite: bool) -> Result<File> {
    if overwrite {
        if destination.exists() {
            warn!("overwriting {}", destination.display());
        }
        return Ok(File::create(destination)?);
    }

    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::AlreadyExists(destination.to_path_buf()),
            _ => Error::Io(e),
        })
}

/// reconstruct the original file from `shard_paths` into `destination`
pub fn bind<I, P>(shard_paths: I, destination: impl AsRef<Path>, overwrite: bool) -> Result<()>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    ShareSet::open(shard_paths)?.recover_to(destination, overwrite)?;
    Ok(())
}

/// `*.horcrux` files directly inside `dir`, sorted by path
pub fn find_shards(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_shard = path.extension().map_or(false, |ext| ext == SHARD_EXTENSION);
        if is_shard && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
