//! split orchestrator
//!
//! one pass over the source: fresh key, shamir-split key, one header per
//! shard, then the encrypted stream is either dealt out (every shard
//! required) or copied into every shard.
//!
//! a failure part way leaves whatever shards were already created on disk.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cipher::{generate_key, CipherReader};
use crate::config::SplitConfig;
use crate::header::{write_header, ShardHeader};
use crate::mux::{Broadcast, Demultiplexer};
use crate::sharing;
use crate::{Error, Result};

/// split `source` into shards inside `destination`, returning their paths
///
/// `destination` is created if missing. existing shards with the same names
/// are truncated.
pub fn split(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    config: &SplitConfig,
) -> Result<Vec<PathBuf>> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    let original_filename = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("source has no file name: {}", source.display()),
            )
        })?;
    let input = File::open(source)?;
    let timestamp = config.timestamp();

    let key = generate_key()?;
    let shares = sharing::split(
        &key[..],
        config.total() as usize,
        config.threshold() as usize,
    )?;

    prepare_destination(destination)?;

    let mut paths = Vec::with_capacity(shares.len());
    let mut writers = Vec::with_capacity(shares.len());
    for share in &shares {
        let header = ShardHeader {
            original_filename: original_filename.clone(),
            timestamp,
            index: share.index,
            total: config.total(),
            threshold: config.threshold(),
            key_fragment: share.fragment.clone(),
        };
        let path = destination.join(header.file_name());
        info!("creating {}", path.display());

        let mut writer = BufWriter::new(File::create(&path)?);
        write_header(&mut writer, &header)?;
        writers.push(writer);
        paths.push(path);
    }

    let mut reader = CipherReader::new(BufReader::new(input), &key[..])?;
    let (written, writers) = if config.all_required() {
        debug!("dealing payload across {} shards", writers.len());
        let mut demux = Demultiplexer::new(writers);
        let n = io::copy(&mut reader, &mut demux)?;
        demux.flush()?;
        (n, demux.into_inner())
    } else {
        debug!("copying payload into {} shards", writers.len());
        let mut fanout = Broadcast::new(writers);
        let n = io::copy(&mut reader, &mut fanout)?;
        fanout.flush()?;
        (n, fanout.into_inner())
    };

    for writer in writers {
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }

    info!(
        "split {} ({} bytes) into {} shards, {} required",
        original_filename,
        written,
        config.total(),
        config.threshold()
    );
    Ok(paths)
}

fn prepare_destination(destination: &Path) -> Result<()> {
    match fs::metadata(destination) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(destination.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(destination)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_header;
    use tempfile::tempdir;

    #[test]
    fn test_split_writes_named_shards() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        fs::write(&source, b"some secret notes").unwrap();

        let out = dir.path().join("shards");
        let config = SplitConfig::new(3, 2).unwrap().with_timestamp(1234);
        let paths = split(&source, &out, &config).unwrap();

        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["notes_1_of_3.horcrux", "notes_2_of_3.horcrux", "notes_3_of_3.horcrux"]
        );

        for (i, path) in paths.iter().enumerate() {
            let bytes = fs::read(path).unwrap();
            let (header, offset) = parse_header(bytes.as_slice(), path).unwrap();
            assert_eq!(header.index as usize, i + 1);
            assert_eq!(header.total, 3);
            assert_eq!(header.threshold, 2);
            assert_eq!(header.timestamp, 1234);
            assert_eq!(header.original_filename, "notes.txt");
            assert_eq!(header.key_fragment.len(), 32);
            // full encrypted copy in every shard, never the plaintext
            assert_eq!(bytes.len() - offset as usize, 17);
            assert_ne!(&bytes[offset as usize..], b"some secret notes");
        }
    }

    #[test]
    fn test_split_missing_source_creates_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("shards");
        let config = SplitConfig::new(3, 2).unwrap();

        let err = split(dir.path().join("absent"), &out, &config).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_split_rejects_file_destination() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.bin");
        fs::write(&source, [1u8, 2, 3]).unwrap();
        let config = SplitConfig::new(2, 2).unwrap();

        let err = split(&source, &source, &config).unwrap_err();
        assert!(matches!(err, Error::NotADirectory(_)));
    }
}
