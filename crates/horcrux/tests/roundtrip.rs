//! end-to-end split/bind over real files

use std::fs;
use std::path::{Path, PathBuf};

use horcrux::header::parse_header;
use horcrux::{bind, find_shards, split, Error, ErrorKind, ShareSet, SplitConfig};
use proptest::prelude::*;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use tempfile::{tempdir, TempDir};

fn random_content(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    ChaCha20Rng::seed_from_u64(seed).fill_bytes(&mut data);
    data
}

fn split_file(dir: &TempDir, name: &str, content: &[u8], total: usize, threshold: usize) -> Vec<PathBuf> {
    let source = dir.path().join(name);
    fs::write(&source, content).unwrap();
    let config = SplitConfig::new(total, threshold).unwrap();
    split(&source, dir.path().join("shards"), &config).unwrap()
}

fn body_len(path: &Path) -> usize {
    let bytes = fs::read(path).unwrap();
    let (_, offset) = parse_header(bytes.as_slice(), path).unwrap();
    bytes.len() - offset as usize
}

fn subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k == 0 {
        return vec![vec![]];
    }
    if n < k {
        return vec![];
    }
    let mut out = subsets(n - 1, k);
    for mut s in subsets(n - 1, k - 1) {
        s.push(n - 1);
        out.push(s);
    }
    out
}

#[test]
fn every_three_of_five_subset_binds() {
    let dir = tempdir().unwrap();
    let content = random_content(10_000, 1);
    let expected = Sha256::digest(&content);
    let paths = split_file(&dir, "payload.bin", &content, 5, 3);
    assert_eq!(paths.len(), 5);

    for (n, subset) in subsets(5, 3).into_iter().enumerate() {
        let picked: Vec<&PathBuf> = subset.iter().map(|&i| &paths[i]).collect();
        let out = dir.path().join(format!("restored_{}", n));
        bind(picked, &out, false).unwrap();
        assert_eq!(Sha256::digest(fs::read(&out).unwrap()), expected, "subset {:?}", subset);
    }
}

#[test]
fn partial_threshold_shards_hold_full_payload() {
    let dir = tempdir().unwrap();
    let content = random_content(10_000, 2);
    let paths = split_file(&dir, "payload.bin", &content, 5, 3);

    for path in &paths {
        assert_eq!(body_len(path), content.len());
    }
}

#[test]
fn all_required_shards_split_payload_without_duplication() {
    let dir = tempdir().unwrap();
    let content = random_content(10_000, 3);
    let paths = split_file(&dir, "payload.bin", &content, 4, 4);

    let sizes: Vec<usize> = paths.iter().map(|p| body_len(p)).collect();
    assert_eq!(sizes.iter().sum::<usize>(), content.len());
    for size in &sizes {
        assert!(size.abs_diff(content.len() / 4) <= 100, "sizes {:?}", sizes);
    }

    let out = dir.path().join("restored");
    bind(&paths, &out, false).unwrap();
    assert_eq!(fs::read(&out).unwrap(), content);

    for skip in 0..4 {
        let rest: Vec<&PathBuf> = paths.iter().enumerate().filter(|(i, _)| *i != skip).map(|(_, p)| p).collect();
        let err = bind(rest, dir.path().join(format!("fail_{}", skip)), false).unwrap_err();
        assert!(
            matches!(err, Error::NotEnoughShards { required: 4, available: 3 }),
            "{:?}",
            err
        );
    }
}

#[test]
fn too_few_shards_names_counts() {
    let dir = tempdir().unwrap();
    let paths = split_file(&dir, "payload.bin", &random_content(500, 4), 5, 3);

    let err = bind(&paths[..2], dir.path().join("out"), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("3 required, 2 available"), "{}", err);
}

#[test]
fn shards_from_different_splits_are_rejected() {
    let dir = tempdir().unwrap();
    let content = random_content(400, 5);

    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();
    let source = dir.path().join("same.bin");
    fs::write(&source, &content).unwrap();

    let first = split(&source, &a, &SplitConfig::new(3, 2).unwrap().with_timestamp(100)).unwrap();
    let second = split(&source, &b, &SplitConfig::new(3, 2).unwrap().with_timestamp(200)).unwrap();

    let err = bind([&first[0], &second[1]], dir.path().join("out"), false).unwrap_err();
    assert!(matches!(err, Error::InconsistentShards { .. }), "{:?}", err);

    // different source name, same timestamp
    let other = dir.path().join("other.bin");
    fs::write(&other, &content).unwrap();
    let third = split(&other, &b, &SplitConfig::new(3, 2).unwrap().with_timestamp(100)).unwrap();
    let err = bind([&first[0], &third[1]], dir.path().join("out"), false).unwrap_err();
    assert!(matches!(err, Error::InconsistentShards { .. }), "{:?}", err);
    assert!(!dir.path().join("out").exists());
}

#[test]
fn all_required_shards_bind_in_any_discovery_order() {
    let dir = tempdir().unwrap();
    let content = random_content(2_345, 6);
    let paths = split_file(&dir, "payload.bin", &content, 5, 5);

    let orders: [[usize; 5]; 3] = [[4, 3, 2, 1, 0], [2, 0, 4, 1, 3], [1, 0, 2, 3, 4]];
    for (n, order) in orders.iter().enumerate() {
        let shuffled: Vec<&PathBuf> = order.iter().map(|&i| &paths[i]).collect();
        let out = dir.path().join(format!("restored_{}", n));
        bind(shuffled, &out, false).unwrap();
        assert_eq!(fs::read(&out).unwrap(), content, "order {:?}", order);
    }
}

#[test]
fn existing_destination_needs_overwrite() {
    let dir = tempdir().unwrap();
    let content = random_content(1_000, 7);
    let paths = split_file(&dir, "payload.bin", &content, 3, 2);

    let out = dir.path().join("existing");
    fs::write(&out, b"keep me").unwrap();

    let err = bind(&paths, &out, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Collision);
    assert_eq!(fs::read(&out).unwrap(), b"keep me");

    bind(&paths, &out, true).unwrap();
    assert_eq!(fs::read(&out).unwrap(), content);
}

#[test]
fn empty_and_tiny_files_round_trip() {
    for (n, len) in [0usize, 1, 99, 100, 101].into_iter().enumerate() {
        let dir = tempdir().unwrap();
        let content = random_content(len, 8 + n as u64);
        for (total, threshold) in [(2, 2), (3, 2), (7, 7)] {
            let source = dir.path().join("f.dat");
            fs::write(&source, &content).unwrap();
            let shards = dir.path().join(format!("s_{}_{}", total, threshold));
            let paths = split(&source, &shards, &SplitConfig::new(total, threshold).unwrap()).unwrap();

            let out = dir.path().join(format!("out_{}_{}", total, threshold));
            bind(&paths[..threshold], &out, false).unwrap();
            assert_eq!(fs::read(&out).unwrap(), content, "len {} ({}, {})", len, total, threshold);
        }
    }
}

#[test]
fn bind_from_directory_listing() {
    let dir = tempdir().unwrap();
    let content = b"the quick brown fox".to_vec();
    split_file(&dir, "fox.txt", &content, 4, 2);

    let found = find_shards(dir.path().join("shards")).unwrap();
    assert_eq!(found.len(), 4);

    let set = ShareSet::open(&found).unwrap();
    assert_eq!(set.original_filename(), "fox.txt");
    let out = dir.path().join(set.original_filename());
    fs::remove_file(&out).unwrap();
    assert_eq!(set.recover_to(&out, false).unwrap(), content.len() as u64);
    assert_eq!(fs::read(&out).unwrap(), content);
}

#[test]
fn malformed_candidate_fails_bind() {
    let dir = tempdir().unwrap();
    let mut paths = split_file(&dir, "p.bin", &random_content(100, 9), 3, 2);
    let junk = dir.path().join("junk.horcrux");
    fs::write(&junk, b"not a shard at all\n").unwrap();
    paths.push(junk);

    let err = bind(&paths, dir.path().join("out"), false).unwrap_err();
    assert!(matches!(err, Error::MalformedShard { .. }), "{:?}", err);
}

#[test]
fn shard_naming_a_path_outside_its_directory_is_rejected() {
    let dir = tempdir().unwrap();
    let paths = split_file(&dir, "esc.txt", b"do not leave", 2, 2);
    for path in &paths {
        let bytes = fs::read(path).unwrap();
        let pos = bytes
            .windows(b"\"esc.txt\"".len())
            .position(|w| w == b"\"esc.txt\"")
            .unwrap();
        let mut forged = bytes[..pos].to_vec();
        forged.extend_from_slice(b"\"../escaped.txt\"");
        forged.extend_from_slice(&bytes[pos + b"\"esc.txt\"".len()..]);
        fs::write(path, forged).unwrap();
    }

    let err = ShareSet::open(&paths).unwrap_err();
    assert!(matches!(err, Error::MalformedShard { .. }), "{:?}", err);
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(!dir.path().join("escaped.txt").exists());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_round_trip(
        content in proptest::collection::vec(any::<u8>(), 0..1500),
        total in 2usize..7,
        threshold_offset in 0usize..5,
    ) {
        let threshold = 2 + threshold_offset % (total - 1);
        let dir = tempdir().unwrap();
        let source = dir.path().join("prop.bin");
        fs::write(&source, &content).unwrap();
        let paths = split(&source, dir.path().join("s"), &SplitConfig::new(total, threshold).unwrap()).unwrap();

        // take the last `threshold` shards, newest first
        let picked: Vec<&PathBuf> = paths.iter().rev().take(threshold).collect();
        let out = dir.path().join("out");
        bind(picked, &out, false).unwrap();
        prop_assert_eq!(fs::read(&out).unwrap(), content);
    }
}
