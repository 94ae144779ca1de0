use crate::aggregate;
use crate::error::{Error, Result};
use crate::model::{DuplicateSet, FileRecord};
use crate::utils;
use crate::walker::{CancelToken, ScanWarning};
use blake3::Hasher;
use crossbeam_channel::unbounded;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Read buffer for streamed hashing; files are never loaded whole.
const HASH_BUFFER_SIZE: usize = 256 * 1024;

/// Sent from hash workers to the grouping thread.
enum HashMessage {
    Hashed {
        size: u64,
        hash: String,
        path: PathBuf,
    },
    Failed(ScanWarning),
}

/// Find sets of files with identical content.
///
/// Step 1 buckets by exact size (zero-byte files never count), step 2 hashes
/// every member of a bucket with two or more files. Hashing runs on `pool`;
/// results travel over a channel to the calling thread, which owns the map.
pub fn find_duplicates(
    files: impl IntoIterator<Item = FileRecord>,
    min_size_bytes: u64,
    pool: &rayon::ThreadPool,
    cancel: &CancelToken,
    warnings: &mut Vec<ScanWarning>,
) -> Result<Vec<DuplicateSet>> {
    let floor = min_size_bytes.max(1);

    // Step 1: Group files by size
    let mut size_groups: HashMap<u64, Vec<PathBuf>> = HashMap::new();
    for record in files {
        if record.size_bytes >= floor {
            size_groups.entry(record.size_bytes).or_default().push(record.path);
        }
    }
    let candidates: Vec<(u64, PathBuf)> = size_groups
        .into_iter()
        .filter(|(_, paths)| paths.len() >= 2)
        .flat_map(|(size, paths)| paths.into_iter().map(move |p| (size, p)))
        .collect();
    tracing::debug!(candidates = candidates.len(), "hashing same-size files");

    // Step 2: Hash candidates in parallel, group on this thread
    let (tx, rx) = unbounded::<HashMessage>();
    let mut hash_groups: HashMap<(u64, String), Vec<PathBuf>> = HashMap::new();

    std::thread::scope(|scope| {
        let candidates = &candidates;
        scope.spawn(move || {
            pool.install(|| {
                candidates.par_iter().for_each_with(tx, |tx, (size, path)| {
                    if cancel.is_cancelled() {
                        return;
                    }
                    let _ = tx.send(hash_message(*size, path));
                });
            });
        });

        for message in rx {
            match message {
                HashMessage::Hashed { size, hash, path } => {
                    hash_groups.entry((size, hash)).or_default().push(path);
                }
                HashMessage::Failed(warning) => warnings.push(warning),
            }
        }
    });

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut sets: Vec<DuplicateSet> = hash_groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|((file_size, content_hash), members)| DuplicateSet {
            content_hash,
            file_size,
            members,
        })
        .collect();
    aggregate::sort_duplicate_sets(&mut sets);
    Ok(sets)
}

fn hash_message(size: u64, path: &Path) -> HashMessage {
    match utils::catch_panic(|| compute_full_hash(path)) {
        Ok(Ok((hash, read))) if read == size => HashMessage::Hashed {
            size,
            hash,
            path: path.to_path_buf(),
        },
        Ok(Ok(_)) => HashMessage::Failed(ScanWarning::new(path, "file changed while hashing")),
        Ok(Err(err)) => HashMessage::Failed(ScanWarning::new(path, format!("hash failed: {err}"))),
        Err(panic) => {
            HashMessage::Failed(ScanWarning::new(path, format!("hash worker panicked: {panic}")))
        }
    }
}

/// Compute the full blake3 hash of a file with buffered reads.
/// Returns the hex digest and the number of bytes hashed.
fn compute_full_hash(path: &Path) -> std::io::Result<(String, u64)> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(HASH_BUFFER_SIZE, file);
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    Ok((hasher.finalize().to_hex().to_string(), total))
}
