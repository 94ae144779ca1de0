//! `.git` internals analyzer.
//!
//! Pure filesystem inspection: no git binary is invoked and nothing is
//! written. Every top-level child of a `.git` directory ends up in exactly
//! one entry, so the summary total accounts for the whole directory.

use crate::aggregate;
use crate::error::Error;
use crate::model::{GitEntryType, GitRepoEntry, GitRepoSummary, Safety};
use crate::utils;
use bytesize::ByteSize;
use flate2::read::ZlibDecoder;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_LARGE_BLOB_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Operations in progress; their presence freezes the repository.
const IN_PROGRESS_MARKERS: &[&str] = &[
    "MERGE_HEAD",
    "CHERRY_PICK_HEAD",
    "REVERT_HEAD",
    "BISECT_LOG",
    "rebase-merge",
    "rebase-apply",
];

const REF_FILES: &[&str] = &["packed-refs", "HEAD", "ORIG_HEAD", "FETCH_HEAD"];

const PACK_EXTENSIONS: &[&str] = &["pack", "idx", "rev", "bitmap", "mtimes", "promisor", "keep"];

const IDX_V2_MAGIC: [u8; 4] = [0xff, b't', b'O', b'c'];
const OBJ_BLOB: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitOptions {
    /// Blobs at or above this uncompressed size are reported individually.
    pub large_blob_threshold: u64,
}

impl Default for GitOptions {
    fn default() -> Self {
        Self {
            large_blob_threshold: DEFAULT_LARGE_BLOB_THRESHOLD,
        }
    }
}

pub fn is_git_dir_name(path: &Path) -> bool {
    utils::file_name_str(path) == ".git"
}

/// Analyze one `.git` directory.
pub fn analyze_git_dir(git_dir: &Path, options: &GitOptions) -> GitRepoSummary {
    let repo_path = git_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| git_dir.to_path_buf());
    let mut inventory = Inventory::new(repo_path.clone());

    match fs::read_dir(git_dir) {
        Ok(children) => {
            for child in children.flatten() {
                let path = child.path();
                let name = child.file_name().to_string_lossy().into_owned();
                let is_dir = child.file_type().map(|t| t.is_dir()).unwrap_or(false);
                match name.as_str() {
                    "objects" if is_dir => inventory.objects(git_dir, &path, options),
                    "logs" if is_dir => inventory.reflogs(&path),
                    "refs" => {
                        let size = utils::path_size(&path);
                        inventory.push(Draft::new(GitEntryType::Refs, path, size))
                    }
                    n if REF_FILES.contains(&n) => {
                        let size = utils::path_size(&path);
                        inventory.push(Draft::new(GitEntryType::Refs, path, size))
                    }
                    _ => {
                        let size = utils::path_size(&path);
                        inventory.push(Draft::new(GitEntryType::Other, path, size))
                    }
                }
            }
        }
        Err(err) => tracing::debug!(git_dir = %git_dir.display(), %err, "cannot read git directory"),
    }

    let lock = detect_lock(git_dir);
    if let Some(marker) = &lock {
        let err = Error::LockHeld {
            repo: repo_path.clone(),
            marker: marker.clone(),
        };
        tracing::warn!("{err}");
    }
    let lock_held = lock.is_some();
    let entries = inventory.finish(lock_held);
    aggregate::git_summary(repo_path, entries, lock_held)
}

/// First lock file or in-progress marker found, if any.
pub fn detect_lock(git_dir: &Path) -> Option<PathBuf> {
    for marker in IN_PROGRESS_MARKERS {
        let path = git_dir.join(marker);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(children) = fs::read_dir(git_dir) {
        let top = children
            .flatten()
            .map(|e| e.path())
            .find(|p| is_lock_file(p));
        if top.is_some() {
            return top;
        }
    }

    WalkDir::new(git_dir.join("refs"))
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .find(|p| is_lock_file(p))
}

fn is_lock_file(path: &Path) -> bool {
    utils::file_name_str(path).ends_with(".lock") && path.is_file()
}

/// An entry before repository state is applied.
struct Draft {
    entry_type: GitEntryType,
    entry_path: PathBuf,
    size_bytes: u64,
    kept: bool,
    recommendation: Option<String>,
    object_id: Option<String>,
}

impl Draft {
    fn new(entry_type: GitEntryType, entry_path: PathBuf, size_bytes: u64) -> Self {
        Self {
            entry_type,
            entry_path,
            size_bytes,
            kept: false,
            recommendation: None,
            object_id: None,
        }
    }

    fn recommend(mut self, text: impl Into<String>) -> Self {
        self.recommendation = Some(text.into());
        self
    }
}

struct Inventory {
    repo_path: PathBuf,
    drafts: Vec<Draft>,
}

#[derive(Default)]
struct PackGroup {
    pack: Option<PathBuf>,
    idx: Option<PathBuf>,
    size: u64,
    kept: bool,
}

impl Inventory {
    fn new(repo_path: PathBuf) -> Self {
        Self {
            repo_path,
            drafts: Vec::new(),
        }
    }

    fn push(&mut self, draft: Draft) {
        self.drafts.push(draft);
    }

    fn push_temp(&mut self, path: PathBuf, size: u64) {
        self.push(
            Draft::new(GitEntryType::Objects, path, size)
                .recommend("temporary file left by an interrupted git process; delete it"),
        );
    }

    fn reflogs(&mut self, logs_dir: &Path) {
        for entry in WalkDir::new(logs_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            self.push(Draft::new(GitEntryType::Reflog, entry.into_path(), size));
        }
    }

    fn objects(&mut self, git_dir: &Path, objects_dir: &Path, options: &GitOptions) {
        let Ok(children) = fs::read_dir(objects_dir) else {
            return;
        };
        let mut loose_count = 0u64;
        let mut loose_size = 0u64;

        for child in children.flatten() {
            let path = child.path();
            let name = child.file_name().to_string_lossy().into_owned();
            let is_dir = child.file_type().map(|t| t.is_dir()).unwrap_or(false);

            if is_dir && is_fanout_dir(&name) {
                let Ok(objects) = fs::read_dir(&path) else {
                    continue;
                };
                for object in objects.flatten() {
                    let object_path = object.path();
                    let object_name = object.file_name().to_string_lossy().into_owned();
                    let size = object.metadata().map(|m| m.len()).unwrap_or(0);
                    if object_name.starts_with("tmp_obj_") {
                        self.push_temp(object_path, size);
                        continue;
                    }
                    loose_count += 1;
                    loose_size += size;
                    if let Some((kind, blob_size)) = read_loose_header(&object_path) {
                        if kind == "blob" && blob_size >= options.large_blob_threshold {
                            let oid = format!("{name}{object_name}");
                            self.push_large_blob(object_path, oid, blob_size, options);
                        }
                    }
                }
            } else if is_dir && name == "pack" {
                self.packs(&path, object_hash_len(git_dir), options);
            } else if name.starts_with("tmp_obj_") {
                let size = utils::path_size(&path);
                self.push_temp(path, size);
            } else {
                let size = utils::path_size(&path);
                self.push(Draft::new(GitEntryType::Other, path, size));
            }
        }

        if loose_count > 0 {
            self.push(
                Draft::new(GitEntryType::Objects, objects_dir.to_path_buf(), loose_size).recommend(
                    format!("{loose_count} loose objects; `git gc` packs them and prunes unreachable ones"),
                ),
            );
        }
    }

    fn packs(&mut self, pack_dir: &Path, hash_len: usize, options: &GitOptions) {
        let Ok(children) = fs::read_dir(pack_dir) else {
            return;
        };
        let mut groups: BTreeMap<String, PackGroup> = BTreeMap::new();

        for child in children.flatten() {
            let path = child.path();
            let name = child.file_name().to_string_lossy().into_owned();
            let size = child.metadata().map(|m| m.len()).unwrap_or(0);

            if name.starts_with("tmp_pack_") || name.starts_with("tmp_idx_") || name.starts_with(".tmp-") {
                self.push_temp(path, size);
                continue;
            }
            let Some((stem, ext)) = name
                .rsplit_once('.')
                .filter(|(_, ext)| PACK_EXTENSIONS.contains(ext))
            else {
                self.push(Draft::new(GitEntryType::Other, path, size));
                continue;
            };

            let group = groups.entry(stem.to_string()).or_default();
            group.size += size;
            match ext {
                "pack" => group.pack = Some(path),
                "idx" => group.idx = Some(path),
                "keep" => group.kept = true,
                _ => {}
            }
        }

        for (stem, group) in groups {
            let entry_path = group
                .pack
                .clone()
                .unwrap_or_else(|| pack_dir.join(format!("{stem}.pack")));
            let recommendation = if group.kept {
                "pack is marked .keep; git gc will not repack it"
            } else if group.pack.is_none() {
                "index files without a pack; git gc removes them"
            } else {
                "`git gc --prune=now` repacks and drops unreachable objects"
            };
            let mut draft =
                Draft::new(GitEntryType::PackFile, entry_path, group.size).recommend(recommendation);
            draft.kept = group.kept;
            self.push(draft);

            if let (Some(pack), Some(idx)) = (&group.pack, &group.idx) {
                match large_pack_blobs(idx, pack, hash_len, options.large_blob_threshold) {
                    Ok(blobs) => {
                        for (oid, size) in blobs {
                            self.push_large_blob(pack.clone(), oid, size, options);
                        }
                    }
                    Err(err) => tracing::debug!(idx = %idx.display(), %err, "skipping pack index"),
                }
            }
        }
    }

    fn push_large_blob(&mut self, path: PathBuf, oid: String, size: u64, options: &GitOptions) {
        let threshold_mb = (options.large_blob_threshold / (1024 * 1024)).max(1);
        let mut draft = Draft::new(GitEntryType::LargeTrackedFile, path, size).recommend(format!(
            "blob {oid} ({}) is part of history; removing it requires a rewrite such as \
             `git filter-repo --strip-blobs-bigger-than {threshold_mb}M`",
            ByteSize(size)
        ));
        draft.object_id = Some(oid);
        self.push(draft);
    }

    fn finish(self, lock_held: bool) -> Vec<GitRepoEntry> {
        let repo_path = self.repo_path;
        self.drafts
            .into_iter()
            .map(|d| {
                let mut safety = base_safety(d.entry_type);
                let mut actionable = match d.entry_type {
                    GitEntryType::Reflog => true,
                    GitEntryType::Objects | GitEntryType::PackFile => !d.kept,
                    GitEntryType::Refs | GitEntryType::Other | GitEntryType::LargeTrackedFile => false,
                };
                if lock_held {
                    actionable = false;
                    safety = safety.max(Safety::Caution);
                }
                let recommendation = d.recommendation.or_else(|| default_recommendation(d.entry_type));
                GitRepoEntry {
                    repo_path: repo_path.clone(),
                    entry_path: d.entry_path,
                    entry_type: d.entry_type,
                    size_bytes: d.size_bytes,
                    safety,
                    actionable,
                    recommendation,
                    object_id: d.object_id,
                }
            })
            .collect()
    }
}

fn base_safety(entry_type: GitEntryType) -> Safety {
    match entry_type {
        GitEntryType::Reflog => Safety::Safe,
        GitEntryType::Objects | GitEntryType::PackFile | GitEntryType::LargeTrackedFile => {
            Safety::Caution
        }
        GitEntryType::Refs | GitEntryType::Other => Safety::Dangerous,
    }
}

fn default_recommendation(entry_type: GitEntryType) -> Option<String> {
    let text = match entry_type {
        GitEntryType::Reflog => "`git reflog expire --expire=now --all` clears reflog history",
        GitEntryType::Refs => "branch and tag pointers; never delete by hand",
        GitEntryType::Other => "repository metadata; leave in place",
        _ => return None,
    };
    Some(text.to_string())
}

fn is_fanout_dir(name: &str) -> bool {
    name.len() == 2 && name.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Object id length in bytes: 32 for sha256 repositories, 20 otherwise.
fn object_hash_len(git_dir: &Path) -> usize {
    let config = fs::read_to_string(git_dir.join("config")).unwrap_or_default();
    let sha256 = config.lines().any(|line| {
        let line = line.trim().to_ascii_lowercase();
        line.starts_with("objectformat") && line.contains("sha256")
    });
    if sha256 {
        32
    } else {
        20
    }
}

/// Inflate just enough of a loose object to read its `"<kind> <size>\0"` header.
fn read_loose_header(path: &Path) -> Option<(String, u64)> {
    let file = File::open(path).ok()?;
    let mut decoder = ZlibDecoder::new(file);
    let mut buf = [0u8; 64];
    let mut filled = 0;
    while filled < buf.len() {
        let n = decoder.read(&mut buf[filled..]).ok()?;
        if n == 0 {
            break;
        }
        filled += n;
        if buf[..filled].contains(&0) {
            break;
        }
    }
    let nul = buf[..filled].iter().position(|&b| b == 0)?;
    let header = std::str::from_utf8(&buf[..nul]).ok()?;
    let (kind, size) = header.split_once(' ')?;
    Some((kind.to_string(), size.parse().ok()?))
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

fn be_u32(bytes: &[u8]) -> io::Result<u32> {
    bytes
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| invalid("truncated pack index"))
}

fn be_u64(bytes: &[u8]) -> io::Result<u64> {
    bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_be_bytes)
        .ok_or_else(|| invalid("truncated pack index"))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Object ids and pack offsets from a version 2 pack index.
fn parse_idx_v2(data: &[u8], hash_len: usize) -> io::Result<Vec<(String, u64)>> {
    if data.len() < 8 + 256 * 4 || data[..4] != IDX_V2_MAGIC || be_u32(&data[4..])? != 2 {
        return Err(invalid("not a version 2 pack index"));
    }
    let count = be_u32(&data[8 + 255 * 4..])? as usize;
    let names = 8 + 256 * 4;
    let crcs = names + count * hash_len;
    let offsets = crcs + count * 4;
    let large_offsets = offsets + count * 4;
    if data.len() < large_offsets {
        return Err(invalid("truncated pack index"));
    }

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let oid = to_hex(&data[names + i * hash_len..names + (i + 1) * hash_len]);
        let raw = be_u32(&data[offsets + i * 4..])?;
        let offset = if raw & 0x8000_0000 != 0 {
            let slot = (raw & 0x7fff_ffff) as usize;
            be_u64(data.get(large_offsets + slot * 8..).unwrap_or_default())?
        } else {
            u64::from(raw)
        };
        out.push((oid, offset));
    }
    Ok(out)
}

/// Decode a pack object header: 3-bit type and varint size.
fn decode_pack_header(bytes: &[u8]) -> Option<(u8, u64)> {
    let (&first, rest) = bytes.split_first()?;
    let kind = (first >> 4) & 0x07;
    let mut size = u64::from(first & 0x0f);
    let mut shift = 4u32;
    let mut more = first & 0x80 != 0;
    let mut rest = rest.iter();
    while more {
        let &byte = rest.next()?;
        if shift > 57 {
            return None;
        }
        size |= u64::from(byte & 0x7f) << shift;
        shift += 7;
        more = byte & 0x80 != 0;
    }
    Some((kind, size))
}

/// Non-delta blobs in a pack whose size reaches `threshold`.
fn large_pack_blobs(
    idx_path: &Path,
    pack_path: &Path,
    hash_len: usize,
    threshold: u64,
) -> io::Result<Vec<(String, u64)>> {
    let idx = fs::read(idx_path)?;
    let mut objects = parse_idx_v2(&idx, hash_len)?;
    objects.sort_by_key(|(_, offset)| *offset);

    let mut pack = File::open(pack_path)?;
    let mut header = [0u8; 16];
    let mut found = Vec::new();
    for (oid, offset) in objects {
        pack.seek(SeekFrom::Start(offset))?;
        let n = pack.read(&mut header)?;
        if let Some((OBJ_BLOB, size)) = decode_pack_header(&header[..n]) {
            if size >= threshold {
                found.push((oid, size));
            }
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn write(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn loose_object(kind: &str, declared_size: u64, body: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(format!("{kind} {declared_size}\0").as_bytes())
            .unwrap();
        encoder.write_all(body).unwrap();
        encoder.finish().unwrap()
    }

    fn encode_pack_header(kind: u8, mut size: u64) -> Vec<u8> {
        let mut out = Vec::new();
        let mut byte = (kind << 4) | (size & 0x0f) as u8;
        size >>= 4;
        while size > 0 {
            out.push(byte | 0x80);
            byte = (size & 0x7f) as u8;
            size >>= 7;
        }
        out.push(byte);
        out
    }

    /// A one-object pack and its v2 index.
    fn pack_with_blob(oid: [u8; 20], kind: u8, size: u64) -> (Vec<u8>, Vec<u8>) {
        let mut pack = b"PACK".to_vec();
        pack.extend_from_slice(&2u32.to_be_bytes());
        pack.extend_from_slice(&1u32.to_be_bytes());
        pack.extend(encode_pack_header(kind, size));
        pack.extend_from_slice(&[0u8; 32]);

        let mut idx = IDX_V2_MAGIC.to_vec();
        idx.extend_from_slice(&2u32.to_be_bytes());
        for bucket in 0..256u32 {
            let n: u32 = if bucket >= u32::from(oid[0]) { 1 } else { 0 };
            idx.extend_from_slice(&n.to_be_bytes());
        }
        idx.extend_from_slice(&oid);
        idx.extend_from_slice(&0u32.to_be_bytes());
        idx.extend_from_slice(&12u32.to_be_bytes());
        (pack, idx)
    }

    fn basic_repo(root: &Path) -> PathBuf {
        let git = root.join("repo/.git");
        write(&git.join("HEAD"), b"ref: refs/heads/main\n");
        write(&git.join("config"), b"[core]\n\tbare = false\n");
        write(&git.join("refs/heads/main"), &[b'a'; 41]);
        write(&git.join("logs/HEAD"), &[b'l'; 100]);
        write(&git.join("logs/refs/heads/main"), &[b'l'; 50]);
        write(&git.join("hooks/pre-commit.sample"), &[b'h'; 30]);
        write(
            &git.join("objects/ab/cdef0123456789abcdef0123456789abcdef01"),
            &loose_object("blob", 5, b"hello"),
        );
        git
    }

    fn by_type(summary: &GitRepoSummary, t: GitEntryType) -> Vec<&GitRepoEntry> {
        summary.entries.iter().filter(|e| e.entry_type == t).collect()
    }

    #[test]
    fn test_classifies_entries() {
        let temp_dir = create_test_dir();
        let git = basic_repo(temp_dir.path());

        let summary = analyze_git_dir(&git, &GitOptions::default());
        assert_eq!(summary.repo_path, temp_dir.path().join("repo"));
        assert!(!summary.lock_held);

        let reflogs = by_type(&summary, GitEntryType::Reflog);
        assert_eq!(reflogs.len(), 2);
        assert!(reflogs.iter().all(|e| e.actionable && e.safety == Safety::Safe));

        let objects = by_type(&summary, GitEntryType::Objects);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].entry_path, git.join("objects"));
        assert!(objects[0].actionable);

        let refs = by_type(&summary, GitEntryType::Refs);
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|e| !e.actionable && e.safety == Safety::Dangerous));

        let other = by_type(&summary, GitEntryType::Other);
        assert_eq!(other.len(), 2);
        assert!(other.iter().all(|e| !e.actionable));
        assert!(summary.entries.iter().all(|e| e.recommendation.is_some()));
    }

    #[test]
    fn test_total_covers_whole_git_dir() {
        let temp_dir = create_test_dir();
        let git = basic_repo(temp_dir.path());

        let summary = analyze_git_dir(&git, &GitOptions::default());
        let sum: u64 = summary.entries.iter().map(|e| e.size_bytes).sum();
        assert_eq!(summary.total_size, sum);
        assert_eq!(summary.total_size, utils::dir_size(&git));
    }

    #[test]
    fn test_lock_freezes_repository() {
        let temp_dir = create_test_dir();
        let git = basic_repo(temp_dir.path());
        write(&git.join("index.lock"), b"");

        let summary = analyze_git_dir(&git, &GitOptions::default());
        assert!(summary.lock_held);
        assert!(summary.entries.iter().all(|e| !e.actionable));
        assert!(summary.entries.iter().all(|e| e.safety >= Safety::Caution));
    }

    #[test]
    fn test_in_progress_markers_and_ref_locks() {
        let temp_dir = create_test_dir();
        let git = basic_repo(temp_dir.path());
        assert!(detect_lock(&git).is_none());

        write(&git.join("refs/heads/topic.lock"), b"");
        assert_eq!(detect_lock(&git), Some(git.join("refs/heads/topic.lock")));

        fs::remove_file(git.join("refs/heads/topic.lock")).unwrap();
        fs::create_dir_all(git.join("rebase-merge")).unwrap();
        assert_eq!(detect_lock(&git), Some(git.join("rebase-merge")));
    }

    #[test]
    fn test_packs_grouped_by_stem_and_keep() {
        let temp_dir = create_test_dir();
        let git = basic_repo(temp_dir.path());
        let pack_dir = git.join("objects/pack");
        write(&pack_dir.join("pack-aaa.pack"), &[0u8; 100]);
        write(&pack_dir.join("pack-aaa.idx"), &[0u8; 40]);
        write(&pack_dir.join("pack-aaa.rev"), &[0u8; 10]);
        write(&pack_dir.join("pack-bbb.pack"), &[0u8; 7]);
        write(&pack_dir.join("pack-bbb.keep"), b"");
        write(&pack_dir.join("tmp_pack_XYZ"), &[0u8; 3]);

        let summary = analyze_git_dir(&git, &GitOptions::default());
        let packs = by_type(&summary, GitEntryType::PackFile);
        assert_eq!(packs.len(), 2);

        let aaa = packs
            .iter()
            .find(|e| e.entry_path == pack_dir.join("pack-aaa.pack"))
            .unwrap();
        assert_eq!(aaa.size_bytes, 150);
        assert!(aaa.actionable);

        let bbb = packs
            .iter()
            .find(|e| e.entry_path == pack_dir.join("pack-bbb.pack"))
            .unwrap();
        assert!(!bbb.actionable);

        let temp = by_type(&summary, GitEntryType::Objects)
            .into_iter()
            .find(|e| e.entry_path == pack_dir.join("tmp_pack_XYZ"));
        assert!(temp.is_some());
    }

    #[test]
    fn test_large_loose_blob() {
        let temp_dir = create_test_dir();
        let git = basic_repo(temp_dir.path());
        let big = 50 * 1024 * 1024;
        write(
            &git.join("objects/12/3456"),
            &loose_object("blob", big, b"truncated body is fine"),
        );

        let summary = analyze_git_dir(&git, &GitOptions::default());
        let large = by_type(&summary, GitEntryType::LargeTrackedFile);
        assert_eq!(large.len(), 1);
        assert_eq!(large[0].object_id.as_deref(), Some("123456"));
        assert_eq!(large[0].size_bytes, big);
        assert!(!large[0].actionable);
        // Large blobs are not added on top of the object files that hold them.
        assert_eq!(summary.total_size, utils::dir_size(&git));
    }

    #[test]
    fn test_large_packed_blob() {
        let temp_dir = create_test_dir();
        let git = basic_repo(temp_dir.path());
        let mut oid = [0u8; 20];
        oid[0] = 0xab;
        oid[19] = 0x01;
        let (pack, idx) = pack_with_blob(oid, OBJ_BLOB, 20 * 1024 * 1024);
        write(&git.join("objects/pack/pack-big.pack"), &pack);
        write(&git.join("objects/pack/pack-big.idx"), &idx);

        let summary = analyze_git_dir(&git, &GitOptions::default());
        let large = by_type(&summary, GitEntryType::LargeTrackedFile);
        assert_eq!(large.len(), 1);
        assert_eq!(large[0].object_id.as_deref(), Some(to_hex(&oid).as_str()));
        assert_eq!(large[0].entry_path, git.join("objects/pack/pack-big.pack"));

        let small = GitOptions {
            large_blob_threshold: 64 * 1024 * 1024,
        };
        let summary = analyze_git_dir(&git, &small);
        assert!(by_type(&summary, GitEntryType::LargeTrackedFile).is_empty());
    }

    #[test]
    fn test_packed_commit_is_not_a_blob() {
        let temp_dir = create_test_dir();
        let idx_dir = temp_dir.path();
        let (pack, idx) = pack_with_blob([0x10; 20], 1, 30 * 1024 * 1024);
        write(&idx_dir.join("p.pack"), &pack);
        write(&idx_dir.join("p.idx"), &idx);

        let found =
            large_pack_blobs(&idx_dir.join("p.idx"), &idx_dir.join("p.pack"), 20, 1).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_pack_header_varint() {
        for size in [0u64, 15, 16, 1000, 10 * 1024 * 1024, u32::MAX as u64 + 7] {
            let encoded = encode_pack_header(OBJ_BLOB, size);
            assert_eq!(decode_pack_header(&encoded), Some((OBJ_BLOB, size)));
        }
        assert_eq!(decode_pack_header(&[0x80]), None);
    }

    #[test]
    fn test_bad_index_is_rejected() {
        assert!(parse_idx_v2(b"not an index", 20).is_err());
    }

    #[test]
    fn test_sha256_object_format() {
        let temp_dir = create_test_dir();
        let git = temp_dir.path().join(".git");
        write(
            &git.join("config"),
            b"[core]\n\trepositoryformatversion = 1\n[extensions]\n\tobjectFormat = sha256\n",
        );
        assert_eq!(object_hash_len(&git), 32);
        assert_eq!(object_hash_len(temp_dir.path()), 20);
    }
}
