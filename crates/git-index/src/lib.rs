//! Index (staging area) for git.
//!
//! Provides reading, writing, and manipulation of the git index file (`.git/index`).
//! The index sits between the working tree and the object database, tracking which
//! files are staged for the next commit.

pub mod entry;
pub mod extensions;
pub mod pathspec;
pub mod refresh;
mod read;
mod write;

use std::path::Path;

use bitflags::bitflags;
use bstr::{BStr, ByteSlice};
use git_hash::ObjectId;

pub use entry::{EntryFlags, IndexEntry, StatData};
pub use error::IndexError;
pub use extensions::tree::CacheTree;
pub use extensions::{RawExtension, ResolveUndo};
pub use pathspec::Pathspec;
pub use refresh::{MatchFlags, MatchOptions, RefreshFlags, RefreshReport};

mod error {
    use std::path::PathBuf;

    #[derive(Debug, thiserror::Error)]
    pub enum IndexError {
        #[error("invalid index header: {0}")]
        InvalidHeader(String),

        #[error("unsupported index version: {0}")]
        UnsupportedVersion(u32),

        #[error("index checksum mismatch")]
        ChecksumMismatch,

        #[error("invalid index entry at offset {offset}: {reason}")]
        InvalidEntry { offset: usize, reason: String },

        #[error("invalid extension '{sig}': {reason}")]
        InvalidExtension { sig: String, reason: String },

        #[error("invalid pathspec: {0}")]
        InvalidPathspec(String),

        #[error("invalid path '{path}': {reason}")]
        InvalidPath { path: String, reason: String },

        #[error("directory/file conflict at '{path}'")]
        DFConflict { path: String },

        #[error("entry already exists at '{path}'")]
        Exists { path: String },

        #[error("path '{path}' is missing from the working tree")]
        Missing { path: String },

        #[error("lock failed: {path}")]
        LockFailed { path: PathBuf },

        #[error(transparent)]
        Io(#[from] std::io::Error),
    }
}

/// Merge stage for index entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Normal entry (stage 0).
    Normal,
    /// Base version in merge conflict (stage 1).
    Base,
    /// Ours version in merge conflict (stage 2).
    Ours,
    /// Theirs version in merge conflict (stage 3).
    Theirs,
}

impl Stage {
    pub fn as_u8(&self) -> u8 {
        match self {
            Stage::Normal => 0,
            Stage::Base => 1,
            Stage::Ours => 2,
            Stage::Theirs => 3,
        }
    }

    pub fn from_u8(n: u8) -> Result<Self, IndexError> {
        match n {
            0 => Ok(Stage::Normal),
            1 => Ok(Stage::Base),
            2 => Ok(Stage::Ours),
            3 => Ok(Stage::Theirs),
            _ => Err(IndexError::InvalidEntry {
                offset: 0,
                reason: format!("invalid stage: {n}"),
            }),
        }
    }
}

bitflags! {
    /// Options controlling `Index::add`, mirroring C git's `ADD_CACHE_*` flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AddOptions: u32 {
        /// Insert a brand-new path. Set by default; the container still
        /// enforces it by always allowing fresh inserts.
        const OK_TO_ADD = 0x1;
        /// Allow replacing an existing entry at the same (path, stage).
        /// Without this, adding over an existing same-stage entry is an error.
        const OK_TO_REPLACE = 0x2;
        /// Skip the directory/file conflict scan. Used by callers (e.g. a
        /// merge driver writing conflicted stages) that already know the
        /// tree shape is consistent.
        const SKIP_DFCHECK = 0x4;
        /// Append without maintaining sort order; caller is responsible for
        /// a subsequent explicit sort before the index is used further.
        const JUST_APPEND = 0x8;
    }
}

impl Default for AddOptions {
    fn default() -> Self {
        AddOptions::OK_TO_ADD
    }
}

/// External object-store collaborator: the index consumes this to look up
/// and verify blob content but never implements storage itself.
pub trait ObjectStore {
    fn write_blob(&self, data: &[u8]) -> std::io::Result<ObjectId>;
    fn read_object(
        &self,
        oid: &ObjectId,
    ) -> std::io::Result<Option<(git_object::ObjectType, Vec<u8>)>>;
    fn exists(&self, oid: &ObjectId) -> bool;
    /// Re-hash the working-tree file at `path` and report whether it still
    /// matches `oid`. Used to resolve the racy-clean case, where stat data
    /// alone cannot prove a file is unchanged.
    fn hash_would_match(&self, path: &Path, oid: &ObjectId) -> std::io::Result<bool>;
}

/// The four configuration booleans the index consults. Parsing `.git/config`
/// itself is out of scope; callers construct this however they obtain the
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexConfig {
    pub trust_executable_bit: bool,
    pub has_symlinks: bool,
    pub assume_unchanged: bool,
    pub auto_crlf: bool,
}

/// The git index (staging area).
pub struct Index {
    /// Index format version (2, 3, or 4) as read; always written as 2.
    version: u32,
    /// Cache entries sorted by (path, stage).
    entries: Vec<IndexEntry>,
    /// Cache tree extension.
    cache_tree: Option<CacheTree>,
    /// Resolve-undo extension.
    resolve_undo: Option<ResolveUndo>,
    /// Unknown extensions (preserved for round-trip).
    unknown_extensions: Vec<RawExtension>,
    /// Checksum of the index file as last read or written.
    _checksum: ObjectId,
    /// mtime of the index file as of the last `read_from`, used by the
    /// refresh engine to detect racily clean entries. `None` for an index
    /// that was never read from disk.
    load_mtime: Option<(u32, u32)>,
    /// Set by any container mutation (`add`, `remove`, `remove_path`,
    /// stat-cache updates during `refresh`); cleared by a fresh load, a
    /// successful write, or `discard()`.
    dirty: bool,
}

impl Index {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            version: 2,
            entries: Vec::new(),
            cache_tree: None,
            resolve_undo: None,
            unknown_extensions: Vec::new(),
            _checksum: ObjectId::NULL_SHA1,
            load_mtime: None,
            dirty: false,
        }
    }

    /// Read the index from a file (memory-mapped for large indices).
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let file = std::fs::File::open(path.as_ref())?;
        let meta = file.metadata()?;
        let data = unsafe { memmap2::Mmap::map(&file) }?;
        let mut index = read::parse_index(&data)?;
        index.load_mtime = mtime_secs_nsecs(&meta);
        index.dirty = false;
        Ok(index)
    }

    /// Write the index to a file (atomic, using lock file). Clears the
    /// dirty flag on success; on error the flag is left set, since the
    /// on-disk file was not brought up to date with memory.
    pub fn write_to(&mut self, path: impl AsRef<Path>) -> Result<(), IndexError> {
        write::write_index(self, path.as_ref())?;
        self.dirty = false;
        Ok(())
    }

    /// Has the container been mutated since the last load, write, or
    /// `discard()`?
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Drop all entries and extensions, release any backing mapping (there
    /// is none to release explicitly once entries are owned `BString`s, but
    /// this is the one entry point that promises it), and reset the dirty
    /// flag and load timestamp.
    pub fn discard(&mut self) {
        self.entries.clear();
        self.cache_tree = None;
        self.resolve_undo = None;
        self.unknown_extensions.clear();
        self.load_mtime = None;
        self.dirty = false;
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the index empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by path and stage.
    pub fn get(&self, path: &BStr, stage: Stage) -> Option<&IndexEntry> {
        self.lookup(path, stage).ok().map(|i| &self.entries[i])
    }

    /// Get all entries for a path (all stages).
    pub fn get_all(&self, path: &BStr) -> Vec<&IndexEntry> {
        self.entries
            .iter()
            .filter(|e| e.path[..] == path[..])
            .collect()
    }

    /// Binary search for `(path, stage)`. `Ok(i)` is the index of an exact
    /// match; `Err(i)` is the position at which it would be inserted to
    /// keep the vector sorted.
    pub fn lookup(&self, path: &BStr, stage: Stage) -> Result<usize, usize> {
        self.entries.binary_search_by(|e| {
            e.path
                .as_bytes()
                .cmp(path.as_ref())
                .then(e.stage.as_u8().cmp(&stage.as_u8()))
        })
    }

    /// Add or replace an entry, honoring `options`.
    ///
    /// The stage-0-excludes-any-stage invariant is always enforced: without
    /// `OK_TO_REPLACE`, adding a stage-0 entry over an existing stage>0
    /// entry (or vice versa) fails with `Exists`, same as adding over an
    /// exact `(path, stage)` match. With `OK_TO_REPLACE`, inserting a
    /// stage-0 entry drops any stage>0 siblings for the same path and vice
    /// versa.
    pub fn add(&mut self, entry: IndexEntry, options: AddOptions) -> Result<(), IndexError> {
        validate_path(entry.path.as_ref())?;

        if !options.contains(AddOptions::SKIP_DFCHECK) {
            self.check_df_conflict(&entry)?;
        }

        let path = entry.path.clone();
        let inserted_stage = entry.stage;

        if !options.contains(AddOptions::OK_TO_REPLACE) {
            let opposing_kind_present = if inserted_stage == Stage::Normal {
                self.entries
                    .iter()
                    .any(|e| e.path == path && e.stage != Stage::Normal)
            } else {
                self.entries
                    .iter()
                    .any(|e| e.path == path && e.stage == Stage::Normal)
            };
            if opposing_kind_present {
                return Err(IndexError::Exists {
                    path: entry.path.to_string(),
                });
            }
        }

        if let Some(ref mut tree) = self.cache_tree {
            tree.invalidate(BStr::new(&path));
        }

        match self.lookup(BStr::new(&entry.path), entry.stage) {
            Ok(pos) => {
                if !options.contains(AddOptions::OK_TO_REPLACE) {
                    return Err(IndexError::Exists {
                        path: entry.path.to_string(),
                    });
                }
                self.entries[pos] = entry;
            }
            Err(pos) => {
                if options.contains(AddOptions::JUST_APPEND) {
                    self.entries.push(entry);
                } else {
                    self.entries.insert(pos, entry);
                }
            }
        }

        // Stage-0-vs-nonzero mutual exclusion: whichever kind we just
        // inserted wins for this path, the other kind is dropped. Only
        // reachable with OK_TO_REPLACE, since the opposing-kind check above
        // already rejected this call otherwise.
        if inserted_stage == Stage::Normal {
            self.entries
                .retain(|e| e.path != path || e.stage == Stage::Normal);
        } else {
            self.entries
                .retain(|e| e.path != path || e.stage != Stage::Normal);
        }

        self.dirty = true;
        Ok(())
    }

    /// Remove entries matching a path and stage. Returns true if any were removed.
    pub fn remove(&mut self, path: &BStr, stage: Stage) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.path[..] == path[..] && e.stage == stage));
        let removed = self.entries.len() < before;

        if removed {
            if let Some(ref mut tree) = self.cache_tree {
                tree.invalidate(path);
            }
            self.dirty = true;
        }

        removed
    }

    /// Remove all stages for a path (used when a path transitions between a
    /// normal entry and a conflict, or is deleted outright).
    pub fn remove_path(&mut self, path: &BStr) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.path[..] != path[..]);
        let removed = self.entries.len() < before;
        if removed {
            if let Some(ref mut tree) = self.cache_tree {
                tree.invalidate(path);
            }
            self.dirty = true;
        }
        removed
    }

    /// Stage a working-tree file: read its metadata, canonicalize its mode,
    /// hand its content to the object store, and insert a stage-0 entry.
    pub fn add_file(
        &mut self,
        repo_relative_path: impl Into<bstr::BString>,
        abs_path: impl AsRef<Path>,
        store: &dyn ObjectStore,
        config: IndexConfig,
    ) -> Result<(), IndexError> {
        let path: bstr::BString = repo_relative_path.into();
        let abs_path = abs_path.as_ref();
        let meta = std::fs::metadata(abs_path).map_err(|_| IndexError::Missing {
            path: path.to_string(),
        })?;
        let data = std::fs::read(abs_path)?;
        let oid = store.write_blob(&data)?;
        let prior_mode = self.get(BStr::new(&path), Stage::Normal).map(|e| e.mode);
        let entry = IndexEntry::make(
            path,
            oid,
            &meta,
            prior_mode,
            config.trust_executable_bit,
            config.has_symlinks,
        );
        // Staging a normal version of a path resolves any prior conflict.
        self.remove_path(BStr::new(&entry.path));
        self.add(entry, AddOptions::OK_TO_ADD | AddOptions::OK_TO_REPLACE)
    }

    /// Directory/file conflict check: a path cannot be staged if any
    /// existing entry treats a strict prefix of it as a file, or if any
    /// existing entry's path has this path as a strict prefix directory.
    fn check_df_conflict(&self, entry: &IndexEntry) -> Result<(), IndexError> {
        let path = entry.path.as_bytes();
        for existing in &self.entries {
            if existing.path.as_bytes() == path {
                continue;
            }
            if is_strict_prefix_dir(existing.path.as_bytes(), path)
                || is_strict_prefix_dir(path, existing.path.as_bytes())
            {
                return Err(IndexError::DFConflict {
                    path: entry.path.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Check if the path has conflicts (stages 1, 2, or 3).
    pub fn has_conflicts(&self, path: &BStr) -> bool {
        self.entries
            .iter()
            .any(|e| e.path[..] == path[..] && e.stage != Stage::Normal)
    }

    /// Get all conflicted paths.
    pub fn conflicts(&self) -> Vec<&BStr> {
        let mut paths: Vec<&BStr> = self
            .entries
            .iter()
            .filter(|e| e.stage != Stage::Normal)
            .map(|e| e.path.as_ref())
            .collect();
        paths.dedup();
        paths
    }

    /// Iterate over all entries, in sorted (path, stage) order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    /// Iterate over entries matching a pathspec.
    pub fn iter_matching<'a>(
        &'a self,
        pathspec: &'a Pathspec,
    ) -> impl Iterator<Item = &'a IndexEntry> {
        self.entries
            .iter()
            .filter(move |e| pathspec.matches(BStr::new(&e.path), false))
    }

    /// Get the index version as read (the writer always emits version 2).
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Get the cache tree (if available).
    pub fn cache_tree(&self) -> Option<&CacheTree> {
        self.cache_tree.as_ref()
    }

    /// Get the cache tree mutably.
    pub fn cache_tree_mut(&mut self) -> Option<&mut CacheTree> {
        self.cache_tree.as_mut()
    }

    /// Set the cache tree.
    pub fn set_cache_tree(&mut self, tree: Option<CacheTree>) {
        self.cache_tree = tree;
    }

    /// Get the resolve-undo extension.
    pub fn resolve_undo(&self) -> Option<&ResolveUndo> {
        self.resolve_undo.as_ref()
    }

    pub(crate) fn load_mtime(&self) -> Option<(u32, u32)> {
        self.load_mtime
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<IndexEntry> {
        &mut self.entries
    }

    /// Mark the container dirty. Used by the refresh engine, which mutates
    /// entries in place via `entries_mut()` rather than through `add`.
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Compare cached entries against the working tree, updating stat data
    /// in place. See [`refresh::refresh`] for the matching rules.
    pub fn refresh(
        &mut self,
        flags: RefreshFlags,
        pathspec: Option<&Pathspec>,
        store: &dyn ObjectStore,
    ) -> Result<RefreshReport, IndexError> {
        refresh::refresh(self, flags, pathspec, store)
    }

    /// Same as [`Index::refresh`] but with explicit [`refresh::MatchOptions`]
    /// control over the `CE_VALID` short-circuit and racy-clean handling.
    pub fn refresh_with_options(
        &mut self,
        flags: RefreshFlags,
        match_options: refresh::MatchOptions,
        pathspec: Option<&Pathspec>,
        store: &dyn ObjectStore,
    ) -> Result<RefreshReport, IndexError> {
        refresh::refresh_with_options(self, flags, match_options, pathspec, store)
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

/// True if `maybe_dir` names a strict directory ancestor of `path`, i.e.
/// `path` starts with `maybe_dir` followed by `/`.
fn is_strict_prefix_dir(maybe_dir: &[u8], path: &[u8]) -> bool {
    path.len() > maybe_dir.len()
        && path.starts_with(maybe_dir)
        && path[maybe_dir.len()] == b'/'
}

/// Reject names that violate the on-disk/in-memory path invariants: empty,
/// leading/trailing slash, "//" runs, "." / ".." components, backslash or
/// NUL bytes, or a component that is "HEAD"/".git" (case-insensitively, to
/// guard case-insensitive filesystems).
fn validate_path(path: &[u8]) -> Result<(), IndexError> {
    let reject = |reason: &str| {
        Err(IndexError::InvalidPath {
            path: String::from_utf8_lossy(path).into_owned(),
            reason: reason.to_string(),
        })
    };

    if path.is_empty() {
        return reject("empty path");
    }
    if path.first() == Some(&b'/') || path.last() == Some(&b'/') {
        return reject("path begins or ends with '/'");
    }
    if path.contains(&b'\\') {
        return reject("path contains a backslash");
    }
    if path.contains(&0u8) {
        return reject("path contains a NUL byte");
    }
    if path.windows(2).any(|w| w == b"//") {
        return reject("path contains '//'");
    }

    for component in path.split(|&b| b == b'/') {
        if component.is_empty() {
            return reject("path contains an empty component");
        }
        if component == b"." || component == b".." {
            return reject("path contains a '.' or '..' component");
        }
        if component.eq_ignore_ascii_case(b"HEAD") || component.eq_ignore_ascii_case(b".git") {
            return reject("path contains a reserved 'HEAD' or '.git' component");
        }
    }

    Ok(())
}

fn mtime_secs_nsecs(meta: &std::fs::Metadata) -> Option<(u32, u32)> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        Some((meta.mtime() as u32, meta.mtime_nsec() as u32))
    }
    #[cfg(not(unix))]
    {
        use std::time::UNIX_EPOCH;
        let d = meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
        Some((d.as_secs() as u32, d.subsec_nanos()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_hash::ObjectId;
    use git_object::FileMode;

    fn entry(path: &str, stage: Stage) -> IndexEntry {
        IndexEntry {
            path: path.into(),
            oid: ObjectId::NULL_SHA1,
            mode: FileMode::Regular,
            stage,
            stat: StatData::default(),
            flags: EntryFlags::default(),
        }
    }

    #[test]
    fn add_keeps_sorted_order() {
        let mut index = Index::new();
        index
            .add(entry("b.txt", Stage::Normal), AddOptions::default())
            .unwrap();
        index
            .add(entry("a.txt", Stage::Normal), AddOptions::default())
            .unwrap();
        let paths: Vec<_> = index.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn add_without_replace_rejects_duplicate() {
        let mut index = Index::new();
        index
            .add(entry("a.txt", Stage::Normal), AddOptions::default())
            .unwrap();
        let err = index
            .add(entry("a.txt", Stage::Normal), AddOptions::OK_TO_ADD)
            .unwrap_err();
        assert!(matches!(err, IndexError::Exists { .. }));
    }

    #[test]
    fn add_with_replace_overwrites() {
        let mut index = Index::new();
        index
            .add(entry("a.txt", Stage::Normal), AddOptions::default())
            .unwrap();
        let mut e2 = entry("a.txt", Stage::Normal);
        e2.oid = ObjectId::from_hex("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb").unwrap();
        index
            .add(
                e2.clone(),
                AddOptions::OK_TO_ADD | AddOptions::OK_TO_REPLACE,
            )
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(BStr::new(b"a.txt"), Stage::Normal).unwrap().oid, e2.oid);
    }

    #[test]
    fn df_conflict_rejected() {
        let mut index = Index::new();
        index
            .add(entry("dir", Stage::Normal), AddOptions::default())
            .unwrap();
        let err = index
            .add(entry("dir/file.txt", Stage::Normal), AddOptions::default())
            .unwrap_err();
        assert!(matches!(err, IndexError::DFConflict { .. }));
    }

    #[test]
    fn df_conflict_can_be_skipped() {
        let mut index = Index::new();
        index
            .add(entry("dir", Stage::Normal), AddOptions::default())
            .unwrap();
        index
            .add(
                entry("dir/file.txt", Stage::Normal),
                AddOptions::OK_TO_ADD | AddOptions::SKIP_DFCHECK,
            )
            .unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn lookup_present_and_absent() {
        let mut index = Index::new();
        index
            .add(entry("b.txt", Stage::Normal), AddOptions::default())
            .unwrap();
        assert_eq!(index.lookup(BStr::new(b"b.txt"), Stage::Normal), Ok(0));
        assert_eq!(index.lookup(BStr::new(b"a.txt"), Stage::Normal), Err(0));
        assert_eq!(index.lookup(BStr::new(b"c.txt"), Stage::Normal), Err(1));
    }

    #[test]
    fn add_rejects_invalid_paths() {
        let mut index = Index::new();
        for bad in [
            "",
            "/abs",
            "trailing/",
            "a//b",
            "./a",
            "a/../b",
            "a\\b",
            "a\0b",
            ".git",
            "sub/.GIT",
            "HEAD",
            "sub/head",
        ] {
            let err = index
                .add(entry(bad, Stage::Normal), AddOptions::default())
                .unwrap_err();
            assert!(
                matches!(err, IndexError::InvalidPath { .. }),
                "expected InvalidPath for {bad:?}, got {err:?}"
            );
        }
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn add_rejects_opposing_stage_without_replace() {
        let mut index = Index::new();
        index
            .add(entry("x.txt", Stage::Normal), AddOptions::default())
            .unwrap();

        let err = index
            .add(
                entry("x.txt", Stage::Ours),
                AddOptions::OK_TO_ADD | AddOptions::SKIP_DFCHECK,
            )
            .unwrap_err();
        assert!(matches!(err, IndexError::Exists { .. }));
        assert_eq!(index.len(), 1);
        assert!(index.get(BStr::new(b"x.txt"), Stage::Normal).is_some());
    }

    #[test]
    fn add_with_replace_drops_opposing_stage() {
        let mut index = Index::new();
        index
            .add(entry("x.txt", Stage::Normal), AddOptions::default())
            .unwrap();

        index
            .add(
                entry("x.txt", Stage::Ours),
                AddOptions::OK_TO_ADD | AddOptions::OK_TO_REPLACE | AddOptions::SKIP_DFCHECK,
            )
            .unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.get(BStr::new(b"x.txt"), Stage::Normal).is_none());
        assert!(index.get(BStr::new(b"x.txt"), Stage::Ours).is_some());
    }

    #[test]
    fn remove_path_drops_all_stages() {
        let mut index = Index::new();
        index
            .add(entry("c.txt", Stage::Base), AddOptions::default())
            .unwrap();
        index
            .add(
                entry("c.txt", Stage::Ours),
                AddOptions::OK_TO_ADD | AddOptions::SKIP_DFCHECK,
            )
            .unwrap();
        assert!(index.remove_path(BStr::new(b"c.txt")));
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn new_index_is_not_dirty() {
        let index = Index::new();
        assert!(!index.is_dirty());
    }

    #[test]
    fn add_sets_dirty() {
        let mut index = Index::new();
        index
            .add(entry("a.txt", Stage::Normal), AddOptions::default())
            .unwrap();
        assert!(index.is_dirty());
    }

    #[test]
    fn remove_sets_dirty() {
        let mut index = Index::new();
        index
            .add(entry("a.txt", Stage::Normal), AddOptions::default())
            .unwrap();
        index.discard();
        assert!(!index.is_dirty());

        index
            .add(entry("a.txt", Stage::Normal), AddOptions::default())
            .unwrap();
        assert!(index.remove(BStr::new(b"a.txt"), Stage::Normal));
        assert!(index.is_dirty());
    }

    #[test]
    fn remove_path_sets_dirty() {
        let mut index = Index::new();
        index
            .add(entry("a.txt", Stage::Base), AddOptions::default())
            .unwrap();
        index
            .add(
                entry("a.txt", Stage::Ours),
                AddOptions::OK_TO_ADD | AddOptions::SKIP_DFCHECK,
            )
            .unwrap();
        assert!(index.remove_path(BStr::new(b"a.txt")));
        assert!(index.is_dirty());
    }

    #[test]
    fn discard_clears_entries_and_dirty() {
        let mut index = Index::new();
        index
            .add(entry("a.txt", Stage::Normal), AddOptions::default())
            .unwrap();
        assert!(index.is_dirty());
        index.discard();
        assert!(!index.is_dirty());
        assert_eq!(index.len(), 0);
        assert!(index.get(BStr::new(b"a.txt"), Stage::Normal).is_none());
    }
}
