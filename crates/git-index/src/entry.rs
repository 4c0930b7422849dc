//! Index entry types: IndexEntry, StatData, EntryFlags.

use bstr::BString;
use git_hash::ObjectId;
use git_object::FileMode;

use crate::Stage;

/// A single entry in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// File path (relative to repo root).
    pub path: BString,
    /// Object ID of the blob.
    pub oid: ObjectId,
    /// File mode.
    pub mode: FileMode,
    /// Merge stage (0 = normal, 1 = base, 2 = ours, 3 = theirs).
    pub stage: Stage,
    /// Stat data from the file system.
    pub stat: StatData,
    /// Entry flags.
    pub flags: EntryFlags,
}

impl IndexEntry {
    /// Build an entry for a freshly staged file: stat fields copied in from
    /// `meta`, mode canonicalized per `ce_mode_from_stat`, oid supplied by
    /// the caller (the object-store collaborator already wrote the blob).
    pub fn make(
        path: BString,
        oid: ObjectId,
        meta: &std::fs::Metadata,
        prior_mode: Option<FileMode>,
        trust_executable_bit: bool,
        has_symlinks: bool,
    ) -> Self {
        let is_symlink = meta.file_type().is_symlink();
        let is_dir = meta.is_dir();
        let raw_mode = raw_permission_bits(meta);
        let mode = FileMode::from_stat_with_prior(
            raw_mode,
            is_symlink,
            false,
            is_dir,
            prior_mode,
            trust_executable_bit,
            has_symlinks,
        );
        IndexEntry {
            path,
            oid,
            mode,
            stage: Stage::Normal,
            stat: StatData::from_metadata(meta),
            flags: EntryFlags::default(),
        }
    }
}

#[cfg(unix)]
fn raw_permission_bits(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn raw_permission_bits(_meta: &std::fs::Metadata) -> u32 {
    0o100644
}

/// Two entries name the same path (stage is not considered). Mirrors C
/// git's `ce_same_name`, used to group an existing path's stages together
/// before a container mutation.
pub fn same_name(a: &IndexEntry, b: &IndexEntry) -> bool {
    a.path == b.path
}

/// File system stat data cached in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatData {
    pub ctime_secs: u32,
    pub ctime_nsecs: u32,
    pub mtime_secs: u32,
    pub mtime_nsecs: u32,
    pub dev: u32,
    pub ino: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
}

impl StatData {
    /// Create from file system metadata.
    #[cfg(unix)]
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self {
            ctime_secs: meta.ctime() as u32,
            ctime_nsecs: meta.ctime_nsec() as u32,
            mtime_secs: meta.mtime() as u32,
            mtime_nsecs: meta.mtime_nsec() as u32,
            dev: meta.dev() as u32,
            ino: meta.ino() as u32,
            uid: meta.uid(),
            gid: meta.gid(),
            size: meta.len() as u32,
        }
    }

    /// Create from file system metadata (non-Unix fallback).
    #[cfg(not(unix))]
    pub fn from_metadata(meta: &std::fs::Metadata) -> Self {
        use std::time::UNIX_EPOCH;
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .unwrap_or_default();
        Self {
            ctime_secs: mtime.as_secs() as u32,
            ctime_nsecs: mtime.subsec_nanos(),
            mtime_secs: mtime.as_secs() as u32,
            mtime_nsecs: mtime.subsec_nanos(),
            dev: 0,
            ino: 0,
            uid: 0,
            gid: 0,
            size: meta.len() as u32,
        }
    }
}

/// Entry flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFlags {
    /// CE_VALID (bit 0x8000): assume the entry is unchanged; skip stat
    /// comparison on refresh unless `CE_MATCH_IGNORE_VALID` is requested.
    pub valid: bool,
    /// CE_UPDATE (bit 0x4000): in-memory-only scratch bit set while a
    /// refresh pass is batching updates. Never serialized.
    pub update: bool,
    /// CE_INTENT_TO_ADD: the entry is a placeholder for `git add -N`.
    pub intent_to_add: bool,
    /// CE_SKIP_WORKTREE: the entry should not be checked out.
    pub skip_worktree: bool,
}

impl EntryFlags {
    /// Returns true if any extended (v3+) flags are set, requiring the
    /// entry to be written with the extended-flags bit.
    pub fn has_extended(&self) -> bool {
        self.intent_to_add || self.skip_worktree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_data_default() {
        let stat = StatData::default();
        assert_eq!(stat.size, 0);
        assert_eq!(stat.mtime_secs, 0);
    }

    #[test]
    fn entry_flags_default() {
        let flags = EntryFlags::default();
        assert!(!flags.valid);
        assert!(!flags.update);
        assert!(!flags.intent_to_add);
        assert!(!flags.skip_worktree);
        assert!(!flags.has_extended());
    }

    #[test]
    fn entry_flags_extended() {
        let flags = EntryFlags {
            intent_to_add: true,
            ..Default::default()
        };
        assert!(flags.has_extended());
    }

    #[test]
    fn same_name_ignores_stage() {
        let a = IndexEntry {
            path: "a.txt".into(),
            oid: ObjectId::NULL_SHA1,
            mode: FileMode::Regular,
            stage: Stage::Base,
            stat: StatData::default(),
            flags: EntryFlags::default(),
        };
        let mut b = a.clone();
        b.stage = Stage::Ours;
        assert!(same_name(&a, &b));
        b.path = "b.txt".into();
        assert!(!same_name(&a, &b));
    }
}
