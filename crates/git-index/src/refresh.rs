//! Stat-cache refresh: compare index entries against the working tree
//! without re-hashing content unless the comparison is genuinely
//! ambiguous (the racy-clean case).

use bitflags::bitflags;
use bstr::{BStr, BString, ByteSlice};

use crate::entry::StatData;
use crate::pathspec::Pathspec;
use crate::{Index, IndexError, ObjectStore, Stage};

bitflags! {
    /// Which stat fields differ between an index entry and the working
    /// tree, mirroring C git's `match_stat` result bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MatchFlags: u32 {
        const MTIME = 0x01;
        const CTIME = 0x02;
        const OWNER = 0x04;
        const MODE  = 0x08;
        const INODE = 0x10;
        const DATA  = 0x20;
        const TYPE  = 0x40;
    }
}

bitflags! {
    /// Flags controlling a refresh pass over the index.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RefreshFlags: u32 {
        /// Re-stat every entry, even ones marked CE_VALID (`ignore_valid`
        /// in C git's `REFRESH_REALLY`).
        const REALLY = 0x01;
        /// Also visit conflicted (stage > 0) entries.
        const UNMERGED = 0x02;
        /// Suppress the missing/unmerged path lists (caller only wants counts).
        const QUIET = 0x04;
        /// Don't report entries whose working-tree file is gone.
        const IGNORE_MISSING = 0x08;
    }
}

bitflags! {
    /// Options for a single `match_stat` comparison, mirroring C git's
    /// `CE_MATCH_*` flags consumed by `ie_match_stat`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MatchOptions: u32 {
        /// Compare stat data even if `CE_VALID` is set on the entry.
        const IGNORE_VALID = 0x01;
        /// Treat a racily-clean entry (mtime equal to the index's load
        /// timestamp) as DATA-dirty without re-hashing file content.
        const RACY_IS_DIRTY = 0x02;
    }
}

/// Outcome of a `refresh` pass.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    /// Paths whose stat data was brought up to date (the mismatch was
    /// stat-only; oid was left untouched since it still names the right
    /// content).
    pub updated: Vec<BString>,
    /// Paths whose content actually changed (`DATA` bit set). Stat data is
    /// deliberately left stale so a subsequent refresh still reports the
    /// mismatch; only re-hashing the file and staging it clears this.
    pub modified: Vec<BString>,
    /// Conflicted paths skipped because `RefreshFlags::UNMERGED` was not set.
    pub unmerged: Vec<BString>,
    /// Paths present in the index but missing from the working tree.
    pub missing: Vec<BString>,
}

/// Compare an index entry's cached stat data against a freshly-read
/// `std::fs::Metadata`, returning which fields disagree.
///
/// The `CE_VALID` short-circuit lives here: if `valid` is set and `options`
/// doesn't carry `IGNORE_VALID`, the entry is reported clean without
/// looking at `meta` at all. Racy-clean handling also lives here: if the
/// entry's mtime equals `load_mtime` (the index file's own mtime at load
/// time) and nothing but time disagrees, the result is ambiguous unless
/// `RACY_IS_DIRTY` says to treat it as dirty.
pub fn match_stat(
    stat: &StatData,
    valid: bool,
    mode_matches: bool,
    is_symlink: bool,
    is_dir: bool,
    meta: &std::fs::Metadata,
    load_mtime: Option<(u32, u32)>,
    options: MatchOptions,
) -> MatchFlags {
    if valid && !options.contains(MatchOptions::IGNORE_VALID) {
        return MatchFlags::empty();
    }

    let mut flags = MatchFlags::empty();
    let fresh = StatData::from_metadata(meta);

    if fresh.size != stat.size {
        flags |= MatchFlags::DATA;
    }
    if fresh.mtime_secs != stat.mtime_secs || fresh.mtime_nsecs != stat.mtime_nsecs {
        flags |= MatchFlags::MTIME;
    }
    if fresh.ctime_secs != stat.ctime_secs || fresh.ctime_nsecs != stat.ctime_nsecs {
        flags |= MatchFlags::CTIME;
    }
    if fresh.dev != stat.dev || fresh.ino != stat.ino {
        flags |= MatchFlags::INODE;
    }
    if fresh.uid != stat.uid || fresh.gid != stat.gid {
        flags |= MatchFlags::OWNER;
    }
    if !mode_matches {
        flags |= MatchFlags::MODE;
    }
    if is_symlink != meta.file_type().is_symlink() || is_dir != meta.is_dir() {
        flags |= MatchFlags::TYPE;
    }

    let racy = load_mtime.is_some_and(|(s, n)| s == fresh.mtime_secs && n == fresh.mtime_nsecs);
    if racy && options.contains(MatchOptions::RACY_IS_DIRTY) {
        flags |= MatchFlags::DATA;
    }

    flags
}

/// True if `meta`'s mtime equals `load_mtime` (the index file's own mtime
/// at the moment it was read) — the filesystem's clock cannot distinguish
/// a same-tick modification from no modification at all.
fn is_racy(load_mtime: Option<(u32, u32)>, meta: &std::fs::Metadata) -> bool {
    let fresh = StatData::from_metadata(meta);
    load_mtime.is_some_and(|(s, n)| s == fresh.mtime_secs && n == fresh.mtime_nsecs)
}

/// Refresh the index in place against the working tree. Entries outside
/// `pathspec` (when given) are left untouched. Returns a report of what
/// changed; never re-hashes file content except to resolve a racy-clean
/// match, via `store.hash_would_match`.
pub fn refresh(
    index: &mut Index,
    flags: RefreshFlags,
    pathspec: Option<&Pathspec>,
    store: &dyn ObjectStore,
) -> Result<RefreshReport, IndexError> {
    refresh_with_options(index, flags, MatchOptions::empty(), pathspec, store)
}

/// Same as [`refresh`] but with explicit `MatchOptions` control over the
/// `CE_VALID` short-circuit and racy-clean handling (see [`match_stat`]).
pub fn refresh_with_options(
    index: &mut Index,
    flags: RefreshFlags,
    match_options: MatchOptions,
    pathspec: Option<&Pathspec>,
    store: &dyn ObjectStore,
) -> Result<RefreshReport, IndexError> {
    let load_mtime = index.load_mtime();
    let mut report = RefreshReport::default();
    let match_options = if flags.contains(RefreshFlags::REALLY) {
        match_options | MatchOptions::IGNORE_VALID
    } else {
        match_options
    };

    for i in 0..index.entries_mut().len() {
        let (path, stage, skip) = {
            let entry = &index.entries_mut()[i];
            let matches_spec = pathspec.map_or(true, |ps| ps.matches(BStr::new(&entry.path), false));
            (entry.path.clone(), entry.stage, !matches_spec)
        };
        if skip {
            continue;
        }

        if stage != Stage::Normal {
            if flags.contains(RefreshFlags::UNMERGED) {
                continue;
            }
            report.unmerged.push(path);
            continue;
        }

        let was_valid = index.entries_mut()[i].flags.valid;
        if was_valid && !match_options.contains(MatchOptions::IGNORE_VALID) {
            continue;
        }

        let fs_path = std::path::Path::new(path.to_str_lossy().as_ref());
        let meta = match std::fs::symlink_metadata(fs_path) {
            Ok(m) => m,
            Err(_) => {
                if !flags.contains(RefreshFlags::IGNORE_MISSING) {
                    report.missing.push(path);
                }
                continue;
            }
        };

        let entry = &index.entries_mut()[i];
        let mode_matches = mode_still_matches(entry.mode, &meta);
        let mismatch = match_stat(
            &entry.stat,
            was_valid,
            mode_matches,
            matches!(entry.mode, git_object::FileMode::Symlink),
            matches!(entry.mode, git_object::FileMode::Tree),
            &meta,
            load_mtime,
            match_options,
        );

        if mismatch.is_empty() {
            continue;
        }

        let racy = is_racy(load_mtime, &meta);

        if racy && mismatch == MatchFlags::MTIME && !match_options.contains(MatchOptions::RACY_IS_DIRTY) {
            let unchanged = store
                .hash_would_match(fs_path, &entry.oid)
                .unwrap_or(false);
            if unchanged {
                let entry = &mut index.entries_mut()[i];
                entry.stat = StatData::from_metadata(&meta);
                index.mark_dirty();
                report.updated.push(path);
                continue;
            }
            // The re-hash proved content actually changed: report modified
            // and leave stat stale, same as any other DATA-dirty entry.
            report.modified.push(path);
            continue;
        }

        if mismatch.contains(MatchFlags::DATA) {
            // oid would need a re-hash to stay truthful; leave stat stale
            // so the mismatch keeps surfacing on the next refresh instead
            // of being silently masked.
            report.modified.push(path);
            continue;
        }

        let entry = &mut index.entries_mut()[i];
        entry.stat = StatData::from_metadata(&meta);
        entry.flags.update = true;
        index.mark_dirty();
        report.updated.push(path);
    }

    Ok(report)
}

fn mode_still_matches(mode: git_object::FileMode, meta: &std::fs::Metadata) -> bool {
    if meta.file_type().is_symlink() {
        return matches!(mode, git_object::FileMode::Symlink);
    }
    if meta.is_dir() {
        return matches!(mode, git_object::FileMode::Tree | git_object::FileMode::Gitlink);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let executable = meta.permissions().mode() & 0o100 != 0;
        matches!(
            (mode, executable),
            (git_object::FileMode::Executable, true) | (git_object::FileMode::Regular, false)
        )
    }
    #[cfg(not(unix))]
    {
        matches!(mode, git_object::FileMode::Regular | git_object::FileMode::Executable)
    }
}
