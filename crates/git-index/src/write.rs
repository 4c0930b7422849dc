//! Index file writing.

use std::io::Write;
use std::path::Path;

use git_hash::hasher::Hasher;
use git_hash::HashAlgorithm;

use crate::entry::IndexEntry;
use crate::extensions::tree::CacheTree;
use crate::extensions::ResolveUndo;
use crate::{Index, IndexError};

/// Magic bytes at the start of every index file.
const INDEX_SIGNATURE: &[u8; 4] = b"DIRC";

/// Write the index to a file atomically using a lock file.
pub fn write_index(index: &Index, path: &Path) -> Result<(), IndexError> {
    let mut lock =
        git_utils::lockfile::LockFile::acquire(path).map_err(|_| IndexError::LockFailed {
            path: path.to_path_buf(),
        })?;

    let data = serialize_index(index)?;
    lock.write_all(&data)?;
    lock.commit().map_err(|_| IndexError::LockFailed {
        path: path.to_path_buf(),
    })?;

    Ok(())
}

/// Serialize the index to bytes.
fn serialize_index(index: &Index) -> Result<Vec<u8>, IndexError> {
    let mut buf = Vec::new();

    // Header
    buf.extend_from_slice(INDEX_SIGNATURE);
    buf.extend_from_slice(&2u32.to_be_bytes()); // always write v2
    buf.extend_from_slice(&(index.entries.len() as u32).to_be_bytes());

    // Entries (must be sorted)
    for entry in index.iter() {
        write_entry(&mut buf, entry);
    }

    // Extensions, in the order they were read (or inserted), so unknown
    // chunks round-trip in their original relative position.
    if let Some(ref tree) = index.cache_tree {
        let tree_data = tree.serialize();
        buf.extend_from_slice(CacheTree::SIGNATURE);
        buf.extend_from_slice(&(tree_data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&tree_data);
    }

    if let Some(ref reuc) = index.resolve_undo {
        let reuc_data = reuc.serialize();
        buf.extend_from_slice(ResolveUndo::SIGNATURE);
        buf.extend_from_slice(&(reuc_data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&reuc_data);
    }

    for ext in &index.unknown_extensions {
        buf.extend_from_slice(&ext.signature);
        buf.extend_from_slice(&(ext.data.len() as u32).to_be_bytes());
        buf.extend_from_slice(&ext.data);
    }

    // Checksum
    let checksum = Hasher::digest(HashAlgorithm::Sha1, &buf)
        .map_err(|_| IndexError::InvalidHeader("checksum computation failed".into()))?;
    buf.extend_from_slice(checksum.as_bytes());

    Ok(buf)
}

/// Write a single v2 cache entry.
fn write_entry(buf: &mut Vec<u8>, entry: &IndexEntry) {
    let entry_start = buf.len();

    // Stat data (40 bytes)
    buf.extend_from_slice(&entry.stat.ctime_secs.to_be_bytes());
    buf.extend_from_slice(&entry.stat.ctime_nsecs.to_be_bytes());
    buf.extend_from_slice(&entry.stat.mtime_secs.to_be_bytes());
    buf.extend_from_slice(&entry.stat.mtime_nsecs.to_be_bytes());
    buf.extend_from_slice(&entry.stat.dev.to_be_bytes());
    buf.extend_from_slice(&entry.stat.ino.to_be_bytes());
    buf.extend_from_slice(&entry.mode.raw().to_be_bytes());
    buf.extend_from_slice(&entry.stat.uid.to_be_bytes());
    buf.extend_from_slice(&entry.stat.gid.to_be_bytes());
    buf.extend_from_slice(&entry.stat.size.to_be_bytes());

    // OID (20 bytes)
    buf.extend_from_slice(entry.oid.as_bytes());

    // Flags (16 bits). CE_UPDATE is in-memory-only and never set here.
    let name_len = std::cmp::min(entry.path.len(), 0xFFF) as u16;
    let mut flags: u16 = name_len;
    flags |= (entry.stage.as_u8() as u16) << 12;
    if entry.flags.valid {
        flags |= 0x8000;
    }
    // We always write v2, so no extended-flags bit is ever set; a v3+
    // reader that set intent_to_add/skip_worktree loses them on a
    // round-trip through this writer.
    buf.extend_from_slice(&flags.to_be_bytes());

    // Path
    buf.extend_from_slice(&entry.path);

    // Pad using C git formula: entry_size = ((40 + 20 + 2 + name_len + 8) & ~7)
    let entry_size = (40 + 20 + 2 + entry.path.len() + 8) & !7;
    let current_len = buf.len() - entry_start;
    let padding = entry_size - current_len;
    for _ in 0..padding {
        buf.push(0);
    }
}
