use crate::ObjectError;

/// File mode for tree/index entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Regular file (100644)
    Regular,
    /// Executable file (100755)
    Executable,
    /// Symbolic link (120000)
    Symlink,
    /// Git submodule link (160000)
    Gitlink,
    /// Subdirectory (040000) — never stored in the index, only in tree objects.
    Tree,
    /// Unknown mode (preserved for round-trip)
    Unknown(u32),
}

impl FileMode {
    /// Parse from octal ASCII bytes (e.g., `b"100644"`).
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        let raw = parse_octal(s)
            .ok_or_else(|| ObjectError::InvalidFileMode(String::from_utf8_lossy(s).into()))?;
        Ok(Self::from_raw(raw))
    }

    /// Create from the raw numeric value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0o100644 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o160000 => Self::Gitlink,
            0o040000 => Self::Tree,
            other => Self::Unknown(other),
        }
    }

    /// Serialize to octal ASCII bytes (git's canonical format, no leading zeros).
    pub fn as_bytes(&self) -> bstr::BString {
        bstr::BString::from(format!("{:o}", self.raw()))
    }

    /// Get the raw numeric value.
    pub fn raw(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Gitlink => 0o160000,
            Self::Tree => 0o040000,
            Self::Unknown(v) => *v,
        }
    }

    /// Is this a tree (directory) entry?
    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree)
    }

    /// Is this a blob (file) entry?
    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Regular | Self::Executable)
    }

    /// Is this a symlink?
    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink)
    }

    /// Is this a gitlink (submodule)?
    pub fn is_gitlink(&self) -> bool {
        matches!(self, Self::Gitlink)
    }

    /// Canonicalize a raw stat-derived mode into one of the modes git will
    /// actually store, mirroring C git's `canon_mode` macro: regular files
    /// collapse to the permission-bit-driven Regular/Executable pair,
    /// symlinks/gitlinks/trees pass through unchanged.
    pub fn canon(raw_mode: u32, is_symlink: bool, is_gitlink: bool, is_dir: bool) -> Self {
        if is_symlink {
            Self::Symlink
        } else if is_gitlink {
            Self::Gitlink
        } else if is_dir {
            Self::Tree
        } else if raw_mode & 0o100 != 0 {
            Self::Executable
        } else {
            Self::Regular
        }
    }

    /// Derive the mode to store for a file that already has a prior cache
    /// entry, mirroring C git's `ce_mode_from_stat`: when the repository
    /// doesn't trust the filesystem's executable bit, a regular file keeps
    /// whatever mode it already had in the cache (unless that prior entry
    /// was itself a symlink, which `has_symlinks = false` also overrides).
    pub fn from_stat_with_prior(
        raw_mode: u32,
        is_symlink: bool,
        is_gitlink: bool,
        is_dir: bool,
        prior: Option<FileMode>,
        trust_executable_bit: bool,
        has_symlinks: bool,
    ) -> Self {
        if !has_symlinks && !is_symlink && matches!(prior, Some(FileMode::Symlink)) {
            return FileMode::Symlink;
        }
        if !trust_executable_bit && !is_symlink && !is_gitlink && !is_dir {
            if let Some(prior_mode @ (FileMode::Regular | FileMode::Executable)) = prior {
                return prior_mode;
            }
            return FileMode::Regular;
        }
        Self::canon(raw_mode, is_symlink, is_gitlink, is_dir)
    }
}

/// Parse an octal ASCII string to u32.
fn parse_octal(s: &[u8]) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut val: u32 = 0;
    for &b in s {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        val = val.checked_mul(8)?.checked_add(u32::from(b - b'0'))?;
    }
    Some(val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_mode_from_bytes() {
        assert_eq!(FileMode::from_bytes(b"100644").unwrap(), FileMode::Regular);
        assert_eq!(
            FileMode::from_bytes(b"100755").unwrap(),
            FileMode::Executable
        );
        assert_eq!(FileMode::from_bytes(b"120000").unwrap(), FileMode::Symlink);
        assert_eq!(FileMode::from_bytes(b"160000").unwrap(), FileMode::Gitlink);
        assert_eq!(FileMode::from_bytes(b"40000").unwrap(), FileMode::Tree);
    }

    #[test]
    fn file_mode_roundtrip() {
        for mode in [
            FileMode::Regular,
            FileMode::Executable,
            FileMode::Symlink,
            FileMode::Gitlink,
            FileMode::Tree,
        ] {
            let bytes = mode.as_bytes();
            let parsed = FileMode::from_bytes(&bytes).unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn file_mode_predicates() {
        assert!(FileMode::Tree.is_tree());
        assert!(!FileMode::Regular.is_tree());
        assert!(FileMode::Regular.is_blob());
        assert!(FileMode::Executable.is_blob());
        assert!(!FileMode::Tree.is_blob());
        assert!(FileMode::Symlink.is_symlink());
        assert!(FileMode::Gitlink.is_gitlink());
    }

    #[test]
    fn canon_mode_regular_vs_executable() {
        assert_eq!(
            FileMode::canon(0o100644, false, false, false),
            FileMode::Regular
        );
        assert_eq!(
            FileMode::canon(0o100755, false, false, false),
            FileMode::Executable
        );
    }

    #[test]
    fn canon_mode_symlink_and_gitlink_pass_through() {
        assert_eq!(FileMode::canon(0, true, false, false), FileMode::Symlink);
        assert_eq!(FileMode::canon(0, false, true, false), FileMode::Gitlink);
    }

    #[test]
    fn untrusted_executable_bit_keeps_prior_mode() {
        let got = FileMode::from_stat_with_prior(
            0o100755,
            false,
            false,
            false,
            Some(FileMode::Regular),
            false,
            true,
        );
        assert_eq!(got, FileMode::Regular);
    }

    #[test]
    fn untrusted_executable_bit_no_prior_defaults_regular() {
        let got =
            FileMode::from_stat_with_prior(0o100755, false, false, false, None, false, true);
        assert_eq!(got, FileMode::Regular);
    }

    #[test]
    fn no_symlinks_support_keeps_prior_symlink_mode() {
        let got = FileMode::from_stat_with_prior(
            0o100644,
            false,
            false,
            false,
            Some(FileMode::Symlink),
            true,
            false,
        );
        assert_eq!(got, FileMode::Symlink);
    }
}
