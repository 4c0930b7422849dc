//! Process-wide registry of live lock files, used to unlink them if the
//! process dies to a signal before a `LockFile` guard's `Drop` would run.
//!
//! Mirrors the linked-list-of-`struct lock_file` design in C git's
//! `lockfile.c`/`cache.h`: every acquired lock registers itself here, and a
//! signal handler installed once per process walks the registry and
//! unlinks every still-live entry before re-raising the signal. The
//! registry only ever grows (`Vec`, append-only) so the signal handler never
//! contends with an acquirer on a realloc it didn't expect; slots are
//! retired in place by flipping their `inert` flag rather than being
//! removed.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

#[cfg(unix)]
use std::ffi::CString;

#[cfg(unix)]
struct LockSlot {
    /// Pre-converted to a C string at registration so the signal handler
    /// never allocates.
    lock_path: CString,
    inert: AtomicBool,
}

#[cfg(not(unix))]
struct LockSlot {
    inert: AtomicBool,
}

struct Registry {
    slots: Mutex<Vec<LockSlot>>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry {
        slots: Mutex::new(Vec::new()),
    })
}

/// A handle into the registry for one acquired lock. Dropping it (or
/// calling [`Handle::retire`]) marks the slot inert so the signal handler
/// skips it; the slot itself is never removed from the vector.
pub struct Handle {
    index: usize,
}

impl Handle {
    pub fn retire(self) {
        let slots = registry().slots.lock().unwrap();
        slots[self.index].inert.store(true, Ordering::SeqCst);
    }
}

/// Register a freshly created `.lock` path. Call this right after the
/// lock file's underlying fd is created, before any content is written.
#[cfg(unix)]
pub fn register(lock_path: &Path) -> Handle {
    let lock_path = CString::new(lock_path.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_else(|_| CString::new("").unwrap());
    let mut slots = registry().slots.lock().unwrap();
    slots.push(LockSlot {
        lock_path,
        inert: AtomicBool::new(false),
    });
    Handle {
        index: slots.len() - 1,
    }
}

#[cfg(not(unix))]
pub fn register(_lock_path: &Path) -> Handle {
    let mut slots = registry().slots.lock().unwrap();
    slots.push(LockSlot {
        inert: AtomicBool::new(false),
    });
    Handle {
        index: slots.len() - 1,
    }
}

/// Unlink every still-live lock file. Safe to call from a signal handler:
/// performs only `unlink(2)` syscalls on paths that were already converted
/// to `CString` at registration time, no allocation, no blocking acquire
/// that could deadlock against a handler re-entering the allocator.
#[cfg(unix)]
unsafe fn unlink_all() {
    let registry = registry();
    if let Ok(slots) = registry.slots.try_lock() {
        for slot in slots.iter() {
            if !slot.inert.load(Ordering::SeqCst) {
                libc::unlink(slot.lock_path.as_ptr());
            }
        }
    }
}

#[cfg(unix)]
extern "C" fn handle_signal(sig: std::os::raw::c_int) {
    unsafe {
        unlink_all();
        // Restore default disposition and re-raise so the process exits
        // with the conventional signal-based status instead of swallowing it.
        libc::signal(sig, libc::SIG_DFL);
        libc::raise(sig);
    }
}

static HANDLERS_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install handlers for SIGINT/SIGHUP/SIGTERM/SIGQUIT that unlink all
/// registered lock files before the process dies. Idempotent; only the
/// first call has an effect. No-op on non-Unix targets, where only the
/// normal `Drop`-based cleanup path runs.
pub fn install_signal_handlers() {
    if HANDLERS_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }
    #[cfg(unix)]
    unsafe {
        for sig in [libc::SIGINT, libc::SIGHUP, libc::SIGTERM, libc::SIGQUIT] {
            libc::signal(sig, handle_signal as libc::sighandler_t);
        }
    }
}

/// Unlink a single path immediately, bypassing the registry. Used by
/// `LockFile::commit`/`rollback`, which already know their own slot.
pub fn unlink_now(path: &Path) {
    let _ = std::fs::remove_file(path);
}
