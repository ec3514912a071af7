//! Serialised environment-variable mutation for tests.
//!
//! Every mutation takes a process-wide re-entrant lock and returns a guard
//! that puts the variable back (or removes it again) on drop. Guards for the
//! same key restore in LIFO order. Use [`lock`] or [`scope_with`] when a test
//! needs several mutations to happen without interleaving, such as clearing
//! every `DATASOURCE_` override before loading registry configuration.
//!
//! # Examples
//!
//! ```
//! use test_helpers::env;
//!
//! let _g = env::set_var("DATASOURCE_BASE_DIR", "/srv/conf");
//! assert_eq!(std::env::var("DATASOURCE_BASE_DIR").as_deref(), Ok("/srv/conf"));
//! ```

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::LazyLock;

static ENV_MUTEX: LazyLock<ReentrantMutex<()>> = LazyLock::new(ReentrantMutex::default);

fn write_var(key: &str, value: Option<&OsStr>) {
    let _guard = ENV_MUTEX.lock();
    match value {
        // SAFETY: `ENV_MUTEX` serialises every mutation made through this module.
        Some(value) => unsafe { std::env::set_var(key, value) },
        // SAFETY: as above.
        None => unsafe { std::env::remove_var(key) },
    }
}

fn replace_var(key: String, value: Option<&OsStr>) -> EnvVarGuard {
    let _guard = ENV_MUTEX.lock();
    let original = std::env::var_os(&key);
    write_var(&key, value);
    EnvVarGuard { key, original }
}

/// Restores one environment variable to its prior state on drop.
#[must_use = "dropping restores the prior value"]
pub struct EnvVarGuard {
    key: String,
    original: Option<OsString>,
}

impl fmt::Debug for EnvVarGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvVarGuard")
            .field("key", &self.key)
            .field("had_original", &self.original.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        write_var(&self.key, self.original.as_deref());
    }
}

/// Holds the environment lock for its lifetime.
#[must_use = "dropping releases the environment lock"]
pub struct EnvVarLock {
    _guard: ReentrantMutexGuard<'static, ()>,
}

impl EnvVarLock {
    /// Set `key` while holding the lock.
    pub fn set_var(&self, key: impl Into<String>, value: impl AsRef<OsStr>) -> EnvVarGuard {
        replace_var(key.into(), Some(value.as_ref()))
    }

    /// Remove `key` while holding the lock.
    pub fn remove_var(&self, key: impl Into<String>) -> EnvVarGuard {
        replace_var(key.into(), None)
    }
}

/// Keeps the lock and a set of guards alive together.
#[must_use = "dropping restores the guards and releases the lock"]
pub struct EnvScope {
    guards: Vec<EnvVarGuard>,
    _lock: EnvVarLock,
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        // Restore while `_lock` is still held.
        self.guards.clear();
    }
}

/// Set `key` to `value`, returning a guard that restores the prior value.
///
/// ```
/// use test_helpers::env;
/// let _g = env::set_var("DS_HELPERS_DOC", "bar");
/// assert_eq!(std::env::var("DS_HELPERS_DOC").as_deref(), Ok("bar"));
/// ```
pub fn set_var(key: impl Into<String>, value: impl AsRef<OsStr>) -> EnvVarGuard {
    replace_var(key.into(), Some(value.as_ref()))
}

/// Remove `key`, returning a guard that restores the prior value.
pub fn remove_var(key: impl Into<String>) -> EnvVarGuard {
    replace_var(key.into(), None)
}

/// Acquire the environment lock.
pub fn lock() -> EnvVarLock {
    EnvVarLock {
        _guard: ENV_MUTEX.lock(),
    }
}

/// Run `builder` under the lock and keep the lock until the scope drops.
///
/// ```
/// use test_helpers::env;
///
/// let _scope = env::scope_with(|lock| vec![lock.remove_var("FOO")]);
/// ```
pub fn scope_with<F>(builder: F) -> EnvScope
where
    F: FnOnce(&EnvVarLock) -> Vec<EnvVarGuard>,
{
    let lock = lock();
    let guards = builder(&lock);
    EnvScope {
        guards,
        _lock: lock,
    }
}

/// Remove every variable whose name starts with `prefix` for the lifetime of
/// the returned scope.
///
/// ```
/// use test_helpers::env;
///
/// let _g = env::set_var("DS_HELPERS_PREFIX_A", "1");
/// {
///     let _scope = env::clear_prefixed("DS_HELPERS_PREFIX_");
///     assert!(std::env::var("DS_HELPERS_PREFIX_A").is_err());
/// }
/// assert_eq!(std::env::var("DS_HELPERS_PREFIX_A").as_deref(), Ok("1"));
/// ```
pub fn clear_prefixed(prefix: &str) -> EnvScope {
    scope_with(|lock| {
        std::env::vars_os()
            .filter_map(|(key, _)| key.into_string().ok())
            .filter(|key| key.starts_with(prefix))
            .map(|key| lock.remove_var(key))
            .collect()
    })
}
