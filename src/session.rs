//! Process-wide state shared by every entry point: the program-id and options-dump counters,
//! one-time toolchain initialisation and teardown, and one lock per API surface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, Once, OnceLock};

/// Entry-point families that serialise independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiSurface {
    Compile,
    Link,
    LinkOptionsCheck,
    KernelArgInfo,
    CompileOptionsCheck,
}

impl ApiSurface {
    pub const ALL: [ApiSurface; 5] = [
        ApiSurface::Compile,
        ApiSurface::Link,
        ApiSurface::LinkOptionsCheck,
        ApiSurface::KernelArgInfo,
        ApiSurface::CompileOptionsCheck,
    ];

    fn slot(self) -> usize {
        match self {
            ApiSurface::Compile => 0,
            ApiSurface::Link => 1,
            ApiSurface::LinkOptionsCheck => 2,
            ApiSurface::KernelArgInfo => 3,
            ApiSurface::CompileOptionsCheck => 4,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ApiSurface::Compile => "compile",
            ApiSurface::Link => "link",
            ApiSurface::LinkOptionsCheck => "check_link_options",
            ApiSurface::KernelArgInfo => "kernel_arg_info",
            ApiSurface::CompileOptionsCheck => "check_compile_options",
        }
    }
}

/// Process-lifetime state, created on first use.
#[derive(Debug)]
pub struct Session {
    program_ids: AtomicU64,
    dump_ids: AtomicU64,
    init: Once,
    teardown: Once,
    locks: [Mutex<()>; 5],
}

impl Session {
    /// A fresh session. Entry points normally share [`session`]; separate sessions keep
    /// program ids and locks independent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program_ids: AtomicU64::new(1),
            dump_ids: AtomicU64::new(0),
            init: Once::new(),
            teardown: Once::new(),
            locks: Default::default(),
        }
    }

    /// Next translation-unit id. Strictly increasing across all threads.
    pub fn next_program_id(&self) -> u64 {
        self.program_ids.fetch_add(1, Ordering::Relaxed)
    }

    /// Sequence number for the next options dump file.
    pub fn next_dump_index(&self) -> u64 {
        self.dump_ids.fetch_add(1, Ordering::Relaxed)
    }

    /// Run `init` the first time any caller asks; later calls wait for it and return.
    pub fn initialize_once(&self, init: impl FnOnce()) {
        self.init.call_once(|| {
            tracing::debug!(target: "clfe", stage = "session.init");
            init();
        });
    }

    /// Run `teardown` once, and only if initialisation has completed.
    pub fn terminate_once(&self, teardown: impl FnOnce()) {
        if !self.init.is_completed() {
            return;
        }
        self.teardown.call_once(|| {
            tracing::debug!(target: "clfe", stage = "session.teardown");
            teardown();
        });
    }

    /// Acquire the lock for `surface`. A lock poisoned by a panicking holder is reclaimed;
    /// it guards no data.
    pub fn lock(&self, surface: ApiSurface) -> MutexGuard<'_, ()> {
        self.locks[surface.slot()]
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// The process-wide session.
pub fn session() -> &'static Session {
    static SESSION: OnceLock<Session> = OnceLock::new();
    SESSION.get_or_init(Session::new)
}
