//! This file contains the crash memento: a process-wide record of the last
//! candidate handed to the decoder. The fault handler reads it while the
//! process is falling over, so everything in here is plain atomics in static
//! storage, no locks and no heap.
//!
//! SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicPtr, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use crate::encoder::RECORDED_LEN;
use crate::machine::DecodeConfig;

/// Config id stored before anything has been recorded
pub const NO_CONFIG: u32 = u32::MAX;

/// The memento the installed fault handler reports from
pub static MEMENTO: CrashMemento = CrashMemento::new();

/// Last submission, split into lock-free words
pub struct CrashMemento {
    lo: AtomicU64,
    hi: AtomicU64,
    config_id: AtomicU32,
    label_ptr: AtomicPtr<u8>,
    label_len: AtomicUsize,
}

/// Plain copy of the memento. Borrowing the label keeps this allocation-free
/// so the fault handler can build one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub bytes: [u8; RECORDED_LEN],
    pub config_id: u32,
    pub label: Option<&'a [u8]>,
}

impl RawRecord<'_> {
    pub fn label_str(&self) -> Option<&str> {
        self.label.and_then(|l| std::str::from_utf8(l).ok())
    }
}

impl CrashMemento {
    pub const fn new() -> Self {
        CrashMemento {
            lo: AtomicU64::new(0),
            hi: AtomicU64::new(0),
            config_id: AtomicU32::new(NO_CONFIG),
            label_ptr: AtomicPtr::new(std::ptr::null_mut()),
            label_len: AtomicUsize::new(0),
        }
    }

    /// Snapshot the head of `candidate` and the active config. Must be called
    /// before the candidate is submitted, never after
    #[inline]
    pub fn record(&self, config: &DecodeConfig, candidate: &[u8]) {
        let mut head = [0u8; RECORDED_LEN];
        let n = candidate.len().min(RECORDED_LEN);
        head[..n].copy_from_slice(&candidate[..n]);

        let (lo, hi) = head.split_at(RECORDED_LEN / 2);
        self.lo.store(u64::from_le_bytes(word(lo)), Ordering::Release);
        self.hi.store(u64::from_le_bytes(word(hi)), Ordering::Release);
        self.config_id.store(config.id, Ordering::Release);

        // Length first, the pointer store is what marks the label as present
        self.label_len.store(config.label.len(), Ordering::Release);
        self.label_ptr
            .store(config.label.as_ptr() as *mut u8, Ordering::Release);
    }

    /// Read the memento back, safe to call from a signal handler
    #[inline]
    pub fn load(&self) -> RawRecord<'static> {
        let mut bytes = [0u8; RECORDED_LEN];
        bytes[..8].copy_from_slice(&self.lo.load(Ordering::Acquire).to_le_bytes());
        bytes[8..].copy_from_slice(&self.hi.load(Ordering::Acquire).to_le_bytes());

        let ptr = self.label_ptr.load(Ordering::Acquire);
        let label = if ptr.is_null() {
            None
        } else {
            let len = self.label_len.load(Ordering::Acquire);
            // Only ever set from a `&'static str` in `record`
            Some(unsafe { std::slice::from_raw_parts(ptr as *const u8, len) })
        };

        RawRecord {
            bytes,
            config_id: self.config_id.load(Ordering::Acquire),
            label,
        }
    }
}

impl Default for CrashMemento {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn word(half: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(half);
    out
}
