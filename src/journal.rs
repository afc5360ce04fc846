//! Per-thread record of what the exported functions received.
//!
//! Recording only happens inside [`capture`]; outside of it the exports
//! keep no state at all.

use std::cell::RefCell;

use log::{debug, warn};

use crate::abi::ScalarKind;

/// A value as seen by the callee: raw bit pattern, zero-extended to 64 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub kind: ScalarKind,
    pub bits: u64,
}

thread_local! {
    static ACTIVE: RefCell<Option<Vec<Observation>>> = const { RefCell::new(None) };
}

pub(crate) fn record(kind: ScalarKind, bits: u64) {
    ACTIVE.with(|active| {
        if let Some(entries) = active.borrow_mut().as_mut() {
            entries.push(Observation { kind, bits });
        }
    });
}

/// Observer registered with a loaded library, so what its exports receive
/// lands in this process's journal and logger.
pub(crate) extern "C" fn forward(kind: u32, bits: u64) {
    match ScalarKind::from_code(kind) {
        Some(kind) => {
            debug!("{}() received {:#x}", kind, bits);
            record(kind, bits);
        }
        None => warn!("library reported unknown kind {} ({:#x})", kind, bits),
    }
}

/// Runs `f` and returns what the exports observed on this thread meanwhile.
///
/// Nested captures are not supported; the inner one takes over the journal
/// and the outer one sees nothing recorded while it ran.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Observation>) {
    let previous = ACTIVE.with(|active| active.borrow_mut().replace(Vec::new()));
    let result = f();
    let entries = ACTIVE.with(|active| {
        let mut active = active.borrow_mut();
        let entries = active.take().unwrap_or_default();
        *active = previous;
        entries
    });
    (result, entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_only_inside_capture() {
        record(ScalarKind::Int, 1);
        let ((), seen) = capture(|| record(ScalarKind::Int, 2));
        record(ScalarKind::Int, 3);
        assert_eq!(
            seen,
            vec![Observation {
                kind: ScalarKind::Int,
                bits: 2
            }]
        );
    }

    #[test]
    fn forwarded_observations_are_recorded() {
        let ((), seen) = capture(|| {
            forward(ScalarKind::Pointer.code(), 0x1000);
            forward(99, 1);
        });
        assert_eq!(
            seen,
            vec![Observation {
                kind: ScalarKind::Pointer,
                bits: 0x1000
            }]
        );
    }

    #[test]
    fn capture_returns_closure_result() {
        let (value, seen) = capture(|| 7);
        assert_eq!(value, 7);
        assert!(seen.is_empty());
    }
}
