//! The callee side: C ABI functions exported from the shared library.
//!
//! Every export observes its argument, logs it and returns a status code.
//! None of them keep state between calls. A caller that loaded this library
//! from another image registers an observer with [`sb_set_observer`] to see
//! what arrived, since this copy's logger and journal are not its own.

use std::sync::Mutex;

use log::{debug, warn};

use crate::abi::{
    self, CChar, Int, Long, Opaque, ScalarKind, Short, StatusCode, UInt, ULong, UShort, WideChar,
    SB_INVALID_WIDE_CHAR, SB_NULL_POINTER, SB_OK,
};
use crate::journal;

/// Receives the kind code ([`ScalarKind::code`]) and raw bits of every
/// value an export accepts.
pub type ObserverFn = extern "C" fn(kind: u32, bits: u64);

static OBSERVER: Mutex<Option<ObserverFn>> = Mutex::new(None);

fn observe(kind: ScalarKind, bits: u64) {
    journal::record(kind, bits);
    let observer = OBSERVER.lock().map(|slot| *slot).unwrap_or(None);
    if let Some(observer) = observer {
        observer(kind.code(), bits);
    }
}

macro_rules! export_scalar {
    ($name:ident, $kind:expr, $ty:ty, $bits:expr) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn $name(value: $ty) -> StatusCode {
            observe($kind, ($bits)(value));
            debug!("{}() received {:?}", stringify!($name), value);
            SB_OK
        }
    };
}

export_scalar!(sb_pass_char, ScalarKind::Char, CChar, |v: CChar| v as u8 as u64);
export_scalar!(sb_pass_short, ScalarKind::Short, Short, |v: Short| v as u16 as u64);
export_scalar!(sb_pass_unsigned_short, ScalarKind::UnsignedShort, UShort, u64::from);
export_scalar!(sb_pass_int, ScalarKind::Int, Int, |v: Int| v as u32 as u64);
export_scalar!(sb_pass_unsigned_int, ScalarKind::UnsignedInt, UInt, u64::from);
export_scalar!(sb_pass_long, ScalarKind::Long, Long, |v: Long| v as u64);
export_scalar!(sb_pass_unsigned_long, ScalarKind::UnsignedLong, ULong, |v: ULong| v);

#[unsafe(no_mangle)]
pub extern "C" fn sb_pass_wide_char(value: WideChar) -> StatusCode {
    observe(ScalarKind::WideChar, u64::from(value));
    match abi::decode_wide(value) {
        Some(c) => {
            debug!("sb_pass_wide_char() received {:?} ({:#x})", c, value);
            SB_OK
        }
        None => {
            warn!("sb_pass_wide_char() received invalid unit {:#x}", value);
            SB_INVALID_WIDE_CHAR
        }
    }
}

/// Receives a caller-owned address. The memory behind it is never touched.
#[unsafe(no_mangle)]
pub extern "C" fn sb_pass_pointer(value: Opaque) -> StatusCode {
    observe(ScalarKind::Pointer, value as usize as u64);
    if value.is_null() {
        warn!("sb_pass_pointer() received null");
        return SB_NULL_POINTER;
    }
    debug!("sb_pass_pointer() received {:p}", value);
    SB_OK
}

/// Width/signedness fingerprint of this build, see [`abi::fingerprint`].
#[unsafe(no_mangle)]
pub extern "C" fn sb_abi_fingerprint() -> u64 {
    abi::fingerprint()
}

/// Replaces the observer. `None` stops forwarding.
#[unsafe(no_mangle)]
pub extern "C" fn sb_set_observer(observer: Option<ObserverFn>) {
    if let Ok(mut slot) = OBSERVER.lock() {
        *slot = observer;
    }
}
