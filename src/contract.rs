//! The caller side: a typed binding over the exported functions.

use std::marker::PhantomData;

use log::debug;

use crate::abi::{
    self, CChar, Int, Long, Opaque, ScalarKind, Short, Status, StatusCode, UInt, ULong, UShort,
    WideChar,
};
use crate::error::{CallError, LoaderError};
use crate::exports::{self, ObserverFn};
use crate::journal;
use crate::loader::LoadedLibrary;

type PassFn<T> = unsafe extern "C" fn(T) -> StatusCode;
type FingerprintFn = unsafe extern "C" fn() -> u64;
type SetObserverFn = unsafe extern "C" fn(Option<ObserverFn>);

#[derive(Clone, Copy)]
struct ExportTable {
    char: PassFn<CChar>,
    wide_char: PassFn<WideChar>,
    short: PassFn<Short>,
    unsigned_short: PassFn<UShort>,
    int: PassFn<Int>,
    unsigned_int: PassFn<UInt>,
    long: PassFn<Long>,
    unsigned_long: PassFn<ULong>,
    pointer: PassFn<Opaque>,
}

/// Function table for one copy of the contract, either linked into this
/// process or resolved from a [`LoadedLibrary`].
///
/// Every call is synchronous and independent of the others.
#[derive(Clone, Copy)]
pub struct Contract<'lib> {
    table: ExportTable,
    _library: PhantomData<&'lib LoadedLibrary>,
}

impl Contract<'static> {
    /// Binds the exports compiled into the current binary.
    pub fn linked() -> Self {
        Self {
            table: ExportTable {
                char: exports::sb_pass_char,
                wide_char: exports::sb_pass_wide_char,
                short: exports::sb_pass_short,
                unsigned_short: exports::sb_pass_unsigned_short,
                int: exports::sb_pass_int,
                unsigned_int: exports::sb_pass_unsigned_int,
                long: exports::sb_pass_long,
                unsigned_long: exports::sb_pass_unsigned_long,
                pointer: exports::sb_pass_pointer,
            },
            _library: PhantomData,
        }
    }
}

impl<'lib> Contract<'lib> {
    /// Resolves every export from `library` after checking that it was
    /// built with the same widths as this caller.
    ///
    /// The library's observer is pointed at this process, so values it
    /// receives show up in [`journal::capture`] and in this process's log.
    pub fn bind(library: &'lib LoadedLibrary) -> Result<Self, LoaderError> {
        // SAFETY: signatures below are the ones declared in `exports`; the
        // fingerprint check rejects libraries built with other widths.
        unsafe {
            let fingerprint: FingerprintFn = library.symbol("sb_abi_fingerprint")?;
            let found = fingerprint();
            let expected = abi::fingerprint();
            if found != expected {
                return Err(LoaderError::AbiMismatch { expected, found });
            }

            let set_observer: SetObserverFn = library.symbol("sb_set_observer")?;
            set_observer(Some(journal::forward));

            let table = ExportTable {
                char: library.symbol(ScalarKind::Char.symbol())?,
                wide_char: library.symbol(ScalarKind::WideChar.symbol())?,
                short: library.symbol(ScalarKind::Short.symbol())?,
                unsigned_short: library.symbol(ScalarKind::UnsignedShort.symbol())?,
                int: library.symbol(ScalarKind::Int.symbol())?,
                unsigned_int: library.symbol(ScalarKind::UnsignedInt.symbol())?,
                long: library.symbol(ScalarKind::Long.symbol())?,
                unsigned_long: library.symbol(ScalarKind::UnsignedLong.symbol())?,
                pointer: library.symbol(ScalarKind::Pointer.symbol())?,
            };
            debug!("bound contract from {}", library.path().display());

            Ok(Self {
                table,
                _library: PhantomData,
            })
        }
    }

    pub fn pass_char(&self, value: CChar) -> Result<(), CallError> {
        check(ScalarKind::Char, unsafe { (self.table.char)(value) })
    }

    pub fn pass_wide_char(&self, value: WideChar) -> Result<(), CallError> {
        check(ScalarKind::WideChar, unsafe { (self.table.wide_char)(value) })
    }

    pub fn pass_short(&self, value: Short) -> Result<(), CallError> {
        check(ScalarKind::Short, unsafe { (self.table.short)(value) })
    }

    pub fn pass_unsigned_short(&self, value: UShort) -> Result<(), CallError> {
        check(ScalarKind::UnsignedShort, unsafe {
            (self.table.unsigned_short)(value)
        })
    }

    pub fn pass_int(&self, value: Int) -> Result<(), CallError> {
        check(ScalarKind::Int, unsafe { (self.table.int)(value) })
    }

    pub fn pass_unsigned_int(&self, value: UInt) -> Result<(), CallError> {
        check(ScalarKind::UnsignedInt, unsafe {
            (self.table.unsigned_int)(value)
        })
    }

    pub fn pass_long(&self, value: Long) -> Result<(), CallError> {
        check(ScalarKind::Long, unsafe { (self.table.long)(value) })
    }

    pub fn pass_unsigned_long(&self, value: ULong) -> Result<(), CallError> {
        check(ScalarKind::UnsignedLong, unsafe {
            (self.table.unsigned_long)(value)
        })
    }

    /// The callee only sees the address; `value` may point anywhere.
    pub fn pass_pointer(&self, value: Opaque) -> Result<(), CallError> {
        check(ScalarKind::Pointer, unsafe { (self.table.pointer)(value) })
    }
}

fn check(kind: ScalarKind, code: StatusCode) -> Result<(), CallError> {
    match Status::from_code(code) {
        Status::Ok => Ok(()),
        status => Err(CallError { kind, status }),
    }
}
