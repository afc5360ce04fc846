//! Fixed-width representation of every value that crosses the boundary.
//!
//! Both sides of the contract must agree on these widths bit for bit. The
//! matching declarations for C live in `c/scalarbridge.h`; the two files
//! must change together.
//!
//! Two C types are deliberately not used as-is:
//!
//! * `wchar_t` is 32 bits on Linux and macOS but 16 bits (one UTF-16 code
//!   unit) on Windows. [`WideChar`] is chosen per target at build time.
//! * `long` is 64 bits on LP64 targets but 32 bits on Windows and on 32-bit
//!   targets. [`Long`] and [`ULong`] are always 64 bits and the header uses
//!   `int64_t`/`uint64_t` to match.

use std::ffi::{c_char, c_void};
use std::fmt;
use std::mem::size_of;

use crate::error::AbiError;

/// Single byte character. Signedness follows the platform's `char`.
pub type CChar = c_char;

/// Wide character, one UTF-32 unit.
#[cfg(not(windows))]
pub type WideChar = u32;

/// Wide character, one UTF-16 code unit.
#[cfg(windows)]
pub type WideChar = u16;

pub type Short = i16;
pub type UShort = u16;
pub type Int = i32;
pub type UInt = u32;
pub type Long = i64;
pub type ULong = u64;

/// Address of caller-owned memory. The callee treats it as a token only.
pub type Opaque = *mut c_void;

/// Raw status returned by every export.
pub type StatusCode = i32;

pub const SB_OK: StatusCode = 0;
pub const SB_NULL_POINTER: StatusCode = 1;
pub const SB_INVALID_WIDE_CHAR: StatusCode = 2;

const CHAR_SIGNED: bool = CChar::MIN != 0;

/// Decoded form of a [`StatusCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NullPointer,
    InvalidWideChar,
    /// A code this side of the contract does not know about.
    Unknown(StatusCode),
}

impl Status {
    pub const fn from_code(code: StatusCode) -> Self {
        match code {
            SB_OK => Status::Ok,
            SB_NULL_POINTER => Status::NullPointer,
            SB_INVALID_WIDE_CHAR => Status::InvalidWideChar,
            other => Status::Unknown(other),
        }
    }

    pub const fn code(self) -> StatusCode {
        match self {
            Status::Ok => SB_OK,
            Status::NullPointer => SB_NULL_POINTER,
            Status::InvalidWideChar => SB_INVALID_WIDE_CHAR,
            Status::Unknown(code) => code,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::NullPointer => write!(f, "null pointer"),
            Status::InvalidWideChar => write!(f, "invalid wide character"),
            Status::Unknown(code) => write!(f, "unknown status {}", code),
        }
    }
}

/// One entry per exported function, in export table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Char,
    WideChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    Pointer,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 9] = [
        ScalarKind::Char,
        ScalarKind::WideChar,
        ScalarKind::Short,
        ScalarKind::UnsignedShort,
        ScalarKind::Int,
        ScalarKind::UnsignedInt,
        ScalarKind::Long,
        ScalarKind::UnsignedLong,
        ScalarKind::Pointer,
    ];

    /// Position in [`ScalarKind::ALL`], as reported through the observer.
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Exported symbol name.
    pub const fn symbol(self) -> &'static str {
        match self {
            ScalarKind::Char => "sb_pass_char",
            ScalarKind::WideChar => "sb_pass_wide_char",
            ScalarKind::Short => "sb_pass_short",
            ScalarKind::UnsignedShort => "sb_pass_unsigned_short",
            ScalarKind::Int => "sb_pass_int",
            ScalarKind::UnsignedInt => "sb_pass_unsigned_int",
            ScalarKind::Long => "sb_pass_long",
            ScalarKind::UnsignedLong => "sb_pass_unsigned_long",
            ScalarKind::Pointer => "sb_pass_pointer",
        }
    }

    /// Width in bytes on the current target.
    pub const fn width(self) -> usize {
        match self {
            ScalarKind::Char => size_of::<CChar>(),
            ScalarKind::WideChar => size_of::<WideChar>(),
            ScalarKind::Short => size_of::<Short>(),
            ScalarKind::UnsignedShort => size_of::<UShort>(),
            ScalarKind::Int => size_of::<Int>(),
            ScalarKind::UnsignedInt => size_of::<UInt>(),
            ScalarKind::Long => size_of::<Long>(),
            ScalarKind::UnsignedLong => size_of::<ULong>(),
            ScalarKind::Pointer => size_of::<Opaque>(),
        }
    }

    pub const fn is_signed(self) -> bool {
        match self {
            ScalarKind::Char => CHAR_SIGNED,
            ScalarKind::Short | ScalarKind::Int | ScalarKind::Long => true,
            _ => false,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Packs width and signedness of every kind into one word.
///
/// Each kind takes five bits in table order: four bits of byte width and
/// one signedness bit. Two builds agree on the fingerprint exactly when
/// they agree on every width in this module.
pub const fn fingerprint() -> u64 {
    let mut acc = 0u64;
    let mut i = 0;
    while i < ScalarKind::ALL.len() {
        let kind = ScalarKind::ALL[i];
        let entry = (kind.width() as u64 & 0xf) | ((kind.is_signed() as u64) << 4);
        acc |= entry << (i * 5);
        i += 1;
    }
    acc
}

/// Converts a character to a single wide unit for this platform.
pub fn wide_char(c: char) -> Result<WideChar, AbiError> {
    WideChar::try_from(u32::from(c)).map_err(|_| AbiError::WideCharOutOfRange(c))
}

/// Interprets a received wide unit. `None` for surrogates and values past
/// U+10FFFF.
pub fn decode_wide(unit: WideChar) -> Option<char> {
    char::from_u32(u32::from(unit))
}
