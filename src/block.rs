use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::abi::Opaque;
use crate::error::BlockError;

/// Matches what `malloc` guarantees on common 64-bit targets.
const BLOCK_ALIGN: usize = 16;

/// Caller-owned, uninitialized heap memory handed across the boundary as an
/// opaque pointer. Released when dropped.
#[derive(Debug)]
pub struct OpaqueBlock {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl OpaqueBlock {
    pub fn allocate(len: usize) -> Result<Self, BlockError> {
        if len == 0 {
            return Err(BlockError::Empty);
        }
        let layout =
            Layout::from_size_align(len, BLOCK_ALIGN).map_err(|_| BlockError::TooLarge(len))?;

        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).ok_or(BlockError::OutOfMemory(len))?;

        Ok(Self { ptr, layout })
    }

    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Always false for a live block, since [`OpaqueBlock::allocate`] refuses
    /// zero lengths. Kept alongside [`OpaqueBlock::len`].
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    /// The pointer passed to the callee. Valid until `self` is dropped.
    pub fn as_opaque(&self) -> Opaque {
        self.ptr.as_ptr().cast()
    }

    pub fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl Drop for OpaqueBlock {
    fn drop(&mut self) {
        // SAFETY: ptr was returned by `alloc` with this exact layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}
