use frame_formats::CopyError;

/// A raw caller-owned allocation, received over the plugin boundary as
/// an integer address plus a byte length.
///
/// This is the only place in the bridge where an integer becomes a
/// reference. The borrow produced by [`as_slice`](Self::as_slice) is
/// consumed synchronously during a single dispatch call and never
/// retained; the bridge copies out of it and forgets it.
#[derive(Debug, Clone, Copy)]
pub struct ExternalBuffer {
    addr: u64,
    len: usize,
}

impl ExternalBuffer {
    /// Validate the handle. A zero address is a recoverable caller
    /// error, never a fault.
    pub fn new(addr: u64, len: usize) -> Result<Self, CopyError> {
        if addr == 0 {
            return Err(CopyError::NullAddress);
        }
        Ok(Self { addr, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrow the external bytes.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that `addr..addr + len` is a live,
    /// readable allocation for the duration of the borrow and that no
    /// one mutates it concurrently.
    pub unsafe fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.addr as *const u8, self.len) }
    }
}
