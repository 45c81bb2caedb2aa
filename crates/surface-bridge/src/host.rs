use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use frame_formats::PixelFormat;
use parking_lot::Mutex;

use crate::error::AllocationError;

/// Row pitch granularity used by [`MemoryHost`]. Matches the row
/// alignment GPU upload paths commonly impose (wgpu's
/// `COPY_BYTES_PER_ROW_ALIGNMENT`), so destination strides routinely
/// differ from tight source strides.
pub const ROW_ALIGNMENT: usize = 256;

/// Opaque, process-unique handle for one presentable surface. Issued by
/// the host environment, monotonically, never reused while live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub i64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One allocated backing buffer: per-plane base memory plus the stride
/// the allocator chose. Dropping the buffer releases the backing
/// memory; that happens exactly once, when the owning surface is
/// disposed.
pub trait SurfaceBuffer: Send {
    fn plane_count(&self) -> usize;
    fn plane_stride(&self, plane: usize) -> usize;
    fn plane(&self, plane: usize) -> &[u8];
    fn plane_mut(&mut self, plane: usize) -> &mut [u8];
}

impl std::fmt::Debug for dyn SurfaceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceBuffer")
            .field("plane_count", &self.plane_count())
            .finish_non_exhaustive()
    }
}

/// Capabilities the bridge needs from its host environment: allocate a
/// format-specific surface, issue presentation identifiers, flag a new
/// frame as ready, and retire identifiers.
pub trait SurfaceHost: Send + Sync {
    fn allocate(
        &self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn SurfaceBuffer>, AllocationError>;

    /// Issue a fresh presentation identifier.
    fn register(&self) -> SurfaceId;

    /// Called after every completed frame copy; without it the
    /// compositor keeps presenting the previous frame.
    fn frame_ready(&self, id: SurfaceId);

    /// Retire an identifier. Retiring an unknown id is a no-op.
    fn unregister(&self, id: SurfaceId);
}

struct MemoryPlane {
    data: Vec<u8>,
    stride: usize,
}

/// Heap-backed [`SurfaceBuffer`] with aligned row pitch.
pub struct MemoryBuffer {
    planes: Vec<MemoryPlane>,
}

impl SurfaceBuffer for MemoryBuffer {
    fn plane_count(&self) -> usize {
        self.planes.len()
    }

    fn plane_stride(&self, plane: usize) -> usize {
        self.planes[plane].stride
    }

    fn plane(&self, plane: usize) -> &[u8] {
        &self.planes[plane].data
    }

    fn plane_mut(&mut self, plane: usize) -> &mut [u8] {
        &mut self.planes[plane].data
    }
}

#[derive(Default)]
struct HostState {
    registered: HashMap<i64, u64>,
}

/// In-process host environment: heap surfaces with GPU-style row
/// alignment and observable ready notifications. Used by the test
/// suite and as a reference for real host integrations.
pub struct MemoryHost {
    next_id: AtomicI64,
    state: Mutex<HostState>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            state: Mutex::new(HostState::default()),
        }
    }

    /// Number of frame-ready notifications seen for `id` so far.
    pub fn ready_count(&self, id: SurfaceId) -> u64 {
        self.state.lock().registered.get(&id.0).copied().unwrap_or(0)
    }

    pub fn is_registered(&self, id: SurfaceId) -> bool {
        self.state.lock().registered.contains_key(&id.0)
    }
}

impl SurfaceHost for MemoryHost {
    fn allocate(
        &self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn SurfaceBuffer>, AllocationError> {
        let planes = format
            .plane_specs(width, height)
            .into_iter()
            .map(|spec| {
                // Dimensions are caller-controlled; an unsatisfiable
                // request is an allocation error, not a fault.
                let len = spec
                    .row_bytes
                    .checked_next_multiple_of(ROW_ALIGNMENT)
                    .and_then(|stride| stride.checked_mul(spec.rows).map(|len| (stride, len)));
                match len {
                    Some((stride, len)) => Ok(MemoryPlane {
                        data: vec![0u8; len],
                        stride,
                    }),
                    None => Err(AllocationError::Host(format!(
                        "{format} surface {width}x{height} exceeds addressable memory"
                    ))),
                }
            })
            .collect::<Result<Vec<_>, AllocationError>>()?;
        Ok(Box::new(MemoryBuffer { planes }))
    }

    fn register(&self) -> SurfaceId {
        let id = SurfaceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.state.lock().registered.insert(id.0, 0);
        id
    }

    fn frame_ready(&self, id: SurfaceId) {
        if let Some(count) = self.state.lock().registered.get_mut(&id.0) {
            *count += 1;
        }
    }

    fn unregister(&self, id: SurfaceId) {
        self.state.lock().registered.remove(&id.0);
    }
}
