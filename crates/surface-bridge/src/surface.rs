use frame_formats::{FrameData, PixelFormat, SourcePlane, plan_copy, plan_copy_planes};
use parking_lot::Mutex;

use crate::error::BridgeError;
use crate::host::{SurfaceBuffer, SurfaceHost, SurfaceId};

/// One GPU-presentable surface: a backing buffer bound to a single
/// pixel format and dimensions for its whole lifetime.
///
/// The buffer lives behind a mutex that spans the frame copy *and* the
/// ready notification, so two racing pushes can never interleave rows
/// in the buffer; the later writer waits and fully overwrites
/// (latest-wins, no frame queueing).
pub struct Surface {
    id: SurfaceId,
    format: PixelFormat,
    width: u32,
    height: u32,
    buffer: Mutex<Option<Box<dyn SurfaceBuffer>>>,
}

impl Surface {
    pub(crate) fn new(
        id: SurfaceId,
        format: PixelFormat,
        width: u32,
        height: u32,
        buffer: Box<dyn SurfaceBuffer>,
    ) -> Self {
        Self {
            id,
            format,
            width,
            height,
            buffer: Mutex::new(Some(buffer)),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Copy a contiguous frame into the backing buffer and notify the
    /// host that it is ready for presentation.
    pub fn push_frame(&self, host: &dyn SurfaceHost, frame: FrameData<'_>) -> Result<(), BridgeError> {
        let plan = plan_copy(self.format, self.width, self.height, frame)?;
        self.execute(host, plan)
    }

    /// Same as [`push_frame`](Self::push_frame) for separately
    /// delivered planes.
    pub fn push_planes(
        &self,
        host: &dyn SurfaceHost,
        planes: &[SourcePlane<'_>],
    ) -> Result<(), BridgeError> {
        let plan = plan_copy_planes(self.format, self.width, self.height, planes)?;
        self.execute(host, plan)
    }

    fn execute(
        &self,
        host: &dyn SurfaceHost,
        plan: Vec<frame_formats::PlaneCopy<'_>>,
    ) -> Result<(), BridgeError> {
        let mut guard = self.buffer.lock();
        let buffer = guard
            .as_mut()
            .ok_or(BridgeError::SurfaceDisposed(self.id.0))?;
        for (plane, copy) in plan.iter().enumerate() {
            let stride = buffer.plane_stride(plane);
            copy.copy_into(buffer.plane_mut(plane), stride);
        }
        // Still under the lock: the notification must refer to the
        // frame that was just completed, not a half-written successor.
        host.frame_ready(self.id);
        Ok(())
    }

    /// Read access to the backing planes, for verification and
    /// host-side readback.
    pub fn with_planes<R>(
        &self,
        f: impl FnOnce(&dyn SurfaceBuffer) -> R,
    ) -> Result<R, BridgeError> {
        let guard = self.buffer.lock();
        let buffer = guard
            .as_ref()
            .ok_or(BridgeError::SurfaceDisposed(self.id.0))?;
        Ok(f(buffer.as_ref()))
    }

    /// Release the backing buffer. Idempotent; the buffer is dropped
    /// (and its memory returned to the host allocator) exactly once.
    pub fn dispose(&self) {
        drop(self.buffer.lock().take());
    }

    pub fn is_disposed(&self) -> bool {
        self.buffer.lock().is_none()
    }
}
