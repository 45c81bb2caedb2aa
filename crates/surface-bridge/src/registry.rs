use std::collections::HashMap;
use std::sync::Arc;

use frame_formats::{FrameData, PixelFormat, SourcePlane};
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{AllocationError, BridgeError};
use crate::host::{SurfaceHost, SurfaceId};
use crate::surface::Surface;

/// How the creation request chose its pixel format.
///
/// Historically a boolean `rgba` flag selected between the packed RGBA
/// pipeline (`true`) and NV12 (`false`); explicit format names came
/// later and always take precedence. A request carrying neither gets
/// packed RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSelection {
    Explicit(PixelFormat),
    LegacyRgbaFlag(bool),
    Default,
}

impl FormatSelection {
    pub fn resolve(self) -> PixelFormat {
        match self {
            FormatSelection::Explicit(format) => format,
            FormatSelection::LegacyRgbaFlag(rgba) => PixelFormat::from_legacy_rgba_flag(rgba),
            FormatSelection::Default => PixelFormat::Rgba,
        }
    }
}

/// Owner of every live surface, keyed by host-issued identifier.
///
/// One map for all formats; the per-surface format strategy lives in
/// the surface itself, so a lookup never has to probe multiple maps.
pub struct SurfaceRegistry {
    host: Arc<dyn SurfaceHost>,
    surfaces: RwLock<HashMap<i64, Arc<Surface>>>,
}

fn validate_dimensions(
    format: PixelFormat,
    width: u32,
    height: u32,
) -> Result<(), AllocationError> {
    let odd = width % 2 != 0 || height % 2 != 0;
    if width == 0 || height == 0 || (format.is_subsampled() && odd) {
        return Err(AllocationError::InvalidDimensions {
            format,
            width,
            height,
        });
    }
    Ok(())
}

impl SurfaceRegistry {
    pub fn new(host: Arc<dyn SurfaceHost>) -> Self {
        Self {
            host,
            surfaces: RwLock::new(HashMap::new()),
        }
    }

    pub fn host(&self) -> &Arc<dyn SurfaceHost> {
        &self.host
    }

    /// Allocate a surface and return its presentation identifier.
    ///
    /// The identifier is issued before allocation; if the host cannot
    /// satisfy the request, the identifier is retired again and the
    /// caller never sees it.
    pub fn create_surface(
        &self,
        selection: FormatSelection,
        width: u32,
        height: u32,
    ) -> Result<SurfaceId, BridgeError> {
        let format = selection.resolve();
        validate_dimensions(format, width, height)?;

        let id = self.host.register();
        let buffer = match self.host.allocate(format, width, height) {
            Ok(buffer) => buffer,
            Err(e) => {
                self.host.unregister(id);
                return Err(e.into());
            }
        };

        let surface = Arc::new(Surface::new(id, format, width, height, buffer));
        self.surfaces.write().insert(id.0, surface);
        debug!(%id, %format, width, height, "surface created");
        Ok(id)
    }

    pub fn lookup(&self, id: i64) -> Option<Arc<Surface>> {
        self.surfaces.read().get(&id).cloned()
    }

    /// Copy a contiguous frame into the surface registered under `id`.
    pub fn push_frame(&self, id: i64, frame: FrameData<'_>) -> Result<SurfaceId, BridgeError> {
        let surface = self.lookup(id).ok_or(BridgeError::NotFound(id))?;
        surface.push_frame(self.host.as_ref(), frame)?;
        Ok(surface.id())
    }

    /// Per-plane variant of [`push_frame`](Self::push_frame).
    pub fn push_planes(
        &self,
        id: i64,
        planes: &[SourcePlane<'_>],
    ) -> Result<SurfaceId, BridgeError> {
        let surface = self.lookup(id).ok_or(BridgeError::NotFound(id))?;
        surface.push_planes(self.host.as_ref(), planes)?;
        Ok(surface.id())
    }

    /// Remove the surface, release its backing buffer and retire the
    /// identifier. Unknown ids report `NotFound` but are not fatal.
    pub fn dispose(&self, id: i64) -> Result<SurfaceId, BridgeError> {
        let surface = self
            .surfaces
            .write()
            .remove(&id)
            .ok_or(BridgeError::NotFound(id))?;
        surface.dispose();
        self.host.unregister(surface.id());
        debug!(%id, "surface disposed");
        Ok(surface.id())
    }

    pub fn len(&self) -> usize {
        self.surfaces.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    fn registry() -> (Arc<MemoryHost>, SurfaceRegistry) {
        let host = Arc::new(MemoryHost::new());
        (host.clone(), SurfaceRegistry::new(host))
    }

    #[test]
    fn format_selection_precedence() {
        assert_eq!(
            FormatSelection::Explicit(PixelFormat::Yuv420p).resolve(),
            PixelFormat::Yuv420p
        );
        assert_eq!(
            FormatSelection::LegacyRgbaFlag(false).resolve(),
            PixelFormat::Nv12
        );
        assert_eq!(
            FormatSelection::LegacyRgbaFlag(true).resolve(),
            PixelFormat::Rgba
        );
        assert_eq!(FormatSelection::Default.resolve(), PixelFormat::Rgba);
    }

    #[test]
    fn odd_dimensions_rejected_for_subsampled_formats() {
        let (_, registry) = registry();
        let err = registry
            .create_surface(FormatSelection::Explicit(PixelFormat::Nv12), 65, 48)
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::Allocation(AllocationError::InvalidDimensions {
                format: PixelFormat::Nv12,
                width: 65,
                height: 48
            })
        );
        // Packed RGBA has no subsampling constraint.
        assert!(registry
            .create_surface(FormatSelection::Explicit(PixelFormat::Rgba), 65, 47)
            .is_ok());
    }

    #[test]
    fn zero_dimensions_rejected_for_every_format() {
        let (_, registry) = registry();
        for format in [PixelFormat::Rgba, PixelFormat::Yuv420p, PixelFormat::Nv12] {
            assert!(registry
                .create_surface(FormatSelection::Explicit(format), 0, 48)
                .is_err());
            assert!(registry
                .create_surface(FormatSelection::Explicit(format), 64, 0)
                .is_err());
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn dispose_removes_and_retires() {
        let (host, registry) = registry();
        let id = registry
            .create_surface(FormatSelection::Default, 16, 16)
            .unwrap();
        assert!(host.is_registered(id));
        assert_eq!(registry.dispose(id.0).unwrap(), id);
        assert!(!host.is_registered(id));
        assert_eq!(registry.dispose(id.0).unwrap_err(), BridgeError::NotFound(id.0));
        assert!(registry.lookup(id.0).is_none());
    }

    #[test]
    fn push_to_unknown_id_is_not_found() {
        let (_, registry) = registry();
        let data = [0u8; 16];
        assert_eq!(
            registry.push_frame(7, FrameData::tight(&data)).unwrap_err(),
            BridgeError::NotFound(7)
        );
    }
}
