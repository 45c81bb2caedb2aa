use std::sync::Arc;

use frame_formats::FrameData;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::BridgeError;
use crate::external::ExternalBuffer;
use crate::host::SurfaceHost;
use crate::registry::{FormatSelection, SurfaceRegistry};

/// Dimensions substituted when a creation request omits them, kept from
/// the historical plugin defaults.
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

/// Arguments for `create`. `format` wins over the legacy `rgba` flag;
/// with neither present the surface is packed RGBA.
#[derive(Debug, Deserialize)]
struct CreateArgs {
    format: Option<String>,
    rgba: Option<bool>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushFrameArgs {
    texture_id: i64,
    ptr: u64,
    size: usize,
    strides: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DisposeArgs {
    texture_id: i64,
}

fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, BridgeError> {
    serde_json::from_value(args.clone()).map_err(|e| BridgeError::BadArgs(e.to_string()))
}

/// Stateless entry point routing named plugin operations to the
/// registry. Every dispatch returns a result value; malformed input is
/// rejected before any registry access, and nothing here panics on
/// caller data.
pub struct FrameBridge {
    registry: SurfaceRegistry,
}

impl FrameBridge {
    pub fn new(host: Arc<dyn SurfaceHost>) -> Self {
        Self {
            registry: SurfaceRegistry::new(host),
        }
    }

    pub fn registry(&self) -> &SurfaceRegistry {
        &self.registry
    }

    /// Handle one named operation. On success every operation echoes
    /// the surface identifier, matching the historical wire contract.
    pub fn handle(&self, method: &str, args: &Value) -> Result<i64, BridgeError> {
        match method {
            "create" => self.create(args),
            "pushFrame" => self.push_frame(args),
            "dispose" => self.dispose(args),
            other => {
                warn!(method = other, "unimplemented method");
                Err(BridgeError::Unimplemented(other.to_string()))
            }
        }
    }

    fn create(&self, args: &Value) -> Result<i64, BridgeError> {
        let args: CreateArgs = parse_args(args)?;
        let selection = match (args.format, args.rgba) {
            (Some(name), _) => FormatSelection::Explicit(
                name.parse().map_err(|e: frame_formats::UnknownPixelFormat| {
                    BridgeError::BadArgs(e.to_string())
                })?,
            ),
            (None, Some(rgba)) => FormatSelection::LegacyRgbaFlag(rgba),
            (None, None) => FormatSelection::Default,
        };
        let id = self.registry.create_surface(
            selection,
            args.width.unwrap_or(DEFAULT_WIDTH),
            args.height.unwrap_or(DEFAULT_HEIGHT),
        )?;
        Ok(id.0)
    }

    fn push_frame(&self, args: &Value) -> Result<i64, BridgeError> {
        let args: PushFrameArgs = parse_args(args)?;
        let external = ExternalBuffer::new(args.ptr, args.size)?;
        // Safety: the host plugin contract is that `ptr` addresses a
        // live allocation of at least `size` bytes for the duration of
        // this call; the slice is dropped before we return.
        let data = unsafe { external.as_slice() };
        let frame = FrameData {
            data,
            strides: args.strides.as_deref(),
        };
        let id = self.registry.push_frame(args.texture_id, frame)?;
        Ok(id.0)
    }

    fn dispose(&self, args: &Value) -> Result<i64, BridgeError> {
        let args: DisposeArgs = parse_args(args)?;
        let id = self.registry.dispose(args.texture_id)?;
        Ok(id.0)
    }
}
