use std::str::FromStr;

/// Raw pixel layouts accepted by the bridge.
///
/// Every frame pushed through the bridge is already uncompressed; this
/// enum only describes how its bytes are laid out across planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Packed RGBA, one plane, 4 bytes per pixel.
    Rgba,
    /// Planar YUV 4:2:0 (I420): full-resolution Y plane followed by
    /// quarter-resolution U and V planes, 1 byte per sample.
    Yuv420p,
    /// Semi-planar 4:2:0: full-resolution Y plane followed by one
    /// interleaved UV plane at half vertical resolution. The UV row is
    /// `width` bytes wide (two chroma samples per paired luma column).
    Nv12,
}

/// Tight geometry of a single plane: payload bytes per row and row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneSpec {
    pub row_bytes: usize,
    pub rows: usize,
}

impl PixelFormat {
    pub fn plane_count(self) -> usize {
        match self {
            PixelFormat::Rgba => 1,
            PixelFormat::Yuv420p => 3,
            PixelFormat::Nv12 => 2,
        }
    }

    /// 4:2:0 formats subsample chroma and need even dimensions.
    pub fn is_subsampled(self) -> bool {
        match self {
            PixelFormat::Rgba => false,
            PixelFormat::Yuv420p | PixelFormat::Nv12 => true,
        }
    }

    /// Tight per-plane geometry for a frame of the given dimensions.
    pub fn plane_specs(self, width: u32, height: u32) -> Vec<PlaneSpec> {
        let w = width as usize;
        let h = height as usize;
        match self {
            PixelFormat::Rgba => vec![PlaneSpec {
                row_bytes: w * 4,
                rows: h,
            }],
            PixelFormat::Yuv420p => {
                let chroma = PlaneSpec {
                    row_bytes: w / 2,
                    rows: h / 2,
                };
                vec![PlaneSpec { row_bytes: w, rows: h }, chroma, chroma]
            }
            PixelFormat::Nv12 => vec![
                PlaneSpec { row_bytes: w, rows: h },
                PlaneSpec {
                    row_bytes: w,
                    rows: h / 2,
                },
            ],
        }
    }

    /// Minimum byte length of a tightly packed frame.
    pub fn min_frame_len(self, width: u32, height: u32) -> usize {
        self.plane_specs(width, height)
            .iter()
            .map(|p| p.row_bytes * p.rows)
            .sum()
    }

    /// Historical creation flag: `rgba: true` selected the packed RGBA
    /// pipeline, `rgba: false` the NV12 one. Preserved verbatim for
    /// existing callers; an explicit format name always wins over this.
    pub fn from_legacy_rgba_flag(rgba: bool) -> Self {
        if rgba { PixelFormat::Rgba } else { PixelFormat::Nv12 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pixel format: {0:?}")]
pub struct UnknownPixelFormat(pub String);

impl FromStr for PixelFormat {
    type Err = UnknownPixelFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgba" => Ok(PixelFormat::Rgba),
            "yuv420p" | "i420" => Ok(PixelFormat::Yuv420p),
            "nv12" => Ok(PixelFormat::Nv12),
            _ => Err(UnknownPixelFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelFormat::Rgba => "rgba",
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Nv12 => "nv12",
        };
        f.write_str(name)
    }
}
