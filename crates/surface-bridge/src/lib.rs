mod dispatch;
pub use dispatch::*;

mod error;
pub use error::*;

mod external;
pub use external::*;

mod host;
pub use host::*;

mod registry;
pub use registry::*;

mod surface;
pub use surface::*;

pub use frame_formats::{
    CopyError, FrameData, PixelFormat, PlaneSpec, SourcePlane, UnknownPixelFormat,
};
