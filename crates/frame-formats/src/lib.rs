mod copy;
pub use copy::*;

mod format;
pub use format::*;
