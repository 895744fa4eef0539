//! Dataset scanning and per-sample access.

mod classification;
mod dataset_;
mod endless;
mod image_;
mod labelmap;
mod prepare;
mod video;

pub use classification::*;
pub use dataset_::*;
pub use endless::*;
pub use labelmap::*;
pub use prepare::*;
pub use video::*;
