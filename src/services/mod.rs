//! External services used by the catalog.

pub mod ffprobe;
pub mod prober;

pub use ffprobe::FfprobeProber;
pub use prober::MediaProber;
