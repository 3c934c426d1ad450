pub mod deploy;
pub mod overlays;
