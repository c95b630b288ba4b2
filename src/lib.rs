//! riftcam: a landmark-driven webcam effects rig plus the small
//! companion utilities that grew up around it.

pub mod convert;
pub mod effects;
pub mod geometry;
pub mod interpret;
pub mod model_download;
pub mod passwords;
pub mod pipeline;
pub mod tracker;
pub mod types;
pub mod ui;
