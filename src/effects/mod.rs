pub mod contours;
pub mod raster;

mod skeleton;
mod spatial_canvas;
mod time_rift;
mod void_mask;

pub use skeleton::SkeletonOverlay;
pub use spatial_canvas::SpatialCanvas;
pub use time_rift::TimeRift;
pub use void_mask::VoidMask;

use crate::{
    interpret::Signals,
    types::{EffectKind, Frame, TrackedFrame},
};

/// One switchable camera effect. `render` is the per-frame compositing
/// operation: it mutates the frame in place, best effort. A missing
/// detection just skips the corresponding overlay.
pub trait Effect: Send {
    fn kind(&self) -> EffectKind;

    fn render(&mut self, frame: &mut Frame, tracked: Option<&TrackedFrame>, signals: &Signals);

    /// Short state description for the status bar.
    fn status(&self) -> Option<String> {
        None
    }

    /// Drops persistent buffers, e.g. after a resolution change.
    fn reset(&mut self) {}
}

pub fn create(kind: EffectKind) -> Box<dyn Effect> {
    match kind {
        EffectKind::Skeleton => Box::new(SkeletonOverlay::new()),
        EffectKind::TimeRift => Box::new(TimeRift::new()),
        EffectKind::VoidMask => Box::new(VoidMask::new()),
        EffectKind::SpatialCanvas => Box::new(SpatialCanvas::new()),
    }
}
