use super::{Arc, ImageBuffer, ImageFrame, RenderImage, Rgba};
use crate::types::Frame;

/// Wraps a composited RGBA frame as a GPUI render image. GPUI samples
/// BGRA, so the channels are swapped in place here rather than going
/// through the async asset pipeline.
pub(super) fn frame_to_image(frame: &Frame) -> Option<Arc<RenderImage>> {
    if !frame.is_well_formed() {
        return None;
    }

    let mut bgra = frame.rgba.clone();
    for px in bgra.chunks_exact_mut(4) {
        px.swap(0, 2);
    }

    let buffer = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(frame.width, frame.height, bgra)?;
    Some(Arc::new(RenderImage::new(vec![ImageFrame::new(buffer)])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn malformed_frames_produce_no_image() {
        let frame = Frame {
            rgba: vec![0; 3],
            width: 4,
            height: 4,
            timestamp: Instant::now(),
        };
        assert!(frame_to_image(&frame).is_none());
    }

    #[test]
    fn well_formed_frames_produce_an_image() {
        let frame = Frame {
            rgba: vec![128; 4 * 4 * 4],
            width: 4,
            height: 4,
            timestamp: Instant::now(),
        };
        assert!(frame_to_image(&frame).is_some());
    }
}
