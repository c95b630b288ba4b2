//! SSD anchor grid for the single-shot detectors.
//!
//! Both detection models share the MediaPipe anchor scheme: two anchors
//! per cell on the stride-8 feature map and six per cell on stride 16
//! (three stride-16 layers of two each, collapsed). Anchor boxes are
//! square and unit-sized, so only the normalized centers matter.

/// Normalized (cx, cy) anchor centers for a square input of `input_size`.
pub fn anchor_grid(input_size: u32) -> Vec<[f32; 2]> {
    let mut anchors = Vec::new();

    for (stride, per_cell) in [(8u32, 2usize), (16u32, 6usize)] {
        let cells = input_size.div_ceil(stride);
        for y in 0..cells {
            let cy = (y as f32 + 0.5) / cells as f32;
            for x in 0..cells {
                let cx = (x as f32 + 0.5) / cells as f32;
                for _ in 0..per_cell {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palm_grid_matches_model_anchor_count() {
        // 24*24*2 + 12*12*6
        assert_eq!(anchor_grid(192).len(), 2016);
    }

    #[test]
    fn face_grid_matches_model_anchor_count() {
        // 16*16*2 + 8*8*6
        assert_eq!(anchor_grid(128).len(), 896);
    }

    #[test]
    fn centers_are_normalized_and_cover_the_grid() {
        let anchors = anchor_grid(128);
        for [cx, cy] in &anchors {
            assert!(*cx > 0.0 && *cx < 1.0);
            assert!(*cy > 0.0 && *cy < 1.0);
        }
        // First anchor sits in the top-left stride-8 cell.
        let first = anchors[0];
        assert!((first[0] - 0.5 / 16.0).abs() < 1e-6);
        assert!((first[1] - 0.5 / 16.0).abs() < 1e-6);
    }
}
