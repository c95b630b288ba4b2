//! Landmark topology tables shared by the overlay effects.

/// Bone connections of the 21-point hand skeleton.
pub const HAND_CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (5, 9),
    (9, 13),
    (13, 17),
];

/// Face mesh outline, ordered clockwise from the forehead.
pub const FACE_OVAL: &[usize] = &[
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377, 152,
    148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

/// Left eye ring, ordered around the contour.
pub const LEFT_EYE: &[usize] = &[
    263, 249, 390, 373, 374, 380, 381, 382, 362, 398, 384, 385, 386, 387, 388, 466,
];

/// Right eye ring, ordered around the contour.
pub const RIGHT_EYE: &[usize] = &[
    33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
];

/// Inner lip ring.
pub const LIPS: &[usize] = &[
    78, 191, 80, 81, 82, 13, 312, 311, 310, 415, 308, 324, 318, 402, 317, 14, 87, 178, 88, 95,
];

/// Collects the named mesh points into a polyline, skipping any index
/// the tracker did not deliver.
pub fn indexed_points(points: &[(f32, f32)], indices: &[usize]) -> Vec<(f32, f32)> {
    indices
        .iter()
        .filter_map(|&idx| points.get(idx).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_connections_stay_inside_the_skeleton() {
        for &(a, b) in HAND_CONNECTIONS {
            assert!(a < 21 && b < 21);
        }
    }

    #[test]
    fn contour_rings_stay_inside_the_mesh() {
        for ring in [FACE_OVAL, LEFT_EYE, RIGHT_EYE, LIPS] {
            for &idx in ring {
                assert!(idx < 468);
            }
        }
    }

    #[test]
    fn indexed_points_skips_missing_landmarks() {
        let points = vec![(1.0, 1.0), (2.0, 2.0)];
        let collected = indexed_points(&points, &[0, 5, 1]);
        assert_eq!(collected, vec![(1.0, 1.0), (2.0, 2.0)]);
    }
}
