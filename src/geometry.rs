//! Closed-form volume and surface-area formulas for the solid shapes
//! the calculator supports.

use std::f64::consts::PI;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("{name} must be a positive number")]
    NonPositive { name: &'static str },
}

/// Computed properties of a solid. Fields that make no sense for a
/// shape (a cylinder has no space diagonal) stay `None`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolidProperties {
    pub volume: f64,
    pub lateral_area: Option<f64>,
    pub total_area: f64,
    pub diagonal: Option<f64>,
    pub slant_height: Option<f64>,
}

fn require_positive(value: f64, name: &'static str) -> Result<f64, GeometryError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(GeometryError::NonPositive { name })
    }
}

pub fn sphere(radius: f64) -> Result<SolidProperties, GeometryError> {
    let r = require_positive(radius, "radius")?;
    let surface = 4.0 * PI * r * r;
    Ok(SolidProperties {
        volume: 4.0 / 3.0 * PI * r.powi(3),
        lateral_area: None,
        total_area: surface,
        // The diameter stands in for a diagonal.
        diagonal: Some(2.0 * r),
        slant_height: None,
    })
}

pub fn cube(side: f64) -> Result<SolidProperties, GeometryError> {
    let s = require_positive(side, "side")?;
    Ok(SolidProperties {
        volume: s.powi(3),
        lateral_area: Some(4.0 * s * s),
        total_area: 6.0 * s * s,
        diagonal: Some(s * 3.0_f64.sqrt()),
        slant_height: None,
    })
}

pub fn cuboid(length: f64, width: f64, height: f64) -> Result<SolidProperties, GeometryError> {
    let l = require_positive(length, "length")?;
    let w = require_positive(width, "width")?;
    let h = require_positive(height, "height")?;
    Ok(SolidProperties {
        volume: l * w * h,
        lateral_area: Some(2.0 * h * (l + w)),
        total_area: 2.0 * (l * w + l * h + w * h),
        diagonal: Some((l * l + w * w + h * h).sqrt()),
        slant_height: None,
    })
}

pub fn cylinder(radius: f64, height: f64) -> Result<SolidProperties, GeometryError> {
    let r = require_positive(radius, "radius")?;
    let h = require_positive(height, "height")?;
    let lateral = 2.0 * PI * r * h;
    Ok(SolidProperties {
        volume: PI * r * r * h,
        lateral_area: Some(lateral),
        total_area: 2.0 * PI * r * r + lateral,
        diagonal: None,
        slant_height: None,
    })
}

pub fn hemisphere(radius: f64) -> Result<SolidProperties, GeometryError> {
    let r = require_positive(radius, "radius")?;
    let curved = 2.0 * PI * r * r;
    Ok(SolidProperties {
        volume: 2.0 / 3.0 * PI * r.powi(3),
        lateral_area: Some(curved),
        total_area: curved + PI * r * r,
        diagonal: None,
        slant_height: None,
    })
}

pub fn cone(radius: f64, height: f64) -> Result<SolidProperties, GeometryError> {
    let r = require_positive(radius, "radius")?;
    let h = require_positive(height, "height")?;
    let slant = (r * r + h * h).sqrt();
    let lateral = PI * r * slant;
    Ok(SolidProperties {
        volume: PI * r * r * h / 3.0,
        lateral_area: Some(lateral),
        total_area: PI * r * r + lateral,
        diagonal: None,
        slant_height: Some(slant),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn unit_sphere_matches_closed_form() {
        let p = sphere(1.0).unwrap();
        assert_relative_eq!(p.volume, 4.18879, epsilon = 1e-5);
        assert_relative_eq!(p.total_area, 12.56637, epsilon = 1e-5);
        assert_relative_eq!(p.diagonal.unwrap(), 2.0);
    }

    #[test]
    fn cube_of_side_two() {
        let p = cube(2.0).unwrap();
        assert_relative_eq!(p.volume, 8.0);
        assert_relative_eq!(p.total_area, 24.0);
        assert_relative_eq!(p.diagonal.unwrap(), 2.0 * 3.0_f64.sqrt());
    }

    #[test]
    fn one_two_three_cuboid() {
        let p = cuboid(1.0, 2.0, 3.0).unwrap();
        assert_relative_eq!(p.volume, 6.0);
        assert_relative_eq!(p.lateral_area.unwrap(), 18.0);
        assert_relative_eq!(p.total_area, 22.0);
        assert_relative_eq!(p.diagonal.unwrap(), 14.0_f64.sqrt());
    }

    #[test]
    fn unit_cylinder() {
        let p = cylinder(1.0, 1.0).unwrap();
        assert_relative_eq!(p.volume, PI, epsilon = 1e-9);
        assert_relative_eq!(p.lateral_area.unwrap(), 2.0 * PI, epsilon = 1e-9);
        assert_relative_eq!(p.total_area, 4.0 * PI, epsilon = 1e-9);
        assert!(p.diagonal.is_none());
    }

    #[test]
    fn unit_hemisphere() {
        let p = hemisphere(1.0).unwrap();
        assert_relative_eq!(p.volume, 2.0 / 3.0 * PI, epsilon = 1e-9);
        assert_relative_eq!(p.total_area, 3.0 * PI, epsilon = 1e-9);
    }

    #[test]
    fn three_four_five_cone() {
        let p = cone(3.0, 4.0).unwrap();
        assert_relative_eq!(p.slant_height.unwrap(), 5.0);
        assert_relative_eq!(p.volume, 12.0 * PI, epsilon = 1e-9);
        assert_relative_eq!(p.lateral_area.unwrap(), 15.0 * PI, epsilon = 1e-9);
        assert_relative_eq!(p.total_area, 24.0 * PI, epsilon = 1e-9);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-1.5)]
    #[case(f64::NAN)]
    fn non_positive_dimensions_are_rejected(#[case] bad: f64) {
        assert!(sphere(bad).is_err());
        assert!(cube(bad).is_err());
        assert!(cuboid(bad, 1.0, 1.0).is_err());
        assert!(cylinder(1.0, bad).is_err());
        assert!(hemisphere(bad).is_err());
        assert!(cone(bad, 1.0).is_err());
    }
}
