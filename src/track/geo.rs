// src/track/geo.rs
//! Great-circle helpers for bearing, distance and speed

use crate::error::{Result, TrackerError};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const MPS_TO_KNOTS: f64 = 3600.0 / 1852.0;

fn check_lat_lon(name: &str, (lat, lon): (f64, f64)) -> Result<()> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(TrackerError::InvalidArgument(format!(
            "{} is not a finite (lat, lon) pair: ({}, {})",
            name, lat, lon
        )));
    }
    if lat.abs() > 90.0 || lon.abs() > 180.0 {
        return Err(TrackerError::InvalidArgument(format!(
            "{} is outside the (lat, lon) degree range: ({}, {})",
            name, lat, lon
        )));
    }
    Ok(())
}

/// Initial compass bearing from `a` to `b`, both `(lat, lon)` in degrees.
///
/// The result is measured clockwise from north and lies in `[0, 360)`.
pub fn compass_bearing(a: (f64, f64), b: (f64, f64)) -> Result<f64> {
    check_lat_lon("start point", a)?;
    check_lat_lon("end point", b)?;

    let lat_a = a.0.to_radians();
    let lat_b = b.0.to_radians();
    let diff_long = (b.1 - a.1).to_radians();

    let x = diff_long.sin() * lat_b.cos();
    let y = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * diff_long.cos();

    Ok((x.atan2(y).to_degrees() + 360.0) % 360.0)
}

/// Haversine distance in meters between two `(lat, lon)` pairs
pub fn haversine_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let lat_a = a.0.to_radians();
    let lat_b = b.0.to_radians();
    let d_lat = lat_b - lat_a;
    let d_lon = (b.1 - a.1).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

pub fn knots_from_mps(speed: f64) -> f64 {
    speed * MPS_TO_KNOTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_bearings() {
        let origin = (0.0, 0.0);
        assert!((compass_bearing(origin, (1.0, 0.0)).unwrap() - 0.0).abs() < 1e-9);
        assert!((compass_bearing(origin, (0.0, 1.0)).unwrap() - 90.0).abs() < 1e-9);
        assert!((compass_bearing(origin, (-1.0, 0.0)).unwrap() - 180.0).abs() < 1e-9);
        assert!((compass_bearing(origin, (0.0, -1.0)).unwrap() - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_range() {
        let points = [
            (45.0, 10.0),
            (45.05, 10.1),
            (44.9, 9.8),
            (-33.8, 151.2),
            (89.9, -179.9),
            (45.0, 10.0),
        ];
        for a in points.iter() {
            for b in points.iter() {
                let bearing = compass_bearing(*a, *b).unwrap();
                assert!((0.0..360.0).contains(&bearing), "bearing {} out of range", bearing);
            }
        }
    }

    #[test]
    fn test_bearing_rejects_bad_input() {
        assert!(matches!(
            compass_bearing((f64::NAN, 0.0), (1.0, 1.0)),
            Err(TrackerError::InvalidArgument(_))
        ));
        assert!(matches!(
            compass_bearing((0.0, 0.0), (91.0, 1.0)),
            Err(TrackerError::InvalidArgument(_))
        ));
        assert!(matches!(
            compass_bearing((0.0, 200.0), (1.0, 1.0)),
            Err(TrackerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let d = haversine_distance((45.0, 10.0), (46.0, 10.0));
        assert!((d - 111_195.0).abs() < 10.0, "got {}", d);
        assert_eq!(haversine_distance((45.0, 10.0), (45.0, 10.0)), 0.0);
    }

    #[test]
    fn test_knots() {
        assert!((knots_from_mps(1852.0 / 3600.0) - 1.0).abs() < 1e-12);
    }
}
