//! Length units for course positions.
//!
//! Forward distance along the course is carried as a [`Distance`]
//! (`Quantity<Meter>`); meter events are derived from it with
//! [`whole_meter`].

use qtty::{Meter, Quantity};

/// Forward distance along the course.
pub type Distance = Quantity<Meter>;

/// Builds a course distance from a raw meter value.
#[inline]
pub fn meters(value: f64) -> Distance {
    Distance::new(value)
}

/// Whole-meter cell containing `distance` (floor, so `-0.2 m` is cell `-1`).
pub fn whole_meter(distance: Distance) -> i64 {
    distance.value().floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_meter_floors_positive_distances() {
        assert_eq!(whole_meter(meters(0.0)), 0);
        assert_eq!(whole_meter(meters(0.99)), 0);
        assert_eq!(whole_meter(meters(1.0)), 1);
        assert_eq!(whole_meter(meters(3.7)), 3);
    }

    #[test]
    fn whole_meter_floors_negative_distances() {
        assert_eq!(whole_meter(meters(-0.2)), -1);
        assert_eq!(whole_meter(meters(-1.0)), -1);
    }
}
