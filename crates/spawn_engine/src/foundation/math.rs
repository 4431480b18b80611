//! Math utilities and types
//!
//! Vector types used by spatial key-values (origins, angles, bounds).

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Returns `true` if every component of `a` is less than or equal to the matching one in `b`
pub fn all_le(a: &Vec3, b: &Vec3) -> bool {
    a.iter().zip(b.iter()).all(|(lhs, rhs)| lhs <= rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_le() {
        assert!(all_le(&Vec3::new(-1.0, -1.0, -1.0), &Vec3::new(1.0, 1.0, 1.0)));
        assert!(all_le(&Vec3::zeros(), &Vec3::zeros()));
        assert!(!all_le(&Vec3::new(0.0, 2.0, 0.0), &Vec3::new(1.0, 1.0, 1.0)));
    }
}
