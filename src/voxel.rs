//! Voxel coordinates and the propagation neighborhood.

use nalgebra::Vector3;

/// The maximum Chebyshev hop of [`NEIGHBOR_OFFSETS`].
///
/// The propagation window must be padded by at least this many voxels on
/// every side, or the wavefront could step outside allocated storage.
pub const MAX_NEIGHBOR_HOP: i32 = 2;

/// The fixed 24-cell propagation neighborhood, as lattice offsets.
///
/// The set is the 18 face- and edge-adjacent cells (the Moore neighborhood
/// minus its 8 corners) plus the 6 cells two steps away along each principal
/// axis. This convention is used by every stage of the engine; the
/// admissibility of a propagation hop depends on it, so it must never vary.
pub const NEIGHBOR_OFFSETS: [VoxelCoord; 24] = [
    // 6 face neighbors
    VoxelCoord::new(1, 0, 0),
    VoxelCoord::new(-1, 0, 0),
    VoxelCoord::new(0, 1, 0),
    VoxelCoord::new(0, -1, 0),
    VoxelCoord::new(0, 0, 1),
    VoxelCoord::new(0, 0, -1),
    // 12 edge neighbors
    VoxelCoord::new(1, 1, 0),
    VoxelCoord::new(1, -1, 0),
    VoxelCoord::new(-1, 1, 0),
    VoxelCoord::new(-1, -1, 0),
    VoxelCoord::new(1, 0, 1),
    VoxelCoord::new(1, 0, -1),
    VoxelCoord::new(-1, 0, 1),
    VoxelCoord::new(-1, 0, -1),
    VoxelCoord::new(0, 1, 1),
    VoxelCoord::new(0, 1, -1),
    VoxelCoord::new(0, -1, 1),
    VoxelCoord::new(0, -1, -1),
    // 6 cells two steps out along the principal axes
    VoxelCoord::new(2, 0, 0),
    VoxelCoord::new(-2, 0, 0),
    VoxelCoord::new(0, 2, 0),
    VoxelCoord::new(0, -2, 0),
    VoxelCoord::new(0, 0, 2),
    VoxelCoord::new(0, 0, -2),
];

/// A discrete 3D coordinate in the infinite voxel lattice.
///
/// Uses `i32` coordinates so the grid origin can be placed anywhere in world
/// space; negative indices are first-class.
///
/// # Example
///
/// ```
/// use cf_esdf::VoxelCoord;
///
/// let coord = VoxelCoord::new(1, 2, 3);
/// assert_eq!(coord.x, 1);
///
/// let neg = VoxelCoord::new(-5, -10, -15);
/// assert_eq!(neg.y, -10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoxelCoord {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl VoxelCoord {
    /// Creates a new voxel coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Creates a coordinate at the origin (0, 0, 0).
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0, 0, 0)
    }

    /// Returns the coordinate as an array.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_esdf::VoxelCoord;
    ///
    /// assert_eq!(VoxelCoord::new(1, 2, 3).as_array(), [1, 2, 3]);
    /// ```
    #[must_use]
    pub const fn as_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Converts to a floating-point vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }

    /// Euclidean distance to another coordinate, in lattice units.
    ///
    /// Multiply by the voxel size to obtain a metric distance.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_esdf::VoxelCoord;
    ///
    /// let a = VoxelCoord::origin();
    /// let b = VoxelCoord::new(3, 4, 0);
    /// assert!((a.euclidean_distance(b) - 5.0).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn euclidean_distance(self, other: Self) -> f64 {
        (other - self).to_vector().norm()
    }

    /// Returns the 24 cells of the propagation neighborhood around this one.
    ///
    /// See [`NEIGHBOR_OFFSETS`] for the exact set.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_esdf::VoxelCoord;
    ///
    /// let neighbors = VoxelCoord::origin().neighbors();
    /// assert_eq!(neighbors.len(), 24);
    /// assert!(neighbors.contains(&VoxelCoord::new(2, 0, 0)));
    /// assert!(!neighbors.contains(&VoxelCoord::new(1, 1, 1)));
    /// ```
    #[must_use]
    pub fn neighbors(self) -> [Self; 24] {
        NEIGHBOR_OFFSETS.map(|offset| self + offset)
    }
}

impl From<(i32, i32, i32)> for VoxelCoord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl From<[i32; 3]> for VoxelCoord {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl std::ops::Add for VoxelCoord {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(
            self.x.wrapping_add(other.x),
            self.y.wrapping_add(other.y),
            self.z.wrapping_add(other.z),
        )
    }
}

impl std::ops::Sub for VoxelCoord {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(
            self.x.wrapping_sub(other.x),
            self.y.wrapping_sub(other.y),
            self.z.wrapping_sub(other.z),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_and_origin() {
        let coord = VoxelCoord::new(1, -2, 3);
        assert_eq!(coord.as_array(), [1, -2, 3]);
        assert_eq!(VoxelCoord::origin(), VoxelCoord::new(0, 0, 0));
        assert_eq!(VoxelCoord::default(), VoxelCoord::origin());
    }

    #[test]
    fn test_from_conversions() {
        let a: VoxelCoord = (1, 2, 3).into();
        let b: VoxelCoord = [1, 2, 3].into();
        assert_eq!(a, b);
    }

    #[test]
    fn test_add_sub() {
        let a = VoxelCoord::new(1, 2, 3);
        let b = VoxelCoord::new(4, 5, 6);
        assert_eq!(a + b, VoxelCoord::new(5, 7, 9));
        assert_eq!(b - a, VoxelCoord::new(3, 3, 3));
    }

    #[test]
    fn test_euclidean_distance() {
        let a = VoxelCoord::origin();
        assert_eq!(a.euclidean_distance(VoxelCoord::new(3, 4, 0)), 5.0);
        assert_eq!(a.euclidean_distance(a), 0.0);
        // symmetric
        let b = VoxelCoord::new(-2, 7, 1);
        assert_eq!(a.euclidean_distance(b), b.euclidean_distance(a));
    }

    #[test]
    fn test_neighborhood_size_and_uniqueness() {
        let neighbors = VoxelCoord::origin().neighbors();
        let unique: HashSet<_> = neighbors.iter().copied().collect();
        assert_eq!(unique.len(), 24);
        assert!(!unique.contains(&VoxelCoord::origin()));
    }

    #[test]
    fn test_neighborhood_membership() {
        let unique: HashSet<_> = VoxelCoord::origin().neighbors().iter().copied().collect();
        // faces
        assert!(unique.contains(&VoxelCoord::new(1, 0, 0)));
        assert!(unique.contains(&VoxelCoord::new(0, 0, -1)));
        // edges
        assert!(unique.contains(&VoxelCoord::new(1, -1, 0)));
        assert!(unique.contains(&VoxelCoord::new(0, 1, 1)));
        // two-step axis cells
        assert!(unique.contains(&VoxelCoord::new(0, -2, 0)));
        // corners are excluded
        assert!(!unique.contains(&VoxelCoord::new(1, 1, 1)));
        assert!(!unique.contains(&VoxelCoord::new(-1, -1, -1)));
    }

    #[test]
    fn test_neighborhood_max_hop() {
        let max_hop = NEIGHBOR_OFFSETS
            .iter()
            .map(|o| o.x.abs().max(o.y.abs()).max(o.z.abs()))
            .max()
            .unwrap();
        assert_eq!(max_hop, MAX_NEIGHBOR_HOP);
    }

    #[test]
    fn test_neighborhood_is_symmetric() {
        // every offset has its negation in the set
        let set: HashSet<_> = NEIGHBOR_OFFSETS.iter().copied().collect();
        for offset in NEIGHBOR_OFFSETS {
            assert!(set.contains(&(VoxelCoord::origin() - offset)));
        }
    }

    #[test]
    fn test_neighbors_translate() {
        let base = VoxelCoord::new(10, -20, 30);
        let neighbors = base.neighbors();
        assert!(neighbors.contains(&VoxelCoord::new(12, -20, 30)));
        assert!(neighbors.contains(&VoxelCoord::new(9, -21, 30)));
    }
}
