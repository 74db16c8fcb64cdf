//! Axis-aligned bounds in voxel space.

use crate::voxel::VoxelCoord;

/// An inclusive axis-aligned box of voxel coordinates.
///
/// Used both for the update range derived from the change lists and for the
/// padded propagation window that bounds all wavefront work.
///
/// # Example
///
/// ```
/// use cf_esdf::{GridBounds, VoxelCoord};
///
/// let bounds = GridBounds::new(VoxelCoord::new(0, 0, 0), VoxelCoord::new(10, 10, 10));
/// assert!(bounds.contains(VoxelCoord::new(5, 5, 5)));
/// assert!(!bounds.contains(VoxelCoord::new(11, 5, 5)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridBounds {
    /// Minimum corner (inclusive).
    pub min: VoxelCoord,
    /// Maximum corner (inclusive).
    pub max: VoxelCoord,
}

impl GridBounds {
    /// Creates bounds from two corners, ordering them per axis.
    #[must_use]
    pub fn new(a: VoxelCoord, b: VoxelCoord) -> Self {
        Self {
            min: VoxelCoord::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: VoxelCoord::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates bounds containing a single voxel.
    #[must_use]
    pub const fn from_point(coord: VoxelCoord) -> Self {
        Self {
            min: coord,
            max: coord,
        }
    }

    /// Checks whether the bounds contain a coordinate.
    #[must_use]
    pub const fn contains(&self, coord: VoxelCoord) -> bool {
        coord.x >= self.min.x
            && coord.x <= self.max.x
            && coord.y >= self.min.y
            && coord.y <= self.max.y
            && coord.z >= self.min.z
            && coord.z <= self.max.z
    }

    /// Grows the bounds to include a coordinate.
    ///
    /// # Example
    ///
    /// ```
    /// use cf_esdf::{GridBounds, VoxelCoord};
    ///
    /// let mut bounds = GridBounds::from_point(VoxelCoord::new(5, 5, 5));
    /// bounds.expand_to_include(VoxelCoord::new(-1, 8, 5));
    /// assert_eq!(bounds.min, VoxelCoord::new(-1, 5, 5));
    /// assert_eq!(bounds.max, VoxelCoord::new(5, 8, 5));
    /// ```
    pub fn expand_to_include(&mut self, coord: VoxelCoord) {
        self.min = VoxelCoord::new(
            self.min.x.min(coord.x),
            self.min.y.min(coord.y),
            self.min.z.min(coord.z),
        );
        self.max = VoxelCoord::new(
            self.max.x.max(coord.x),
            self.max.y.max(coord.y),
            self.max.z.max(coord.z),
        );
    }

    /// Returns the bounds grown by `pad` voxels on every side.
    ///
    /// Each component of `pad` is applied to the matching axis.
    #[must_use]
    pub fn padded(&self, pad: VoxelCoord) -> Self {
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Returns the size of the bounds as (x, y, z) voxel counts.
    #[must_use]
    pub const fn size(&self) -> (u32, u32, u32) {
        (
            self.max.x.abs_diff(self.min.x).saturating_add(1),
            self.max.y.abs_diff(self.min.y).saturating_add(1),
            self.max.z.abs_diff(self.min.z).saturating_add(1),
        )
    }

    /// Returns the total number of voxels in the bounds.
    #[must_use]
    pub fn volume(&self) -> u64 {
        let (x, y, z) = self.size();
        u64::from(x)
            .saturating_mul(u64::from(y))
            .saturating_mul(u64::from(z))
    }

    /// Returns an iterator over every coordinate in the bounds.
    ///
    /// Iterates with X varying fastest, matching the linear voxel order
    /// inside a block.
    #[must_use]
    pub const fn iter(&self) -> GridBoundsIter {
        GridBoundsIter {
            bounds: *self,
            next: Some(self.min),
        }
    }
}

impl IntoIterator for GridBounds {
    type Item = VoxelCoord;
    type IntoIter = GridBoundsIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &GridBounds {
    type Item = VoxelCoord;
    type IntoIter = GridBoundsIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the coordinates of a [`GridBounds`].
#[derive(Debug, Clone)]
pub struct GridBoundsIter {
    bounds: GridBounds,
    next: Option<VoxelCoord>,
}

impl Iterator for GridBoundsIter {
    type Item = VoxelCoord;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        let mut next = current;
        next.x += 1;
        if next.x > self.bounds.max.x {
            next.x = self.bounds.min.x;
            next.y += 1;
            if next.y > self.bounds.max.y {
                next.y = self.bounds.min.y;
                next.z += 1;
                if next.z > self.bounds.max.z {
                    self.next = None;
                    return Some(current);
                }
            }
        }
        self.next = Some(next);

        Some(current)
    }
}
