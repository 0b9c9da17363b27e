use sv_core::Raster;

/// Parameters for the morphological thinning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuringParams {
    /// Radius of the structuring element, in pixels.
    pub radius: usize,
}

impl Default for StructuringParams {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

/// Thins a binary bitmap to one-pixel-wide centerlines.
///
/// Implementations must return a raster of the same dimensions as the input.
pub trait Skeletonizer {
    fn skeletonize(&self, binary: &Raster<bool>, params: &StructuringParams) -> Raster<bool>;
}

/// Passes the input through unchanged, for bitmaps that are already thin.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentitySkeleton;

impl Skeletonizer for IdentitySkeleton {
    fn skeletonize(&self, binary: &Raster<bool>, _params: &StructuringParams) -> Raster<bool> {
        binary.clone()
    }
}
