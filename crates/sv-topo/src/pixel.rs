use sv_core::{NEIGHBORS_8, Raster};

use crate::TopologyError;

/// Skeleton mask plus per-pixel stroke width, read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGraph {
    mask: Raster<bool>,
    widths: Raster<u32>,
}

impl PixelGraph {
    pub fn new(mask: Raster<bool>, widths: Raster<u32>) -> Result<Self, TopologyError> {
        if !mask.same_dims(&widths) {
            return Err(TopologyError::DimensionMismatch {
                mask: (mask.width(), mask.height()),
                widths: (widths.width(), widths.height()),
            });
        }
        Ok(Self { mask, widths })
    }

    /// Mask with a zero width map.
    pub fn from_mask(mask: Raster<bool>) -> Self {
        let widths = Raster::new_fill(mask.width(), mask.height(), 0);
        Self { mask, widths }
    }

    pub fn width(&self) -> usize {
        self.mask.width()
    }

    pub fn height(&self) -> usize {
        self.mask.height()
    }

    pub fn mask(&self) -> &Raster<bool> {
        &self.mask
    }

    pub fn widths(&self) -> &Raster<u32> {
        &self.widths
    }

    pub fn in_drawing(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y).copied().unwrap_or(false)
    }

    /// Stroke width at a skeleton pixel; `0` off the drawing.
    pub fn stroke_width(&self, x: usize, y: usize) -> u32 {
        if !self.in_drawing(x, y) {
            return 0;
        }
        self.widths.get(x, y).copied().unwrap_or(0)
    }

    /// Number of set 8-neighbors of `(x, y)`.
    pub fn degree(&self, x: usize, y: usize) -> u8 {
        let mut d = 0_u8;
        for (dx, dy) in NEIGHBORS_8 {
            if self
                .mask
                .get_signed(x as isize + dx, y as isize + dy)
                .copied()
                .unwrap_or(false)
            {
                d += 1;
            }
        }
        d
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelClass {
    Background,
    /// Degree-2 pixel that is chain material.
    Chain,
    /// Degree-2 pixel whose two neighbors are adjacent to each other.
    Corner,
    /// Pixel of degree `!= 2`.
    Node { degree: u8 },
}

impl PixelClass {
    pub fn is_node(self) -> bool {
        matches!(self, Self::Corner | Self::Node { .. })
    }
}

/// Classifies every pixel by its 8-neighborhood degree.
///
/// Rows are independent, so with the `parallel` feature they are classified
/// on the rayon pool.
pub fn classify_pixels(pixels: &PixelGraph) -> Raster<PixelClass> {
    let width = pixels.width();
    let mut classes = Raster::new_fill(width, pixels.height(), PixelClass::Background);
    if width == 0 {
        return classes;
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        classes
            .data_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| classify_row(pixels, y, row));
    }

    #[cfg(not(feature = "parallel"))]
    classes
        .data_mut()
        .chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| classify_row(pixels, y, row));

    classes
}

fn classify_row(pixels: &PixelGraph, y: usize, row: &mut [PixelClass]) {
    for (x, class) in row.iter_mut().enumerate() {
        if !pixels.in_drawing(x, y) {
            continue;
        }

        let degree = pixels.degree(x, y);
        *class = if degree != 2 {
            PixelClass::Node { degree }
        } else if neighbors_touch(pixels, x, y) {
            PixelClass::Corner
        } else {
            PixelClass::Chain
        };
    }
}

/// True when the two set neighbors of a degree-2 pixel are 8-adjacent.
fn neighbors_touch(pixels: &PixelGraph, x: usize, y: usize) -> bool {
    let mut found = [(0_isize, 0_isize); 2];
    let mut n = 0;
    for (dx, dy) in NEIGHBORS_8 {
        let (nx, ny) = (x as isize + dx, y as isize + dy);
        if pixels.mask.get_signed(nx, ny).copied().unwrap_or(false) {
            if n == 2 {
                return false;
            }
            found[n] = (nx, ny);
            n += 1;
        }
    }

    n == 2 && (found[0].0 - found[1].0).abs() <= 1 && (found[0].1 - found[1].1).abs() <= 1
}
