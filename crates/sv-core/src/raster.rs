use crate::Error;

/// 8-neighborhood offsets, counter-clockwise starting at `+x`.
pub const NEIGHBORS_8: [(isize, isize); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Axis-aligned subset of [`NEIGHBORS_8`].
pub const NEIGHBORS_4: [(isize, isize); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];

#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Raster<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn same_dims<U>(&self, other: &Raster<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    /// Signed lookup; negative or past-the-edge coordinates yield `None`.
    pub fn get_signed(&self, x: isize, y: isize) -> Option<&T> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get(x as usize, y as usize)
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) -> Result<(), Error> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfBounds { x, y });
        }
        self.data[y * self.width + x] = value;
        Ok(())
    }

    #[inline]
    pub fn coords(&self, idx: usize) -> (usize, usize) {
        (idx % self.width, idx / self.width)
    }

    /// Linear index of the neighbor at `(x + dx, y + dy)`, if it is in bounds.
    #[inline]
    pub fn offset_index(&self, idx: usize, (dx, dy): (isize, isize)) -> Option<usize> {
        let (x, y) = self.coords(idx);
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if nx < 0 || ny < 0 {
            return None;
        }

        let (nxu, nyu) = (nx as usize, ny as usize);
        if nxu >= self.width || nyu >= self.height {
            return None;
        }

        Some(nyu * self.width + nxu)
    }
}

impl<T: Clone> Raster<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        let len = width.checked_mul(height).expect("raster size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }
}

impl Raster<bool> {
    /// Builds a mask from rows of text, `'#'` marking set pixels.
    ///
    /// Rows shorter than the longest row are padded with unset pixels.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let height = rows.len();
        let mut data = vec![false; width * height];
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                data[y * width + x] = c == '#';
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}
