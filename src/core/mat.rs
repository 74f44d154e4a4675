use crate::error::{Error, Result};
use crate::core::types::Scalar;

/// Matrix type representing an image or general 2D grid of pixels.
#[derive(Debug, Clone)]
pub struct Mat {
    data: Vec<u8>,
    rows: usize,
    cols: usize,
    channels: usize,
    depth: MatDepth,
}

/// Matrix depth (element type). The detector only ever operates on `U8`
/// images; the other variants are kept so `Mat` stays a general-purpose
/// type rather than a single-purpose grayscale buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatDepth {
    U8,
    F32,
}

impl MatDepth {
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            MatDepth::U8 => 1,
            MatDepth::F32 => 4,
        }
    }
}

impl Mat {
    /// Create a new zero-filled Mat with given dimensions and channels.
    pub fn new(rows: usize, cols: usize, channels: usize, depth: MatDepth) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions(
                "Rows and columns must be greater than 0".to_string(),
            ));
        }

        let total_size = rows * cols * channels * depth.size();
        let data = vec![0u8; total_size];

        Ok(Self {
            data,
            rows,
            cols,
            channels,
            depth,
        })
    }

    /// Create a Mat filled with a scalar value (opencv-rust compatible name).
    pub fn new_with_default(
        rows: usize,
        cols: usize,
        channels: usize,
        depth: MatDepth,
        value: Scalar,
    ) -> Result<Self> {
        let mut mat = Self::new(rows, cols, channels, depth)?;
        mat.set_to(value)?;
        Ok(mat)
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[must_use]
    pub fn depth(&self) -> MatDepth {
        self.depth
    }

    /// Get pixel value at (row, col).
    pub fn at(&self, row: usize, col: usize) -> Result<&[u8]> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::OutOfRange(format!(
                "index ({row}, {col}) out of range for {}x{} matrix",
                self.rows, self.cols
            )));
        }

        let idx = (row * self.cols + col) * self.channels * self.depth.size();
        let end = idx + self.channels * self.depth.size();
        Ok(&self.data[idx..end])
    }

    /// Get mutable pixel value at (row, col).
    pub fn at_mut(&mut self, row: usize, col: usize) -> Result<&mut [u8]> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::OutOfRange(format!(
                "index ({row}, {col}) out of range for {}x{} matrix",
                self.rows, self.cols
            )));
        }

        let idx = (row * self.cols + col) * self.channels * self.depth.size();
        let end = idx + self.channels * self.depth.size();
        Ok(&mut self.data[idx..end])
    }

    /// Set all pixels to a scalar value.
    pub fn set_to(&mut self, value: Scalar) -> Result<()> {
        if self.depth != MatDepth::U8 {
            return Err(Error::UnsupportedOperation(
                "set_to only supports U8 depth".to_string(),
            ));
        }

        let num_channels = self.channels.min(4);
        for row in 0..self.rows {
            for col in 0..self.cols {
                let pixel = self.at_mut(row, col)?;
                for (ch, &val) in value.val.iter().take(num_channels).enumerate() {
                    pixel[ch] = val as u8;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mat_new() {
        let mat = Mat::new(10, 20, 1, MatDepth::U8).unwrap();
        assert_eq!(mat.rows(), 10);
        assert_eq!(mat.cols(), 20);
    }

    #[test]
    fn test_mat_at() {
        let mut mat = Mat::new(4, 4, 1, MatDepth::U8).unwrap();
        mat.at_mut(1, 2).unwrap()[0] = 200;
        assert_eq!(mat.at(1, 2).unwrap()[0], 200);
    }

    #[test]
    fn test_mat_with_default() {
        let mat = Mat::new_with_default(3, 3, 1, MatDepth::U8, Scalar::all(77.0)).unwrap();
        assert_eq!(mat.at(1, 1).unwrap()[0], 77);
    }
}
