use crate::core::{Mat, MatDepth};
use crate::core::types::Size;
use crate::error::{Error, Result};

/// Bilinear resize — the only interpolation mode the pyramid driver uses.
pub fn resize_bilinear(src: &Mat, dsize: Size) -> Result<Mat> {
    if src.depth() != MatDepth::U8 {
        return Err(Error::UnsupportedOperation(
            "resize only supports U8 depth".to_string(),
        ));
    }

    if dsize.width <= 0 || dsize.height <= 0 {
        return Err(Error::InvalidDimensions(
            "destination size must be positive".to_string(),
        ));
    }

    let mut dst = Mat::new(dsize.height as usize, dsize.width as usize, src.channels(), src.depth())?;

    let x_ratio = (src.cols() - 1) as f32 / dst.cols() as f32;
    let y_ratio = (src.rows() - 1) as f32 / dst.rows() as f32;

    for dst_row in 0..dst.rows() {
        for dst_col in 0..dst.cols() {
            let src_x = dst_col as f32 * x_ratio;
            let src_y = dst_row as f32 * y_ratio;

            let x1 = src_x.floor() as usize;
            let y1 = src_y.floor() as usize;
            let x2 = (x1 + 1).min(src.cols() - 1);
            let y2 = (y1 + 1).min(src.rows() - 1);

            let dx = src_x - x1 as f32;
            let dy = src_y - y1 as f32;

            let p11 = src.at(y1, x1)?.to_vec();
            let p12 = src.at(y2, x1)?.to_vec();
            let p21 = src.at(y1, x2)?.to_vec();
            let p22 = src.at(y2, x2)?.to_vec();

            let dst_pixel = dst.at_mut(dst_row, dst_col)?;

            for ch in 0..src.channels() {
                let v11 = f32::from(p11[ch]);
                let v12 = f32::from(p12[ch]);
                let v21 = f32::from(p21[ch]);
                let v22 = f32::from(p22[ch]);

                let v1 = v11 * (1.0 - dx) + v21 * dx;
                let v2 = v12 * (1.0 - dx) + v22 * dx;
                let v = v1 * (1.0 - dy) + v2 * dy;

                dst_pixel[ch] = v.round() as u8;
            }
        }
    }

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Scalar;

    #[test]
    fn test_resize_constant_image_stays_constant() {
        let src = Mat::new_with_default(10, 10, 1, MatDepth::U8, Scalar::all(42.0)).unwrap();
        let dst = resize_bilinear(&src, Size::new(5, 5)).unwrap();
        assert_eq!(dst.rows(), 5);
        assert_eq!(dst.cols(), 5);
        for row in 0..5 {
            for col in 0..5 {
                assert_eq!(dst.at(row, col).unwrap()[0], 42);
            }
        }
    }

    #[test]
    fn test_resize_rejects_nonpositive_size() {
        let src = Mat::new(4, 4, 1, MatDepth::U8).unwrap();
        assert!(resize_bilinear(&src, Size::new(0, 4)).is_err());
    }
}
