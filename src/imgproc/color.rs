use crate::core::{Mat, MatDepth};
use crate::core::types::ColorConversionCode;
use crate::error::{Error, Result};

/// Convert color space of an image. Only grayscale reduction is kept —
/// the detector's pyramid only ever needs a single-channel input.
pub fn cvt_color(src: &Mat, dst: &mut Mat, code: ColorConversionCode) -> Result<()> {
    if src.depth() != MatDepth::U8 {
        return Err(Error::UnsupportedOperation(
            "cvt_color only supports U8 depth".to_string(),
        ));
    }

    match code {
        ColorConversionCode::BgrToGray => to_gray(src, dst, [2, 1, 0]),
        ColorConversionCode::RgbToGray => to_gray(src, dst, [0, 1, 2]),
        ColorConversionCode::BgraToGray => to_gray(src, dst, [2, 1, 0]),
        ColorConversionCode::RgbaToGray => to_gray(src, dst, [0, 1, 2]),
    }
}

/// BT.601 luma: `Y = 0.299 R + 0.587 G + 0.114 B`.
fn to_gray(src: &Mat, dst: &mut Mat, rgb_channel_order: [usize; 3]) -> Result<()> {
    if src.channels() < 3 {
        return Err(Error::InvalidParameter(
            "source must have at least 3 channels".to_string(),
        ));
    }

    *dst = Mat::new(src.rows(), src.cols(), 1, MatDepth::U8)?;

    let [ri, gi, bi] = rgb_channel_order;
    for row in 0..src.rows() {
        for col in 0..src.cols() {
            let pixel = src.at(row, col)?;
            let (r, g, b) = (pixel[ri], pixel[gi], pixel[bi]);
            let gray = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
            dst.at_mut(row, col)?[0] = gray.round() as u8;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Scalar;

    #[test]
    fn test_bgr_to_gray_constant() {
        let src = Mat::new_with_default(4, 4, 3, MatDepth::U8, Scalar::all(100.0)).unwrap();
        let mut dst = Mat::new(1, 1, 1, MatDepth::U8).unwrap();
        cvt_color(&src, &mut dst, ColorConversionCode::BgrToGray).unwrap();
        assert_eq!(dst.channels(), 1);
        assert_eq!(dst.at(0, 0).unwrap()[0], 100);
    }
}
