use anyhow::{Result, anyhow};
use nokhwa::{Buffer, utils::FrameFormat};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

/// A decoded camera frame, RGBA byte order.
#[derive(Debug)]
pub struct DecodedFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Decodes whatever pixel format the camera produced into RGBA.
pub fn decode_camera_buffer(buffer: &Buffer) -> Result<DecodedFrame> {
    let resolution = buffer.resolution();
    let (width, height) = (resolution.width_x, resolution.height_y);
    let data = buffer.buffer();

    let rgba = match buffer.source_frame_format() {
        FrameFormat::NV12 => nv12_to_rgba(data, width, height)?,
        FrameFormat::YUYV => yuyv_to_rgba(data, width, height)?,
        FrameFormat::MJPEG => mjpeg_to_rgba(data)?,
        FrameFormat::RAWRGB => expand_rgb(data, width, height, [0, 1, 2])?,
        FrameFormat::RAWBGR => expand_rgb(data, width, height, [2, 1, 0])?,
        FrameFormat::GRAY => expand_gray(data, width, height)?,
    };

    Ok(DecodedFrame {
        rgba,
        width,
        height,
    })
}

fn check_len(data: &[u8], needed: usize, format: &str) -> Result<()> {
    if data.len() < needed {
        return Err(anyhow!(
            "{format} buffer too small: got {}, expected {needed}",
            data.len()
        ));
    }
    Ok(())
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let y_len = width as usize * height as usize;
    let uv_len = y_len / 2;
    check_len(data, y_len + uv_len, "NV12")?;

    let image = YuvBiPlanarImage {
        y_plane: &data[..y_len],
        y_stride: width,
        uv_plane: &data[y_len..y_len + uv_len],
        uv_stride: width,
        width,
        height,
    };

    let mut rgba = vec![0u8; y_len * 4];
    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12 to RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let pixels = width as usize * height as usize;
    check_len(data, pixels * 2, "YUYV")?;

    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    let mut rgba = vec![0u8; pixels * 4];
    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422 to RGBA failed: {err:?}"))?;

    Ok(rgba)
}

fn mjpeg_to_rgba(data: &[u8]) -> Result<Vec<u8>> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    if let Some(info) = decoder.info() {
        let needed = info.width as usize * info.height as usize * 4;
        if rgba.len() < needed {
            return Err(anyhow!(
                "MJPEG decode produced too few bytes: got {}, expected {needed}",
                rgba.len()
            ));
        }
    }

    Ok(rgba)
}

/// Expands 3-byte pixels to RGBA. `order` maps destination RGB channels
/// to source offsets, so BGR input passes [2, 1, 0].
fn expand_rgb(data: &[u8], width: u32, height: u32, order: [usize; 3]) -> Result<Vec<u8>> {
    let pixels = width as usize * height as usize;
    check_len(data, pixels * 3, "RGB")?;

    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_mut(4)
        .zip(data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            dst[0] = src[order[0]];
            dst[1] = src[order[1]];
            dst[2] = src[order[2]];
            dst[3] = 255;
        });

    Ok(rgba)
}

fn expand_gray(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let pixels = width as usize * height as usize;
    check_len(data, pixels, "GRAY")?;

    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_mut(4)
        .zip(data.par_iter().copied())
        .for_each(|(dst, value)| {
            dst[0] = value;
            dst[1] = value;
            dst[2] = value;
            dst[3] = 255;
        });

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_expansion_respects_channel_order() {
        let data = [10u8, 20, 30];
        let rgb = expand_rgb(&data, 1, 1, [0, 1, 2]).unwrap();
        assert_eq!(rgb, vec![10, 20, 30, 255]);

        let bgr = expand_rgb(&data, 1, 1, [2, 1, 0]).unwrap();
        assert_eq!(bgr, vec![30, 20, 10, 255]);
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert!(expand_rgb(&[1, 2], 1, 1, [0, 1, 2]).is_err());
        assert!(expand_gray(&[], 2, 2).is_err());
        assert!(nv12_to_rgba(&[0; 4], 4, 4).is_err());
    }

    #[test]
    fn gray_fans_out_to_all_channels() {
        let rgba = expand_gray(&[7, 200], 2, 1).unwrap();
        assert_eq!(rgba, vec![7, 7, 7, 255, 200, 200, 200, 255]);
    }
}
