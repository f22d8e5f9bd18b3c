//! Raw video frames in cairo's native ARGB32 layout.

use std::{fmt, io::Write, sync::Arc};

use cairo::{Format, ImageSurface};

use super::types::MediaError;

/// A single video frame.
///
/// Pixels are premultiplied ARGB32 in native endianness, the layout cairo
/// uses for [`Format::ARgb32`], so frames can be painted without conversion.
/// The pixel buffer is shared; cloning a frame is cheap.
#[derive(Clone)]
pub struct VideoFrame {
    width: u32,
    height: u32,
    stride: u32,
    data: Arc<[u8]>,
}

impl VideoFrame {
    /// Wraps an ARGB32 pixel buffer.
    ///
    /// # Errors
    /// Returns [`MediaError::Frame`] if the buffer is shorter than `stride * height`
    /// or the stride cannot hold `width` pixels.
    pub fn from_argb32(
        width: u32,
        height: u32,
        stride: u32,
        data: Vec<u8>,
    ) -> Result<Self, MediaError> {
        if (stride as usize) < width as usize * 4 {
            return Err(MediaError::Frame(format!(
                "stride {} too small for width {}",
                stride, width
            )));
        }
        let needed = stride as usize * height as usize;
        if data.len() < needed {
            return Err(MediaError::Frame(format!(
                "buffer holds {} bytes, {}x{} frame needs {}",
                data.len(),
                width,
                height,
                needed
            )));
        }

        Ok(Self {
            width,
            height,
            stride,
            data: data.into(),
        })
    }

    /// Copies the pixels out of a finished cairo image surface.
    pub fn from_surface(mut surface: ImageSurface) -> Result<Self, MediaError> {
        surface.flush();
        let width = surface.width().max(0) as u32;
        let height = surface.height().max(0) as u32;
        let stride = surface.stride().max(0) as u32;
        let data = surface
            .data()
            .map_err(|e| MediaError::Frame(format!("surface pixels unavailable: {}", e)))?
            .to_vec();
        Self::from_argb32(width, height, stride, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the premultiplied `0xAARRGGBB` value at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride as usize + x as usize * 4;
        let bytes: [u8; 4] = self.data.get(offset..offset + 4)?.try_into().ok()?;
        Some(u32::from_ne_bytes(bytes))
    }

    /// Creates a cairo surface holding a copy of this frame.
    pub fn to_surface(&self) -> Result<ImageSurface, MediaError> {
        let surface = ImageSurface::create_for_data(
            self.data.to_vec(),
            Format::ARgb32,
            self.width as i32,
            self.height as i32,
            self.stride as i32,
        )?;
        Ok(surface)
    }

    /// Encodes the frame as PNG.
    pub fn write_png<W: Write>(&self, writer: &mut W) -> Result<(), MediaError> {
        let surface = self.to_surface()?;
        surface
            .write_to_png(writer)
            .map_err(|e| MediaError::Frame(format!("PNG encoding failed: {}", e)))
    }
}

impl fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .finish()
    }
}
