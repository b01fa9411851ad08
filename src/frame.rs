// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Planar 4:2:0 frame data.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

use crate::{Error, Result, StreamConfig};

/// One 8-bit 4:2:0 image with owned, unpadded planes.
///
/// The luma plane is `width * height` bytes and each chroma plane is
/// `(width / 2) * (height / 2)` bytes, row-major with no stride padding. The
/// constructors guarantee these sizes, so the encoder can slice macroblocks
/// out of the planes without further checks.
pub struct Frame {
    width: u32,
    height: u32,
    y: Vec<u8>,
    cb: Vec<u8>,
    cr: Vec<u8>,
}

impl Frame {
    /// A black (all-zero) frame with the configured dimensions.
    pub fn new(config: &StreamConfig) -> Self {
        Self {
            width: config.width(),
            height: config.height(),
            y: vec![0u8; config.luma_plane_len()],
            cb: vec![0u8; config.chroma_plane_len()],
            cr: vec![0u8; config.chroma_plane_len()],
        }
    }

    /// Build a frame from explicit plane buffers, checking their sizes.
    pub fn from_planes(
        config: &StreamConfig,
        y: Vec<u8>,
        cb: Vec<u8>,
        cr: Vec<u8>,
    ) -> Result<Self> {
        if y.len() != config.luma_plane_len() {
            return Err(Error::DataShapeProblem {
                msg: "luma plane has wrong length",
                #[cfg(feature = "backtrace")]
                backtrace: Backtrace::capture(),
            });
        }
        if cb.len() != config.chroma_plane_len() || cr.len() != config.chroma_plane_len() {
            return Err(Error::DataShapeProblem {
                msg: "chroma plane has wrong length",
                #[cfg(feature = "backtrace")]
                backtrace: Backtrace::capture(),
            });
        }
        Ok(Self {
            width: config.width(),
            height: config.height(),
            y,
            cb,
            cr,
        })
    }

    /// The frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The luma plane.
    pub fn y(&self) -> &[u8] {
        &self.y
    }

    /// The Cb chroma plane.
    pub fn cb(&self) -> &[u8] {
        &self.cb
    }

    /// The Cr chroma plane.
    pub fn cr(&self) -> &[u8] {
        &self.cr
    }

    /// Mutable luma plane, e.g. for test pattern generation.
    pub fn y_mut(&mut self) -> &mut [u8] {
        &mut self.y
    }

    /// Mutable Cb plane.
    pub fn cb_mut(&mut self) -> &mut [u8] {
        &mut self.cb
    }

    /// Mutable Cr plane.
    pub fn cr_mut(&mut self) -> &mut [u8] {
        &mut self.cr
    }

    /// Overwrite this frame with the next frame from `rdr`.
    ///
    /// The input layout is the full luma plane followed by the Cb and Cr
    /// planes. Returns `Ok(false)` on end of stream. A stream that ends in
    /// the middle of a frame is treated exactly like a clean end of stream:
    /// the partially read bytes are discarded and never encoded.
    #[cfg(feature = "std")]
    pub fn fill_from<R: std::io::Read>(&mut self, rdr: &mut R) -> Result<bool> {
        for plane in [&mut self.y, &mut self.cb, &mut self.cr] {
            match rdr.read_exact(plane) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn small_config() -> StreamConfig {
        StreamConfig::new(32, 16).unwrap()
    }

    #[test]
    fn test_from_planes_checks_sizes() {
        let config = small_config();
        assert!(Frame::from_planes(
            &config,
            vec![0; config.luma_plane_len()],
            vec![0; config.chroma_plane_len()],
            vec![0; config.chroma_plane_len()],
        )
        .is_ok());

        assert!(matches!(
            Frame::from_planes(
                &config,
                vec![0; config.luma_plane_len() - 1],
                vec![0; config.chroma_plane_len()],
                vec![0; config.chroma_plane_len()],
            ),
            Err(Error::DataShapeProblem { .. })
        ));
        assert!(matches!(
            Frame::from_planes(
                &config,
                vec![0; config.luma_plane_len()],
                vec![0; config.chroma_plane_len() + 1],
                vec![0; config.chroma_plane_len()],
            ),
            Err(Error::DataShapeProblem { .. })
        ));
    }

    #[test]
    fn test_fill_from_reads_whole_frames() {
        let config = small_config();
        let mut input = vec![7u8; config.frame_len()];
        input.extend(vec![9u8; config.frame_len()]);
        let mut rdr = Cursor::new(input);

        let mut frame = Frame::new(&config);
        assert!(frame.fill_from(&mut rdr).unwrap());
        assert!(frame.y().iter().all(|&b| b == 7));
        assert!(frame.fill_from(&mut rdr).unwrap());
        assert!(frame.cr().iter().all(|&b| b == 9));
        assert!(!frame.fill_from(&mut rdr).unwrap());
    }

    #[test]
    fn test_fill_from_discards_truncated_frame() {
        let config = small_config();
        // One full frame plus half of a second one.
        let mut input = vec![1u8; config.frame_len()];
        input.extend(vec![2u8; config.frame_len() / 2]);
        let mut rdr = Cursor::new(input);

        let mut frame = Frame::new(&config);
        assert!(frame.fill_from(&mut rdr).unwrap());
        assert!(!frame.fill_from(&mut rdr).unwrap());
    }

    #[test]
    fn test_fill_from_empty_input() {
        let config = small_config();
        let mut frame = Frame::new(&config);
        let mut rdr = Cursor::new(Vec::<u8>::new());
        assert!(!frame.fill_from(&mut rdr).unwrap());
    }
}
