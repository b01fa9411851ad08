// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! uncompressed (I_PCM) H.264 Annex B stream generation
//!
//! This crate produces a minimal, standards-conformant H.264 elementary
//! bitstream in which every macroblock is coded as I_PCM, i.e. raw sample
//! bytes with no prediction, transform, quantization or entropy coding. Each
//! input frame is embedded verbatim, so any conformant decoder reproduces
//! pixel-exact output. The intended use is generating reference and test
//! vector streams where the encoder itself must be trivial to reason about.
//!
//! The stream layout is fixed: one sequence parameter set, one picture
//! parameter set, then one IDR slice per frame, each slice covering the whole
//! picture in raster-order I_PCM macroblocks. Only 8-bit 4:2:0 input is
//! supported and frame dimensions must be multiples of 16.
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(feature = "backtrace", feature(error_generic_member_access))]
#![deny(unsafe_code)]

#[cfg(not(feature = "std"))]
extern crate core as std;

extern crate alloc;
use alloc::vec::Vec;

#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

mod golomb;

mod bit_writer;
pub use bit_writer::{BitField, BitWriter};

mod emulation;
pub use emulation::EmulationPreventionWriter;

pub mod nal_unit;

mod headers;

pub mod frame;
pub use frame::Frame;

mod encoder;
pub use encoder::PcmEncoder;

#[cfg(feature = "std")]
mod writer;
#[cfg(feature = "std")]
pub use writer::H264Writer;

// Error type ----------------------

/// An H.264 encoding error.
#[derive(Debug)]
pub enum Error {
    DataShapeProblem {
        msg: &'static str,
        #[cfg(feature = "backtrace")]
        backtrace: Backtrace,
    },
    UnsupportedImageSize {
        #[cfg(feature = "backtrace")]
        backtrace: Backtrace,
    },
    #[cfg(feature = "std")]
    IoError {
        source: std::io::Error,
        #[cfg(feature = "backtrace")]
        backtrace: Backtrace,
    },
}

/// Result type for H.264 encoding.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::IoError {
            source,
            #[cfg(feature = "backtrace")]
            backtrace: Backtrace::capture(),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError {
                source,
                #[cfg(feature = "backtrace")]
                    backtrace: _,
            } => Some(source),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        match self {
            Error::DataShapeProblem {
                msg,
                #[cfg(feature = "backtrace")]
                    backtrace: _,
            } => {
                write!(f, "Frame data shape is problematic: {msg}")
            }
            Error::UnsupportedImageSize {
                #[cfg(feature = "backtrace")]
                    backtrace: _,
            } => {
                write!(
                    f,
                    "unsupported image size: width and height must be nonzero multiples of 16"
                )
            }
            #[cfg(feature = "std")]
            Error::IoError {
                source,
                #[cfg(feature = "backtrace")]
                    backtrace: _,
            } => {
                write!(f, "IO error: {source}")
            }
        }
    }
}

// Stream configuration -------------------

/// Fixed parameters of an encoding session.
///
/// Width and height are in pixels and must each be a nonzero multiple of 16
/// so that the picture divides exactly into 16x16 macroblocks (and the 4:2:0
/// chroma planes into 8x8 blocks). There is no cropping support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    width: u32,
    height: u32,
}

impl StreamConfig {
    /// Create a validated configuration.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width % 16 != 0 || height % 16 != 0 {
            return Err(Error::UnsupportedImageSize {
                #[cfg(feature = "backtrace")]
                backtrace: Backtrace::capture(),
            });
        }
        Ok(Self { width, height })
    }

    /// The frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Picture width in macroblocks.
    pub fn mbs_width(&self) -> usize {
        (self.width / 16) as usize
    }

    /// Picture height in macroblocks.
    pub fn mbs_height(&self) -> usize {
        (self.height / 16) as usize
    }

    /// Length in bytes of the luma plane.
    pub fn luma_plane_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Length in bytes of one chroma (Cb or Cr) plane.
    pub fn chroma_plane_len(&self) -> usize {
        (self.width / 2) as usize * (self.height / 2) as usize
    }

    /// Total length in bytes of one frame in planar Y, Cb, Cr layout.
    pub fn frame_len(&self) -> usize {
        self.luma_plane_len() + 2 * self.chroma_plane_len()
    }
}

/// Raw byte sequence payload (RBSP) data.
///
/// This is merely a newtype to indicate the type of data held within the
/// `Vec<u8>`.
#[derive(Clone)]
pub struct RbspData {
    /// Raw byte sequence payload (RBSP) data.
    pub data: Vec<u8>,
}

impl RbspData {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(StreamConfig::new(1280, 720).is_ok());
        assert!(StreamConfig::new(16, 16).is_ok());
        for (w, h) in [(0, 720), (1280, 0), (1281, 720), (1280, 712), (8, 16)] {
            assert!(matches!(
                StreamConfig::new(w, h),
                Err(Error::UnsupportedImageSize { .. })
            ));
        }
    }

    #[test]
    fn test_config_derived_sizes() {
        let config = StreamConfig::new(1280, 720).unwrap();
        assert_eq!(config.mbs_width(), 80);
        assert_eq!(config.mbs_height(), 45);
        assert_eq!(config.luma_plane_len(), 1280 * 720);
        assert_eq!(config.chroma_plane_len(), 640 * 360);
        assert_eq!(config.frame_len(), 1280 * 720 * 3 / 2);
    }
}
