// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Associates an encoder with a writer to allow writing encoded frames.

use std::io::Write;

use crate::{Frame, PcmEncoder, Result, StreamConfig};

/// Write frames to an [std::io::Write] implementation in `.h264` file format.
///
/// Construction immediately writes the SPS and PPS NAL units, so a session
/// that encodes zero frames still yields a well-formed parameter-set-only
/// stream. Every NAL unit is buffered completely before it is written; a
/// failed write never leaves the encoder in a partial state.
pub struct H264Writer<W> {
    wtr: W,
    encoder: PcmEncoder,
}

impl<W: Write> H264Writer<W> {
    /// Create a new [H264Writer] writing a stream with the given parameters.
    pub fn new(mut wtr: W, config: &StreamConfig) -> Result<Self> {
        let encoder = PcmEncoder::new(config);
        wtr.write_all(&encoder.sps().to_annex_b_data())?;
        wtr.write_all(&encoder.pps().to_annex_b_data())?;
        Ok(Self { wtr, encoder })
    }

    /// Encode and write a frame.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let nal = self.encoder.encode_frame(frame)?;
        self.wtr.write_all(&nal)?;
        Ok(())
    }

    /// Access the encoder, e.g. for its diagnostic dump.
    pub fn encoder(&self) -> &PcmEncoder {
        &self.encoder
    }

    /// Retrieve the underlying [std::io::Write] implementation.
    pub fn into_inner(self) -> W {
        self.wtr
    }
}
