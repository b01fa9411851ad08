// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Frame encoding: one IDR slice of I_PCM macroblocks per frame.

#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

use alloc::vec::Vec;

use crate::bit_writer::BitWriter;
use crate::emulation::EmulationPreventionWriter;
use crate::frame::Frame;
use crate::headers::{MacroblockType, Pps, SliceHeader, Sps};
use crate::nal_unit::{header_byte, NalRefIdc, NalUnit, NalUnitType, START_CODE};
use crate::{Error, Result, StreamConfig};

/// Raw sample bytes per macroblock: 16x16 luma plus two 8x8 chroma blocks.
const MACROBLOCK_BYTES: usize = 16 * 16 + 2 * 8 * 8;

/// Convert input [Frame]s into H.264 NAL units.
///
/// Construction serializes every fixed byte block once: the SPS and PPS NAL
/// units, the slice header (fused with the first macroblock's type code),
/// the non-first macroblock type code, and the slice stop marker. Encoding a
/// frame then only interleaves those blocks with the frame's raw samples.
pub struct PcmEncoder {
    config: StreamConfig,
    sps: NalUnit,
    pps: NalUnit,
    slice_header_rbsp: Vec<u8>,
    macroblock_header: Vec<u8>,
    slice_stop: Vec<u8>,
}

impl PcmEncoder {
    pub fn new(config: &StreamConfig) -> Self {
        let sps = Sps::new(config);
        let pps = Pps::new(0);

        let slice_header_rbsp = SliceHeader::new().to_rbsp(&sps, &pps).data;
        let macroblock_header = MacroblockType::I_PCM.encoded_header();

        // The slice ends with rbsp_stop_one_bit, zero-padded to 0x80.
        let slice_stop = {
            let mut w = BitWriter::new();
            w.put_fixed(1, 1);
            w.into_bytes()
        };

        let sps = NalUnit::new(
            NalRefIdc::Three,
            NalUnitType::SequenceParameterSet,
            sps.to_rbsp(),
        );
        let pps = NalUnit::new(
            NalRefIdc::Three,
            NalUnitType::PictureParameterSet,
            pps.to_rbsp(),
        );

        Self {
            config: config.clone(),
            sps,
            pps,
            slice_header_rbsp,
            macroblock_header,
            slice_stop,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// The sequence parameter set NAL unit.
    pub fn sps(&self) -> &NalUnit {
        &self.sps
    }

    /// The picture parameter set NAL unit.
    pub fn pps(&self) -> &NalUnit {
        &self.pps
    }

    /// Encode one frame as a complete Annex B coded-slice NAL unit.
    ///
    /// The NAL unit is fully buffered, so writing it to a sink afterwards is
    /// all-or-nothing from the encoder's perspective.
    pub fn encode_frame(&self, frame: &Frame) -> Result<Vec<u8>> {
        if frame.width() != self.config.width() || frame.height() != self.config.height() {
            return Err(Error::DataShapeProblem {
                msg: "frame dimensions do not match stream configuration",
                #[cfg(feature = "backtrace")]
                backtrace: Backtrace::capture(),
            });
        }

        let mbs_width = self.config.mbs_width();
        let mbs_height = self.config.mbs_height();
        let num_macroblocks = mbs_width * mbs_height;

        // Payload size before stuffing; stuffing adds at most one byte per
        // two payload bytes.
        let payload = self.slice_header_rbsp.len()
            + (num_macroblocks - 1) * self.macroblock_header.len()
            + num_macroblocks * MACROBLOCK_BYTES
            + self.slice_stop.len();
        let mut nal = Vec::with_capacity(5 + payload + payload / 2);

        nal.extend_from_slice(&START_CODE);
        nal.push(header_byte(
            &NalRefIdc::Zero,
            &NalUnitType::CodedSliceOfAnIDRPicture,
        ));

        let mut ep = EmulationPreventionWriter::new(&mut nal);
        ep.put_slice(&self.slice_header_rbsp);

        for mbs_row in 0..mbs_height {
            for mbs_col in 0..mbs_width {
                if !(mbs_row == 0 && mbs_col == 0) {
                    // The first macroblock's type is fused into the slice
                    // header.
                    ep.put_slice(&self.macroblock_header);
                }
                emit_macroblock(&mut ep, frame, mbs_row, mbs_col);
            }
        }

        ep.put_slice(&self.slice_stop);

        Ok(nal)
    }
}

/// Emit one macroblock's raw I_PCM samples: 16x16 luma, then the 8x8 Cb and
/// Cr blocks, each row-major.
fn emit_macroblock(
    ep: &mut EmulationPreventionWriter<'_>,
    frame: &Frame,
    mbs_row: usize,
    mbs_col: usize,
) {
    let luma_stride = frame.width() as usize;
    copy_block(ep, frame.y(), luma_stride, mbs_row, mbs_col, 16);

    let chroma_stride = luma_stride / 2;
    copy_block(ep, frame.cb(), chroma_stride, mbs_row, mbs_col, 8);
    copy_block(ep, frame.cr(), chroma_stride, mbs_row, mbs_col, 8);
}

/// Write one `block_sz` x `block_sz` block of a plane, row by row.
#[inline]
fn copy_block(
    ep: &mut EmulationPreventionWriter<'_>,
    plane: &[u8],
    stride: usize,
    mbs_row: usize,
    mbs_col: usize,
    block_sz: usize,
) {
    for row in (mbs_row * block_sz)..((mbs_row + 1) * block_sz) {
        let row_chunk = &plane[row * stride..(row + 1) * stride];
        ep.put_slice(&row_chunk[mbs_col * block_sz..(mbs_col + 1) * block_sz]);
    }
}

#[cfg(feature = "std")]
impl PcmEncoder {
    /// Dump the hex encoding of each fixed byte block to a diagnostic sink.
    ///
    /// Informational only; the primary output is unaffected.
    pub fn write_diagnostics<W: std::io::Write>(&self, mut sink: W) -> std::io::Result<()> {
        writeln!(sink, "nal: {}", hex(&START_CODE))?;
        writeln!(sink, "sps: {}", hex(&self.sps.to_annex_b_data()[4..]))?;
        writeln!(sink, "pps: {}", hex(&self.pps.to_annex_b_data()[4..]))?;

        let mut slice = alloc::vec![header_byte(
            &NalRefIdc::Zero,
            &NalUnitType::CodedSliceOfAnIDRPicture
        )];
        slice.extend_from_slice(&crate::emulation::to_ebsp(&self.slice_header_rbsp));
        writeln!(sink, "slice: {}", hex(&slice))?;

        writeln!(sink, "mb: {}", hex(&self.macroblock_header))?;
        writeln!(sink, "stop: {}", hex(&self.slice_stop))?;
        Ok(())
    }
}

#[cfg(feature = "std")]
fn hex(data: &[u8]) -> alloc::string::String {
    use alloc::string::String;
    let mut s = String::with_capacity(data.len() * 2);
    for byte in data {
        s.push_str(&alloc::format!("{byte:02x}"));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_single_macroblock_all_zero_frame() {
        let config = StreamConfig::new(16, 16).unwrap();
        let encoder = PcmEncoder::new(&config);
        let frame = Frame::new(&config);
        let nal = encoder.encode_frame(&frame).unwrap();

        // Start code, NAL header, slice header with fused mb_type, then 384
        // zero sample bytes: the first two pass through and every further
        // zero pair is preceded by a stuffing byte.
        let mut expected = vec![
            0x00, 0x00, 0x00, 0x01, 0x05, 0x88, 0x84, 0x21, 0xa0, 0x00, 0x00,
        ];
        for _ in 0..(384 - 2) / 2 {
            expected.extend_from_slice(&[0x03, 0x00, 0x00]);
        }
        expected.push(0x80);
        assert_eq!(nal, expected);
    }

    #[test]
    fn test_two_macroblocks_round_trip() {
        let config = StreamConfig::new(32, 16).unwrap();
        let encoder = PcmEncoder::new(&config);

        // Nonzero pattern so no emulation prevention fires; decode back and
        // compare the sample bytes exactly.
        let mut frame = Frame::new(&config);
        for (i, b) in frame.y_mut().iter_mut().enumerate() {
            *b = 0x10 + (i % 0xe0) as u8;
        }
        for (i, b) in frame.cb_mut().iter_mut().enumerate() {
            *b = 0x20 + (i % 0xc0) as u8;
        }
        for (i, b) in frame.cr_mut().iter_mut().enumerate() {
            *b = 0x30 + (i % 0xc0) as u8;
        }

        let nal = encoder.encode_frame(&frame).unwrap();

        use std::ops::Deref;
        let rbsp = h264_reader::rbsp::decode_nal(&nal[4..]).unwrap();
        let rbsp = rbsp.deref();

        // slice header, first macroblock, mb_type code, second macroblock,
        // stop marker
        let mut expected = vec![0x88, 0x84, 0x21, 0xa0];
        for mb in 0..2usize {
            if mb != 0 {
                expected.extend_from_slice(&[0x0d, 0x00]);
            }
            for row in 0..16 {
                expected.extend_from_slice(&frame.y()[row * 32 + mb * 16..][..16]);
            }
            for row in 0..8 {
                expected.extend_from_slice(&frame.cb()[row * 16 + mb * 8..][..8]);
            }
            for row in 0..8 {
                expected.extend_from_slice(&frame.cr()[row * 16 + mb * 8..][..8]);
            }
        }
        expected.push(0x80);
        assert_eq!(rbsp, expected.as_slice());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let encoder = PcmEncoder::new(&StreamConfig::new(32, 16).unwrap());
        let frame = Frame::new(&StreamConfig::new(16, 16).unwrap());
        assert!(matches!(
            encoder.encode_frame(&frame),
            Err(Error::DataShapeProblem { .. })
        ));
    }

    #[test]
    fn test_diagnostics_output() {
        let config = StreamConfig::new(1280, 720).unwrap();
        let encoder = PcmEncoder::new(&config);
        let mut out = Vec::new();
        encoder.write_diagnostics(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "nal: 00000001\n\
             sps: 6742000af80a00b620\n\
             pps: 68ce3880\n\
             slice: 05888421a0\n\
             mb: 0d00\n\
             stop: 80\n"
        );
    }
}
