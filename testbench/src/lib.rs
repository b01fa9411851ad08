//! Shared helpers for the pcm-avc integration tests and examples: test
//! pattern generation, Annex B stream splitting, and an independent walk of
//! I_PCM slice payloads for lossless comparison.

use anyhow::Result;
use pcm_avc::{Frame, StreamConfig};

pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// The fixed slice header RBSP bytes (after the NAL header byte), including
/// the fused first-macroblock type code.
pub const SLICE_HEADER_RBSP: [u8; 4] = [0x88, 0x84, 0x21, 0xa0];

/// The `mb_type` code emitted before every non-first macroblock.
pub const MACROBLOCK_HEADER: [u8; 2] = [0x0d, 0x00];

/// A frame with all three planes set to constant values.
pub fn solid_frame(config: &StreamConfig, y: u8, cb: u8, cr: u8) -> Frame {
    let mut frame = Frame::new(config);
    frame.y_mut().fill(y);
    frame.cb_mut().fill(cb);
    frame.cr_mut().fill(cr);
    frame
}

/// A deterministic test pattern with plenty of zero runs, so encoding it
/// exercises the emulation prevention path.
pub fn gradient_frame(config: &StreamConfig) -> Frame {
    let mut frame = Frame::new(config);
    for (i, b) in frame.y_mut().iter_mut().enumerate() {
        *b = match i % 7 {
            0 | 1 | 2 => 0x00,
            3 => 0x01,
            _ => (i % 251) as u8,
        };
    }
    for (i, b) in frame.cb_mut().iter_mut().enumerate() {
        *b = i as u8;
    }
    for (i, b) in frame.cr_mut().iter_mut().enumerate() {
        *b = 0xff - i as u8;
    }
    frame
}

/// Serialize a frame in the planar input layout: Y, then Cb, then Cr.
pub fn frame_to_planar(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::with_capacity(frame.y().len() + frame.cb().len() + frame.cr().len());
    out.extend_from_slice(frame.y());
    out.extend_from_slice(frame.cb());
    out.extend_from_slice(frame.cr());
    out
}

/// Split an Annex B stream into NAL units (start codes stripped).
pub fn split_annex_b(stream: &[u8]) -> Vec<&[u8]> {
    let mut starts = vec![];
    let mut i = 0;
    while i + 4 <= stream.len() {
        if stream[i..i + 4] == START_CODE {
            starts.push(i);
            i += 4;
        } else {
            i += 1;
        }
    }
    let mut units = vec![];
    for (idx, &start) in starts.iter().enumerate() {
        let end = starts.get(idx + 1).copied().unwrap_or(stream.len());
        units.push(&stream[start + 4..end]);
    }
    units
}

/// First index of a `00 00 0x` (x <= 3) window, if any.
pub fn find_forbidden_window(data: &[u8]) -> Option<usize> {
    data.windows(3)
        .position(|w| w[0] == 0x00 && w[1] == 0x00 && w[2] <= 0x03)
}

/// Walk an unescaped I_PCM slice RBSP (slice header through stop marker) and
/// reassemble the three frame planes.
pub fn decode_slice_samples(
    rbsp: &[u8],
    config: &StreamConfig,
) -> Result<(Vec<u8>, Vec<u8>, Vec<u8>)> {
    anyhow::ensure!(rbsp.starts_with(&SLICE_HEADER_RBSP), "missing slice header");
    let mut rest = &rbsp[SLICE_HEADER_RBSP.len()..];

    let width = config.width() as usize;
    let mut y = vec![0u8; config.luma_plane_len()];
    let mut cb = vec![0u8; config.chroma_plane_len()];
    let mut cr = vec![0u8; config.chroma_plane_len()];

    for mbs_row in 0..config.mbs_height() {
        for mbs_col in 0..config.mbs_width() {
            if !(mbs_row == 0 && mbs_col == 0) {
                anyhow::ensure!(
                    rest.starts_with(&MACROBLOCK_HEADER),
                    "missing macroblock header at ({mbs_row}, {mbs_col})"
                );
                rest = &rest[MACROBLOCK_HEADER.len()..];
            }
            anyhow::ensure!(
                rest.len() >= 16 * 16 + 2 * 8 * 8,
                "truncated macroblock at ({mbs_row}, {mbs_col})"
            );
            for row in mbs_row * 16..(mbs_row + 1) * 16 {
                let (samples, tail) = rest.split_at(16);
                y[row * width + mbs_col * 16..][..16].copy_from_slice(samples);
                rest = tail;
            }
            for row in mbs_row * 8..(mbs_row + 1) * 8 {
                let (samples, tail) = rest.split_at(8);
                cb[row * (width / 2) + mbs_col * 8..][..8].copy_from_slice(samples);
                rest = tail;
            }
            for row in mbs_row * 8..(mbs_row + 1) * 8 {
                let (samples, tail) = rest.split_at(8);
                cr[row * (width / 2) + mbs_col * 8..][..8].copy_from_slice(samples);
                rest = tail;
            }
        }
    }

    anyhow::ensure!(rest == [0x80].as_slice(), "missing slice stop marker");
    Ok((y, cb, cr))
}
