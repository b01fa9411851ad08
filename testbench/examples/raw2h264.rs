//! Read raw planar 4:2:0 frames from stdin and write the Annex B stream to
//! stdout. The fixed header blocks are hex-dumped to stderr on exit.
//!
//! Usage: raw2h264 [WIDTH HEIGHT]  (defaults to 1280 720)

use std::io::Write;

use anyhow::{Context, Result};
use pcm_avc::{Frame, H264Writer, StreamConfig};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (width, height) = match (args.next(), args.next()) {
        (Some(w), Some(h)) => (
            w.parse().context("width is not a number")?,
            h.parse().context("height is not a number")?,
        ),
        (None, None) => (1280, 720),
        _ => anyhow::bail!("usage: raw2h264 [WIDTH HEIGHT]"),
    };
    let config = StreamConfig::new(width, height)?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let stdout = std::io::stdout();
    let mut wtr = H264Writer::new(std::io::BufWriter::new(stdout.lock()), &config)?;

    let mut frame = Frame::new(&config);
    while frame.fill_from(&mut input)? {
        wtr.write_frame(&frame)?;
    }

    wtr.encoder().write_diagnostics(std::io::stderr().lock())?;
    wtr.into_inner().flush()?;
    Ok(())
}
