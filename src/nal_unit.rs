// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Network Abstraction Layer (NAL) encoding

use alloc::vec::Vec;

use crate::emulation::to_ebsp;
use crate::RbspData;

/// The Annex B start code prefixed to every NAL unit.
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Data to save a NAL unit
///
/// The data is in the raw byte sequence payload (RBSP) representation and gets
/// converted to a NAL unit by the [Self::to_annex_b_data] method.
pub struct NalUnit {
    ref_idc: NalRefIdc,
    unit_type: NalUnitType,
    rbsp_data: RbspData,
}

impl NalUnit {
    /// Create new [NalUnit].
    pub fn new(ref_idc: NalRefIdc, unit_type: NalUnitType, rbsp_data: RbspData) -> Self {
        Self {
            ref_idc,
            unit_type,
            rbsp_data,
        }
    }

    /// Return a single NAL unit encoded for direct saving to `.h264` file.
    ///
    /// This is the start code, the NAL header byte, and the
    /// emulation-prevention processed payload.
    pub fn to_annex_b_data(&self) -> Vec<u8> {
        let rbsp = &self.rbsp_data.data;
        let mut result = Vec::with_capacity(5 + rbsp.len() + rbsp.len() / 2);
        result.extend_from_slice(&START_CODE);
        result.push(header_byte(&self.ref_idc, &self.unit_type));
        result.extend_from_slice(&to_ebsp(rbsp));
        result
    }
}

/// Compose the one-byte NAL unit header.
///
/// `forbidden_zero_bit` (1 bit, zero), `nal_ref_idc` (2 bits),
/// `nal_unit_type` (5 bits).
pub(crate) fn header_byte(ref_idc: &NalRefIdc, unit_type: &NalUnitType) -> u8 {
    ref_idc.nal_ref_idc() << 5 | unit_type.nal_unit_type()
}

/// Possible values for the `nal_ref_idc` field in the `nal_unit`.
///
/// Encodes to 2 bits.
pub enum NalRefIdc {
    Zero,
    One,
    Two,
    Three,
}

impl NalRefIdc {
    pub(crate) fn nal_ref_idc(&self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// Possible values for the `nal_unit_type` field in `nal_unit`.
///
/// Encodes to 5 bits. Only the types this crate emits are listed.
#[derive(PartialEq, Eq)]
#[non_exhaustive]
pub enum NalUnitType {
    /// Coded slice of an IDR picture
    CodedSliceOfAnIDRPicture,
    /// Sequence parameter set
    SequenceParameterSet,
    /// Picture parameter set
    PictureParameterSet,
}

impl NalUnitType {
    pub(crate) fn nal_unit_type(&self) -> u8 {
        match self {
            Self::CodedSliceOfAnIDRPicture => 5,
            Self::SequenceParameterSet => 7,
            Self::PictureParameterSet => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_header_byte() {
        assert_eq!(
            header_byte(&NalRefIdc::Three, &NalUnitType::SequenceParameterSet),
            0x67
        );
        assert_eq!(
            header_byte(&NalRefIdc::Three, &NalUnitType::PictureParameterSet),
            0x68
        );
        assert_eq!(
            header_byte(&NalRefIdc::Zero, &NalUnitType::CodedSliceOfAnIDRPicture),
            0x05
        );
        assert_eq!(
            header_byte(&NalRefIdc::One, &NalUnitType::CodedSliceOfAnIDRPicture),
            0x25
        );
    }

    #[test]
    fn test_annex_b_framing() {
        let nal = NalUnit::new(
            NalRefIdc::Three,
            NalUnitType::PictureParameterSet,
            RbspData::new(vec![0xce, 0x00, 0x00, 0x01]),
        );
        // Payload gets an escape before the trailing 0x01.
        assert_eq!(
            nal.to_annex_b_data(),
            vec![0x00, 0x00, 0x00, 0x01, 0x68, 0xce, 0x00, 0x00, 0x03, 0x01]
        );
    }
}
