// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT
// or http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The fixed header structures of the stream: sequence and picture parameter
//! sets, the IDR slice header, and the macroblock type code.
//!
//! All of these are fixed [BitField] sequences for a baseline-profile,
//! progressive, IDR-only stream; only the picture dimensions vary. Each is
//! serialized once at encoder construction.

use alloc::vec::Vec;

use crate::bit_writer::{BitField, BitWriter};
use crate::{RbspData, StreamConfig};

/// Sequence parameter set
///
/// 7.3.2.1.1 Sequence parameter set data syntax
pub(crate) struct Sps {
    pic_width_in_mbs_minus1: u32,
    pic_height_in_map_units_minus1: u32,
    log2_max_frame_num_minus4: u32,
    pic_order_cnt_type: u32,
    log2_max_pic_order_cnt_lsb_minus4: u32,
}

impl Sps {
    pub(crate) fn new(config: &StreamConfig) -> Self {
        Self {
            pic_width_in_mbs_minus1: config.mbs_width() as u32 - 1,
            pic_height_in_map_units_minus1: config.mbs_height() as u32 - 1,
            log2_max_frame_num_minus4: 0,
            pic_order_cnt_type: 0,
            log2_max_pic_order_cnt_lsb_minus4: 0,
        }
    }

    /// Bit width of the `frame_num` slice header field.
    fn log2_max_frame_num(&self) -> u32 {
        self.log2_max_frame_num_minus4 + 4
    }

    /// Bit width of the `pic_order_cnt_lsb` slice header field.
    fn log2_max_pic_order_cnt_lsb(&self) -> u32 {
        self.log2_max_pic_order_cnt_lsb_minus4 + 4
    }

    pub(crate) fn to_rbsp(&self) -> RbspData {
        let fields = [
            // profile_idc = 66 (baseline)
            BitField::Fixed { width: 8, value: 66 },
            // constraint_set0_flag
            BitField::Fixed { width: 1, value: 0 },
            // constraint_set1_flag
            BitField::Fixed { width: 1, value: 0 },
            // constraint_set2_flag
            BitField::Fixed { width: 1, value: 0 },
            // constraint_set3_flag
            BitField::Fixed { width: 1, value: 0 },
            // reserved_zero_4bits
            BitField::Fixed { width: 4, value: 0 },
            // level_idc = 10
            BitField::Fixed { width: 8, value: 10 },
            // seq_parameter_set_id
            BitField::ExpGolomb(0),
            // log2_max_frame_num_minus4
            BitField::ExpGolomb(self.log2_max_frame_num_minus4),
            // pic_order_cnt_type
            BitField::ExpGolomb(self.pic_order_cnt_type),
            // log2_max_pic_order_cnt_lsb_minus4
            BitField::ExpGolomb(self.log2_max_pic_order_cnt_lsb_minus4),
            // max_num_ref_frames
            BitField::ExpGolomb(0),
            // gaps_in_frame_num_value_allowed_flag
            BitField::Fixed { width: 1, value: 0 },
            // pic_width_in_mbs_minus1
            BitField::ExpGolomb(self.pic_width_in_mbs_minus1),
            // pic_height_in_map_units_minus1
            BitField::ExpGolomb(self.pic_height_in_map_units_minus1),
            // frame_mbs_only_flag
            BitField::Fixed { width: 1, value: 1 },
            // direct_8x8_inference_flag
            BitField::Fixed { width: 1, value: 0 },
            // frame_cropping_flag
            BitField::Fixed { width: 1, value: 0 },
            // vui_parameters_present_flag
            BitField::Fixed { width: 1, value: 0 },
            // rbsp_stop_one_bit
            BitField::Fixed { width: 1, value: 1 },
        ];

        let mut w = BitWriter::with_capacity(16);
        for field in fields {
            w.put(field);
        }
        RbspData::new(w.into_bytes())
    }
}

/// Picture parameter set
///
/// 7.3.2.2 Picture parameter set RBSP syntax
pub(crate) struct Pps {
    pic_parameter_set_id: u32,
}

impl Pps {
    pub(crate) fn new(pic_parameter_set_id: u32) -> Self {
        Self {
            pic_parameter_set_id,
        }
    }

    pub(crate) fn to_rbsp(&self) -> RbspData {
        let fields = [
            // pic_parameter_set_id
            BitField::ExpGolomb(self.pic_parameter_set_id),
            // seq_parameter_set_id
            BitField::ExpGolomb(0),
            // entropy_coding_mode_flag (CAVLC)
            BitField::Fixed { width: 1, value: 0 },
            // bottom_field_pic_order_in_frame_present_flag
            BitField::Fixed { width: 1, value: 0 },
            // num_slice_groups_minus1
            BitField::ExpGolomb(0),
            // num_ref_idx_l0_default_active_minus1
            BitField::ExpGolomb(0),
            // num_ref_idx_l1_default_active_minus1
            BitField::ExpGolomb(0),
            // weighted_pred_flag
            BitField::Fixed { width: 1, value: 0 },
            // weighted_bipred_idc
            BitField::Fixed { width: 2, value: 0 },
            // pic_init_qp_minus26
            BitField::SignedExpGolomb(0),
            // pic_init_qs_minus26
            BitField::SignedExpGolomb(0),
            // chroma_qp_index_offset
            BitField::SignedExpGolomb(0),
            // deblocking_filter_control_present_flag
            BitField::Fixed { width: 1, value: 0 },
            // constrained_intra_pred_flag
            BitField::Fixed { width: 1, value: 0 },
            // redundant_pic_cnt_present_flag
            BitField::Fixed { width: 1, value: 0 },
            // rbsp_stop_one_bit
            BitField::Fixed { width: 1, value: 1 },
        ];

        let mut w = BitWriter::with_capacity(8);
        for field in fields {
            w.put(field);
        }
        RbspData::new(w.into_bytes())
    }

    pub(crate) fn pic_parameter_set_id(&self) -> u32 {
        self.pic_parameter_set_id
    }
}

/// IDR slice header, fused with the first macroblock's type code.
///
/// 7.3.3 Slice header syntax
pub(crate) struct SliceHeader {}

impl SliceHeader {
    pub(crate) fn new() -> Self {
        Self {}
    }

    /// Serialize the slice header RBSP (without the NAL header byte).
    ///
    /// The slice NAL carries `nal_ref_idc` 0, so `dec_ref_pic_marking()` is
    /// absent. Every per-frame field is constant zero: each slice is a
    /// self-contained IDR refresh of the single fixed parameter set pair.
    pub(crate) fn to_rbsp(&self, sps: &Sps, pps: &Pps) -> RbspData {
        let mut w = BitWriter::with_capacity(8);

        let fields = [
            // first_mb_in_slice
            BitField::ExpGolomb(0),
            // slice_type = 7 (I, all slices of the picture)
            BitField::ExpGolomb(7),
            // pic_parameter_set_id
            BitField::ExpGolomb(pps.pic_parameter_set_id()),
            // frame_num
            BitField::Fixed {
                width: sps.log2_max_frame_num() as u8,
                value: 0,
            },
            // idr_pic_id
            BitField::ExpGolomb(0),
            // pic_order_cnt_lsb (pic_order_cnt_type is 0)
            BitField::Fixed {
                width: sps.log2_max_pic_order_cnt_lsb() as u8,
                value: 0,
            },
            // slice_qp_delta
            BitField::SignedExpGolomb(0),
            // mb_type of the first macroblock, read unaligned directly after
            // the header, which is why it is fused in here.
            BitField::ExpGolomb(MacroblockType::I_PCM.mb_type()),
        ];
        for field in fields {
            w.put(field);
        }

        // pcm_alignment_zero_bit: I_PCM sample bytes start byte-aligned.
        w.align_zero();
        RbspData::new(w.into_bytes())
    }
}

#[allow(non_camel_case_types)]
pub(crate) enum MacroblockType {
    I_PCM,
}

impl MacroblockType {
    #[inline]
    pub(crate) fn mb_type(&self) -> u32 {
        match self {
            Self::I_PCM => 25,
        }
    }

    /// The `mb_type` code for a non-first macroblock, padded with
    /// `pcm_alignment_zero_bit`s so the raw samples that follow stay
    /// byte-aligned.
    pub(crate) fn encoded_header(&self) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.put_exp_golomb(self.mb_type());
        w.align_zero();
        w.into_bytes()
    }
}
