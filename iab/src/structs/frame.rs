//! The IAFrame element and its sub-frame wrapping.
//!
//! On the wire a frame is carried as two tagged sub-frames: an opaque
//! preamble (scanned for when seeking into a stream) and the frame payload
//! holding exactly one IAFrame element.

use std::io;

use log::debug;

use crate::structs::element::{
    Element, ElementId, FrameCtx, ParentKind, ParsedChild, impl_sub_element_api, read_child,
    write_envelope,
};
use crate::structs::types::{BitDepth, FrameRate, SampleRate};
use crate::utils::bitstream_io::{BitstreamIoReader, BitstreamIoWriter};
use crate::utils::errors::ParseError;
use crate::validate::ValidationCtx;
use crate::validate::issue::{ConstraintSet, ErrorCode, IssueId};
use crate::validate::registry;

/// Tag byte opening the preamble sub-frame of every frame.
pub const PREAMBLE_TAG: u8 = 0x01;

/// Tag byte opening the frame payload sub-frame.
pub const FRAME_TAG: u8 = 0x02;

/// The bitstream version this implementation conforms to.
pub const SUPPORTED_VERSION: u8 = 1;

/// One presentation unit: the root element of a frame duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub version: u8,
    pub sample_rate: SampleRate,
    pub bit_depth: BitDepth,
    pub frame_rate: FrameRate,
    /// Upper bound on simultaneously rendered assets declared by the
    /// encoder.
    pub max_rendered: u32,
    sub_elements: Vec<Element>,
    pub num_undefined_sub_elements: u32,
    pub num_unallowed_sub_elements: u32,
    pub packing_enabled: bool,
}

impl Frame {
    const PARENT_ID_CODE: u32 = ElementId::Frame.code();

    pub fn new(sample_rate: SampleRate, bit_depth: BitDepth, frame_rate: FrameRate) -> Self {
        Self {
            version: SUPPORTED_VERSION,
            sample_rate,
            bit_depth,
            frame_rate,
            max_rendered: 0,
            sub_elements: Vec::new(),
            num_undefined_sub_elements: 0,
            num_unallowed_sub_elements: 0,
            packing_enabled: true,
        }
    }

    /// Samples per bed channel or object for this frame's duration.
    pub fn frame_sample_count(&self) -> u32 {
        self.frame_rate.samples_per_frame(self.sample_rate)
    }

    pub(crate) fn ctx(&self) -> FrameCtx {
        FrameCtx {
            sample_rate: self.sample_rate,
            bit_depth: self.bit_depth,
            frame_rate: self.frame_rate,
        }
    }

    /// Decodes one IAFrame element, envelope included, from `reader`.
    pub fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
    ) -> Result<Self, ParseError> {
        let code = reader.get_plex(8)?;
        if ElementId::from_code(code) != Some(ElementId::Frame) {
            return Err(ParseError::NotAFrameElement(code));
        }

        let body_len = reader.get_packed_length()?;
        let body_start = reader.position()?;

        let version = reader.get_n(8)?;
        if version == 0 {
            return Err(ParseError::InvalidVersion(version));
        }

        let sample_rate = SampleRate::from_code(reader.get_n(2)?)?;
        let bit_depth = BitDepth::from_code(reader.get_n(2)?)?;
        let frame_rate = FrameRate::from_code(reader.get_n(4)?)?;

        let mut frame = Self::new(sample_rate, bit_depth, frame_rate);
        frame.version = version;
        frame.max_rendered = reader.get_plex(8)?;

        let ctx = frame.ctx();
        let sub_element_count = reader.get_plex(8)?;
        for _ in 0..sub_element_count {
            match read_child(reader, &ctx, ParentKind::Frame)? {
                ParsedChild::Element(element) => frame.sub_elements.push(element),
                ParsedChild::Unallowed(id) => {
                    debug!("skipped element {:#X}, not allowed below a frame", id.code());
                    frame.num_unallowed_sub_elements += 1;
                }
                ParsedChild::Undefined(code) => {
                    debug!("skipped undefined element {code:#X} below a frame");
                    frame.num_undefined_sub_elements += 1;
                }
            }
        }

        let consumed = reader.position()? - body_start;
        if consumed != (body_len as u64) << 3 {
            return Err(ParseError::ElementLengthMismatch {
                element: ElementId::Frame.code(),
                declared: body_len,
                consumed,
            });
        }

        Ok(frame)
    }

    fn write_body(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_n(8, self.version as u32)?;
        writer.put_n(2, self.sample_rate.code() as u32)?;
        writer.put_n(2, self.bit_depth.code() as u32)?;
        writer.put_n(4, self.frame_rate.code() as u32)?;
        writer.put_plex(8, self.max_rendered)?;

        let packed: Vec<_> = self
            .sub_elements
            .iter()
            .filter(|e| e.is_packing_enabled())
            .collect();

        writer.put_plex(8, packed.len() as u32)?;
        for element in packed {
            element.write(writer)?;
        }

        Ok(())
    }

    /// Serializes the IAFrame element, envelope included.
    pub fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        let mut body = BitstreamIoWriter::new();
        self.write_body(&mut body)?;
        write_envelope(writer, ElementId::Frame, &body.into_bytes()?)
    }

    /// Serializes the frame with its sub-frame wrapping: preamble sub-frame
    /// first, then the frame payload sub-frame.
    pub fn write_sub_frame(
        &self,
        writer: &mut BitstreamIoWriter,
        preamble_value: &[u8],
    ) -> io::Result<()> {
        let mut element = BitstreamIoWriter::new();
        self.write(&mut element)?;
        let element_bytes = element.into_bytes()?;

        writer.put_n(8, PREAMBLE_TAG as u32)?;
        writer.put_n(32, preamble_value.len() as u32)?;
        writer.put_bytes(preamble_value)?;

        writer.put_n(8, FRAME_TAG as u32)?;
        writer.put_n(32, element_bytes.len() as u32)?;
        writer.put_bytes(&element_bytes)
    }

    /// Field-level conformance checks for the frame and, recursively, every
    /// sub-element. Relational checks across siblings and frames live in
    /// [`crate::process::validate::Validator`].
    pub fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        ctx.frame_rate = Some(self.frame_rate);
        ctx.frame_sample_rate = Some(self.sample_rate);

        let id = IssueId::Frame;

        if self.version != SUPPORTED_VERSION
            && !ctx.report_both_bases(id, ErrorCode::FrameIllegalBitstreamVersion)
        {
            return false;
        }

        for set in ConstraintSet::ALL {
            let params = registry::params(set);

            if !params.sample_rates.contains(&self.sample_rate) {
                let code = if set == ConstraintSet::DbyCinema {
                    ErrorCode::DbyCinemaFrameUnsupportedSampleRate
                } else {
                    ErrorCode::FrameUnsupportedSampleRate
                };
                if !ctx.report(id, set, code) {
                    return false;
                }
            }

            if !params.frame_rates.contains(&self.frame_rate)
                && !ctx.report(id, set, ErrorCode::FrameUnsupportedFrameRate)
            {
                return false;
            }

            if !params.bit_depths.contains(&self.bit_depth)
                && !ctx.report(id, set, ErrorCode::FrameUnsupportedBitDepth)
            {
                return false;
            }
        }

        for element in &self.sub_elements {
            if !element.validate(ctx) {
                return false;
            }
        }

        true
    }
}

impl_sub_element_api!(Frame, ParentKind::Frame);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::BsIoSliceReader;

    #[test]
    fn minimal_frame_round_trip() {
        let frame = Frame::new(SampleRate::Fs48000, BitDepth::Bit24, FrameRate::Fps24);

        let mut writer = BitstreamIoWriter::new();
        frame.write(&mut writer).unwrap();
        let bytes = writer.into_bytes().unwrap();

        let mut reader = BsIoSliceReader::from_slice(&bytes);
        let round = Frame::read(&mut reader).unwrap();
        assert_eq!(round, frame);
    }

    #[test]
    fn truncated_frame_is_a_length_mismatch() {
        let frame = Frame::new(SampleRate::Fs48000, BitDepth::Bit16, FrameRate::Fps25);

        let mut writer = BitstreamIoWriter::new();
        frame.write(&mut writer).unwrap();
        let mut bytes = writer.into_bytes().unwrap();

        // Claim one more body byte than is actually present.
        let declared = bytes[1];
        bytes[1] = declared + 1;
        bytes.push(0);

        let mut reader = BsIoSliceReader::from_slice(&bytes);
        assert!(matches!(
            Frame::read(&mut reader),
            Err(ParseError::ElementLengthMismatch { .. })
        ));
    }
}
