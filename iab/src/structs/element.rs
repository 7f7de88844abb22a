//! Element framework: identifiers, the element tagged union, and the
//! `<ElementID> <BodyLength> <Body>` envelope.
//!
//! Every element on the wire is a Plex(8) element ID, a PackedLength body
//! size in bytes, and a bit-packed body. Recognized IDs dispatch to typed
//! decoders; unknown IDs are skipped whole. Decoders must consume exactly
//! the declared body length, anything else is treated as corruption.

use std::io;

use crate::structs::bed::{BedDefinition, BedRemap};
use crate::structs::essence::{AudioDataDlc, AudioDataPcm};
use crate::structs::object::{ObjectDefinition, ObjectZoneDefinition19};
use crate::structs::types::{BitDepth, FrameRate, SampleRate};
use crate::structs::userdata::{AuthoringToolInfo, UserData};
use crate::utils::bitstream_io::{BitstreamIoReader, BitstreamIoWriter};
use crate::utils::errors::ParseError;
use crate::validate::ValidationCtx;

/// Recognized element type codes, Plex(8) coded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    Frame,
    BedDefinition,
    BedRemap,
    ObjectDefinition,
    ObjectZoneDefinition19,
    AudioDataDlc,
    AuthoringToolInfo,
    UserData,
    AudioDataPcm,
}

impl ElementId {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x08 => Some(Self::Frame),
            0x10 => Some(Self::BedDefinition),
            0x20 => Some(Self::BedRemap),
            0x40 => Some(Self::ObjectDefinition),
            0x48 => Some(Self::ObjectZoneDefinition19),
            0x80 => Some(Self::AudioDataDlc),
            0x100 => Some(Self::AuthoringToolInfo),
            0x101 => Some(Self::UserData),
            0x400 => Some(Self::AudioDataPcm),
            _ => None,
        }
    }

    pub const fn code(self) -> u32 {
        match self {
            Self::Frame => 0x08,
            Self::BedDefinition => 0x10,
            Self::BedRemap => 0x20,
            Self::ObjectDefinition => 0x40,
            Self::ObjectZoneDefinition19 => 0x48,
            Self::AudioDataDlc => 0x80,
            Self::AuthoringToolInfo => 0x100,
            Self::UserData => 0x101,
            Self::AudioDataPcm => 0x400,
        }
    }

    /// Whether this element type may appear as a direct child of `parent`.
    pub fn allowed_in(self, parent: ParentKind) -> bool {
        match parent {
            ParentKind::Frame => matches!(
                self,
                Self::BedDefinition
                    | Self::ObjectDefinition
                    | Self::AudioDataDlc
                    | Self::AudioDataPcm
                    | Self::AuthoringToolInfo
                    | Self::UserData
            ),
            ParentKind::Bed => matches!(self, Self::BedDefinition | Self::BedRemap),
            ParentKind::Object => {
                matches!(self, Self::ObjectDefinition | Self::ObjectZoneDefinition19)
            }
        }
    }
}

/// The element context a child is being decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Frame,
    Bed,
    Object,
}

/// Frame header parameters threaded into sub-element decoders.
#[derive(Debug, Clone, Copy)]
pub struct FrameCtx {
    pub sample_rate: SampleRate,
    pub bit_depth: BitDepth,
    pub frame_rate: FrameRate,
}

/// Any element that can appear below a frame, bed or object.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    BedDefinition(BedDefinition),
    BedRemap(BedRemap),
    ObjectDefinition(ObjectDefinition),
    ObjectZoneDefinition19(ObjectZoneDefinition19),
    AudioDataDlc(AudioDataDlc),
    AudioDataPcm(AudioDataPcm),
    AuthoringToolInfo(AuthoringToolInfo),
    UserData(UserData),
}

impl Element {
    pub fn id(&self) -> ElementId {
        match self {
            Self::BedDefinition(_) => ElementId::BedDefinition,
            Self::BedRemap(_) => ElementId::BedRemap,
            Self::ObjectDefinition(_) => ElementId::ObjectDefinition,
            Self::ObjectZoneDefinition19(_) => ElementId::ObjectZoneDefinition19,
            Self::AudioDataDlc(_) => ElementId::AudioDataDlc,
            Self::AudioDataPcm(_) => ElementId::AudioDataPcm,
            Self::AuthoringToolInfo(_) => ElementId::AuthoringToolInfo,
            Self::UserData(_) => ElementId::UserData,
        }
    }

    /// Whether the writer will emit this element.
    pub fn is_packing_enabled(&self) -> bool {
        match self {
            Self::BedDefinition(e) => e.packing_enabled,
            Self::BedRemap(e) => e.packing_enabled,
            Self::ObjectDefinition(e) => e.packing_enabled,
            Self::ObjectZoneDefinition19(e) => e.packing_enabled,
            Self::AudioDataDlc(e) => e.packing_enabled,
            Self::AudioDataPcm(e) => e.packing_enabled,
            Self::AuthoringToolInfo(e) => e.packing_enabled,
            Self::UserData(e) => e.packing_enabled,
        }
    }

    pub fn set_packing_enabled(&mut self, enabled: bool) {
        match self {
            Self::BedDefinition(e) => e.packing_enabled = enabled,
            Self::BedRemap(e) => e.packing_enabled = enabled,
            Self::ObjectDefinition(e) => e.packing_enabled = enabled,
            Self::ObjectZoneDefinition19(e) => e.packing_enabled = enabled,
            Self::AudioDataDlc(e) => e.packing_enabled = enabled,
            Self::AudioDataPcm(e) => e.packing_enabled = enabled,
            Self::AuthoringToolInfo(e) => e.packing_enabled = enabled,
            Self::UserData(e) => e.packing_enabled = enabled,
        }
    }

    /// Serializes the element, envelope included. Skipped when packing is
    /// disabled for it.
    pub fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        if !self.is_packing_enabled() {
            return Ok(());
        }

        match self {
            Self::BedDefinition(e) => e.write(writer),
            Self::BedRemap(e) => e.write(writer),
            Self::ObjectDefinition(e) => e.write(writer),
            Self::ObjectZoneDefinition19(e) => e.write(writer),
            Self::AudioDataDlc(e) => e.write(writer),
            Self::AudioDataPcm(e) => e.write(writer),
            Self::AuthoringToolInfo(e) => e.write(writer),
            Self::UserData(e) => e.write(writer),
        }
    }

    pub(crate) fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        match self {
            Self::BedDefinition(e) => e.validate(ctx),
            Self::BedRemap(e) => e.validate(ctx),
            Self::ObjectDefinition(e) => e.validate(ctx),
            Self::ObjectZoneDefinition19(e) => e.validate(ctx),
            Self::AudioDataDlc(e) => e.validate(ctx),
            Self::AudioDataPcm(e) => e.validate(ctx),
            Self::AuthoringToolInfo(e) => e.validate(ctx),
            Self::UserData(e) => e.validate(ctx),
        }
    }
}

/// Outcome of decoding one child slot.
#[derive(Debug)]
pub(crate) enum ParsedChild {
    Element(Element),
    /// Recognized element type that is not allowed in this context; body
    /// skipped.
    Unallowed(ElementId),
    /// Unrecognized element ID, reserved for future use; body skipped.
    Undefined(u32),
}

/// Decodes one `<ElementID> <BodyLength> <Body>` envelope in `parent`
/// context, dispatching to the typed decoder or skipping the body.
pub(crate) fn read_child<R: io::Read + io::Seek>(
    reader: &mut BitstreamIoReader<R>,
    ctx: &FrameCtx,
    parent: ParentKind,
) -> Result<ParsedChild, ParseError> {
    let code = reader.get_plex(8)?;
    let body_len = reader.get_packed_length()?;

    let id = match ElementId::from_code(code) {
        None => {
            reader.skip_n(body_len << 3)?;
            return Ok(ParsedChild::Undefined(code));
        }
        Some(id) if !id.allowed_in(parent) => {
            reader.skip_n(body_len << 3)?;
            return Ok(ParsedChild::Unallowed(id));
        }
        Some(id) => id,
    };

    let body_start = reader.position()?;

    let element = match id {
        ElementId::BedDefinition => Element::BedDefinition(BedDefinition::read(reader, ctx)?),
        ElementId::BedRemap => Element::BedRemap(BedRemap::read(reader, ctx)?),
        ElementId::ObjectDefinition => {
            Element::ObjectDefinition(ObjectDefinition::read(reader, ctx)?)
        }
        ElementId::ObjectZoneDefinition19 => {
            Element::ObjectZoneDefinition19(ObjectZoneDefinition19::read(reader, ctx)?)
        }
        ElementId::AudioDataDlc => Element::AudioDataDlc(AudioDataDlc::read(reader)?),
        ElementId::AudioDataPcm => Element::AudioDataPcm(AudioDataPcm::read(reader, ctx)?),
        ElementId::AuthoringToolInfo => {
            Element::AuthoringToolInfo(AuthoringToolInfo::read(reader, body_len)?)
        }
        ElementId::UserData => Element::UserData(UserData::read(reader, body_len)?),
        ElementId::Frame => unreachable!("frames are never allowed as children"),
    };

    let consumed = reader.position()? - body_start;
    if consumed != (body_len as u64) << 3 {
        return Err(ParseError::ElementLengthMismatch {
            element: code,
            declared: body_len,
            consumed,
        });
    }

    Ok(ParsedChild::Element(element))
}

/// Writes the element envelope around an already-packed body.
pub(crate) fn write_envelope(
    writer: &mut BitstreamIoWriter,
    id: ElementId,
    body: &[u8],
) -> io::Result<()> {
    writer.put_plex(8, id.code())?;
    writer.put_packed_length(body.len() as u32)?;
    writer.put_bytes(body)
}

/// Generates the ordered sub-element list API shared by frame, bed and
/// object parents. Membership is structural equality; removal detaches
/// without destroying and hands the element back to the caller.
macro_rules! impl_sub_element_api {
    ($type:ty, $parent_kind:expr) => {
        impl $type {
            pub fn sub_elements(&self) -> &[crate::structs::element::Element] {
                &self.sub_elements
            }

            pub fn sub_elements_mut(&mut self) -> &mut Vec<crate::structs::element::Element> {
                &mut self.sub_elements
            }

            pub fn sub_element_count(&self) -> usize {
                self.sub_elements.len()
            }

            /// Replaces the list. Previous members not moved into the new
            /// list are dropped.
            pub fn set_sub_elements(
                &mut self,
                sub_elements: Vec<crate::structs::element::Element>,
            ) -> Result<(), crate::utils::errors::ElementError> {
                for element in &sub_elements {
                    self.check_allowed(element)?;
                }

                self.sub_elements = sub_elements;
                Ok(())
            }

            pub fn add_sub_element(
                &mut self,
                element: crate::structs::element::Element,
            ) -> Result<(), crate::utils::errors::ElementError> {
                self.check_allowed(&element)?;
                self.sub_elements.push(element);
                Ok(())
            }

            /// Detaches the element at `index` and returns it to the caller.
            pub fn remove_sub_element(
                &mut self,
                index: usize,
            ) -> Option<crate::structs::element::Element> {
                (index < self.sub_elements.len()).then(|| self.sub_elements.remove(index))
            }

            /// Detaches all sub-elements and returns them to the caller.
            pub fn clear_sub_elements(&mut self) -> Vec<crate::structs::element::Element> {
                std::mem::take(&mut self.sub_elements)
            }

            pub fn is_sub_element(&self, element: &crate::structs::element::Element) -> bool {
                self.sub_elements.iter().any(|e| e == element)
            }

            fn check_allowed(
                &self,
                element: &crate::structs::element::Element,
            ) -> Result<(), crate::utils::errors::ElementError> {
                let id = element.id();
                if id.allowed_in($parent_kind) {
                    Ok(())
                } else {
                    Err(crate::utils::errors::ElementError::NotAnAllowedSubElement {
                        parent: Self::PARENT_ID_CODE,
                        child: id.code(),
                    })
                }
            }
        }
    };
}

pub(crate) use impl_sub_element_api;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_id_codes_round_trip() {
        for id in [
            ElementId::Frame,
            ElementId::BedDefinition,
            ElementId::BedRemap,
            ElementId::ObjectDefinition,
            ElementId::ObjectZoneDefinition19,
            ElementId::AudioDataDlc,
            ElementId::AuthoringToolInfo,
            ElementId::UserData,
            ElementId::AudioDataPcm,
        ] {
            assert_eq!(ElementId::from_code(id.code()), Some(id));
        }
        assert_eq!(ElementId::from_code(0x2000), None);
    }

    #[test]
    fn parent_child_matrix() {
        assert!(ElementId::BedDefinition.allowed_in(ParentKind::Frame));
        assert!(ElementId::BedDefinition.allowed_in(ParentKind::Bed));
        assert!(!ElementId::BedDefinition.allowed_in(ParentKind::Object));

        assert!(ElementId::BedRemap.allowed_in(ParentKind::Bed));
        assert!(!ElementId::BedRemap.allowed_in(ParentKind::Frame));

        assert!(ElementId::ObjectZoneDefinition19.allowed_in(ParentKind::Object));
        assert!(!ElementId::ObjectZoneDefinition19.allowed_in(ParentKind::Frame));

        assert!(!ElementId::Frame.allowed_in(ParentKind::Frame));
        assert!(ElementId::UserData.allowed_in(ParentKind::Frame));
        assert!(!ElementId::UserData.allowed_in(ParentKind::Bed));
    }
}
