//! Object elements: dynamic point sources with per-sub-block pan metadata,
//! and the 19-zone gain refinement.

use std::io;

use log::debug;

use crate::structs::element::{
    Element, ElementId, FrameCtx, ParentKind, ParsedChild, impl_sub_element_api, read_child,
    write_envelope,
};
use crate::structs::types::{
    AudioDataId, AudioDescription, DecorCoef, Gain, MetaId, ObjectZoneGains9, Position, Snap,
    Spread, UseCase,
};
use crate::utils::bitstream_io::{BitstreamIoReader, BitstreamIoWriter};
use crate::utils::errors::ParseError;
use crate::validate::issue::{ConstraintSet, ErrorCode, IssueId};
use crate::validate::{ValidationCtx, registry};

/// Panning state for one time slice of a frame.
///
/// Sub-block zero always carries pan info; later sub-blocks may signal "no
/// change" by clearing `pan_info_exists`, in which case the remaining fields
/// hold defaults and nothing further is on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSubBlock {
    pub pan_info_exists: bool,
    pub gain: Gain,
    pub position: Position,
    pub snap: Snap,
    pub zone_gains: ObjectZoneGains9,
    pub spread: Spread,
    pub decor: DecorCoef,
}

impl Default for ObjectSubBlock {
    fn default() -> Self {
        Self {
            pan_info_exists: false,
            gain: Gain::Unity,
            position: Position::default(),
            snap: Snap::default(),
            zone_gains: ObjectZoneGains9::default(),
            spread: Spread::default(),
            decor: DecorCoef::NoDecor,
        }
    }
}

impl ObjectSubBlock {
    fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        first: bool,
    ) -> Result<Self, ParseError> {
        let pan_info_exists = if first { true } else { reader.get()? };

        if !pan_info_exists {
            return Ok(Self::default());
        }

        Ok(Self {
            pan_info_exists,
            gain: Gain::read(reader)?,
            position: Position::read(reader)?,
            snap: Snap::read(reader)?,
            zone_gains: ObjectZoneGains9::read(reader)?,
            spread: Spread::read(reader)?,
            decor: DecorCoef::read(reader, 2)?,
        })
    }

    fn write(&self, writer: &mut BitstreamIoWriter, first: bool) -> io::Result<()> {
        if !first {
            writer.put(self.pan_info_exists)?;
        }

        if !self.pan_info_exists {
            return Ok(());
        }

        self.gain.write(writer)?;
        self.position.write(writer)?;
        self.snap.write(writer)?;
        self.zone_gains.write(writer)?;
        self.spread.write(writer)?;
        self.decor.write(writer, 2)
    }
}

/// A dynamic audio object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDefinition {
    pub meta_id: MetaId,
    pub audio_data_id: AudioDataId,
    pub conditional: bool,
    pub use_case: Option<UseCase>,
    pub pan_sub_blocks: Vec<ObjectSubBlock>,
    pub audio_description: AudioDescription,
    sub_elements: Vec<Element>,
    pub num_undefined_sub_elements: u32,
    pub num_unallowed_sub_elements: u32,
    pub packing_enabled: bool,
}

impl ObjectDefinition {
    const PARENT_ID_CODE: u32 = ElementId::ObjectDefinition.code();

    pub fn new(meta_id: MetaId, audio_data_id: AudioDataId) -> Self {
        Self {
            meta_id,
            audio_data_id,
            conditional: false,
            use_case: None,
            pan_sub_blocks: Vec::new(),
            audio_description: AudioDescription::default(),
            sub_elements: Vec::new(),
            num_undefined_sub_elements: 0,
            num_unallowed_sub_elements: 0,
            packing_enabled: true,
        }
    }

    /// Creates an object with one default pan sub-block per frame time
    /// slice, as required for the given frame rate.
    pub fn with_sub_blocks(
        meta_id: MetaId,
        audio_data_id: AudioDataId,
        frame_rate: crate::structs::types::FrameRate,
    ) -> Self {
        let mut object = Self::new(meta_id, audio_data_id);
        object.pan_sub_blocks = (0..frame_rate.sub_block_count())
            .map(|index| ObjectSubBlock {
                pan_info_exists: index == 0,
                ..Default::default()
            })
            .collect();

        object
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        ctx: &FrameCtx,
    ) -> Result<Self, ParseError> {
        let meta_id = reader.get_plex(8)?;
        let audio_data_id = reader.get_plex(8)?;
        let mut object = Self::new(meta_id, audio_data_id);

        object.conditional = reader.get()?;
        if object.conditional {
            object.use_case = Some(UseCase::from_code(reader.get_n(8)?));
        }

        for index in 0..ctx.frame_rate.sub_block_count() {
            object
                .pan_sub_blocks
                .push(ObjectSubBlock::read(reader, index == 0)?);
        }

        reader.align();
        object.audio_description = AudioDescription::read(reader)?;

        let sub_element_count = reader.get_plex(8)?;
        for _ in 0..sub_element_count {
            match read_child(reader, ctx, ParentKind::Object)? {
                ParsedChild::Element(element) => object.sub_elements.push(element),
                ParsedChild::Unallowed(id) => {
                    debug!("skipped element {:#X}, not allowed below an object", id.code());
                    object.num_unallowed_sub_elements += 1;
                }
                ParsedChild::Undefined(code) => {
                    debug!("skipped undefined element {code:#X} below an object");
                    object.num_undefined_sub_elements += 1;
                }
            }
        }

        Ok(object)
    }

    fn write_body(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_plex(8, self.meta_id)?;
        writer.put_plex(8, self.audio_data_id)?;

        writer.put(self.conditional)?;
        if self.conditional {
            let use_case = self.use_case.unwrap_or(UseCase::Always);
            writer.put_n(8, use_case.code() as u32)?;
        }

        for (index, sub_block) in self.pan_sub_blocks.iter().enumerate() {
            sub_block.write(writer, index == 0)?;
        }

        writer.align()?;
        self.audio_description.write(writer)?;

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

    pub fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        let mut body = BitstreamIoWriter::new();
        self.write_body(&mut body)?;
        write_envelope(writer, ElementId::ObjectDefinition, &body.into_bytes()?)
    }

    pub fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        let id = IssueId::MetaId(self.meta_id);

        if self.conditional
            && let Some(use_case) = self.use_case
            && !use_case.is_defined()
            && !ctx.report_both_bases(id, ErrorCode::ObjectDefinitionUndefinedUseCase)
        {
            return false;
        }

        if let Some(frame_rate) = ctx.frame_rate
            && self.pan_sub_blocks.len() != frame_rate.sub_block_count()
            && !ctx.report_both_bases(id, ErrorCode::ObjectDefinitionPanSubBlockCountConflict)
        {
            return false;
        }

        if self.audio_description.is_reserved()
            && !ctx.report_both_bases(id, ErrorCode::ObjectDefinitionUndefinedAudioDescription)
        {
            return false;
        }

        let max_text =
            registry::params(ConstraintSet::CinemaSt2098_2_2018).max_audio_description_bytes;
        if self.audio_description.text.len() > max_text
            && !ctx.report_both_bases(id, ErrorCode::ObjectDefinitionAudioDescriptionTextExceeded)
        {
            return false;
        }

        for sub_block in self.pan_sub_blocks.iter().filter(|s| s.pan_info_exists) {
            if sub_block.decor.is_reserved()
                && !ctx.report_both_bases(id, ErrorCode::ObjectDefinitionUnsupportedDecorPrefix)
            {
                return false;
            }
        }

        if !self.validate_profile_fields(id, ctx) {
            return false;
        }

        for element in &self.sub_elements {
            if !element.validate(ctx) {
                return false;
            }
        }

        true
    }

    fn validate_profile_fields(&self, id: IssueId, ctx: &mut ValidationCtx<'_>) -> bool {
        if self.conditional
            && let Some(use_case) = self.use_case
        {
            let params = registry::params(ConstraintSet::DbyCinema);
            if let Some(allowed) = params.object_use_cases
                && !allowed.contains(&use_case)
                && !ctx.report(
                    id,
                    ConstraintSet::DbyCinema,
                    ErrorCode::DbyCinemaObjectDefinitionInvalidUseCase,
                )
            {
                return false;
            }
        }

        for (set, codes) in DOLBY_OBJECT_CODES {
            let params = registry::params(set);

            for sub_block in self.pan_sub_blocks.iter().filter(|s| s.pan_info_exists) {
                if let Some(allowed) = params.object_gain_prefixes
                    && !allowed.contains(&sub_block.gain.prefix())
                    && !ctx.report(id, set, codes.invalid_gain_prefix)
                {
                    return false;
                }

                if params.snap_tol_exists_must_be_zero
                    && sub_block.snap.tol_exists
                    && !ctx.report(id, set, codes.snap_tol_exists_not_zero)
                {
                    return false;
                }

                if let Some(allowed) = params.spread_modes
                    && !allowed.contains(&sub_block.spread.mode())
                    && !ctx.report(id, set, codes.invalid_spread_mode)
                {
                    return false;
                }

                if let Some(allowed) = params.decor_prefixes
                    && !allowed.contains(&sub_block.decor.prefix())
                    && !ctx.report(id, set, codes.invalid_decor_prefix)
                {
                    return false;
                }

                if sub_block.zone_gains.control {
                    if let Some(allowed) = params.zone_gain_prefixes
                        && sub_block
                            .zone_gains
                            .gains
                            .iter()
                            .any(|gain| !allowed.contains(&gain.prefix()))
                        && !ctx.report(id, set, codes.invalid_zone_gain_prefix)
                    {
                        return false;
                    }

                    if let Some(presets) = params.zone_gain_preset_masks
                        && !presets.contains(&sub_block.zone_gains.activation_mask())
                        && !ctx.report(id, set, codes.zone_gains_not_a_preset)
                    {
                        return false;
                    }
                }
            }
        }

        if !self.sub_elements.is_empty() {
            if !registry::params(ConstraintSet::ImfSt2067_201_2019).allow_object_sub_elements
                && !ctx.report(
                    id,
                    ConstraintSet::ImfSt2067_201_2019,
                    ErrorCode::ObjectDefinitionSubElementsNotAllowed,
                )
            {
                return false;
            }

            if !registry::params(ConstraintSet::DbyCinema).allow_object_sub_elements
                && !ctx.report(
                    id,
                    ConstraintSet::DbyCinema,
                    ErrorCode::DbyCinemaObjectDefinitionSubElementsNotAllowed,
                )
            {
                return false;
            }

            for element in &self.sub_elements {
                if matches!(element, Element::ObjectZoneDefinition19(_))
                    && !ctx.report(
                        id,
                        ConstraintSet::DbyCinema,
                        ErrorCode::DbyCinemaObjectZoneDefinition19NotAnAllowedSubElement,
                    )
                {
                    return false;
                }
            }
        }

        true
    }
}

struct DolbyObjectCodes {
    invalid_gain_prefix: ErrorCode,
    invalid_zone_gain_prefix: ErrorCode,
    invalid_spread_mode: ErrorCode,
    invalid_decor_prefix: ErrorCode,
    snap_tol_exists_not_zero: ErrorCode,
    zone_gains_not_a_preset: ErrorCode,
}

const DOLBY_OBJECT_CODES: [(ConstraintSet, DolbyObjectCodes); 2] = [
    (
        ConstraintSet::DbyCinema,
        DolbyObjectCodes {
            invalid_gain_prefix: ErrorCode::DbyCinemaObjectDefinitionInvalidGainPrefix,
            invalid_zone_gain_prefix: ErrorCode::DbyCinemaObjectDefinitionInvalidZoneGainPrefix,
            invalid_spread_mode: ErrorCode::DbyCinemaObjectDefinitionInvalidSpreadMode,
            invalid_decor_prefix: ErrorCode::DbyCinemaObjectDefinitionInvalidDecorPrefix,
            snap_tol_exists_not_zero: ErrorCode::DbyCinemaObjectDefinitionSnapTolExistsNotZero,
            zone_gains_not_a_preset: ErrorCode::DbyCinemaObjectDefinitionZoneGainsNotAPreset,
        },
    ),
    (
        ConstraintSet::DbyImf,
        DolbyObjectCodes {
            invalid_gain_prefix: ErrorCode::DbyImfObjectDefinitionInvalidGainPrefix,
            invalid_zone_gain_prefix: ErrorCode::DbyImfObjectDefinitionInvalidZoneGainPrefix,
            invalid_spread_mode: ErrorCode::DbyImfObjectDefinitionInvalidSpreadMode,
            invalid_decor_prefix: ErrorCode::DbyImfObjectDefinitionInvalidDecorPrefix,
            snap_tol_exists_not_zero: ErrorCode::DbyImfObjectDefinitionSnapTolExistsNotZero,
            zone_gains_not_a_preset: ErrorCode::DbyImfObjectDefinitionZoneGainsNotAPreset,
        },
    ),
];

impl_sub_element_api!(ObjectDefinition, ParentKind::Object);

/// One 19-zone time slice. Sub-block zero is always present on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone19SubBlock {
    pub zone19_info_exists: bool,
    pub gains: [Gain; 19],
}

impl Default for Zone19SubBlock {
    fn default() -> Self {
        Self {
            zone19_info_exists: false,
            gains: [Gain::Unity; 19],
        }
    }
}

impl Zone19SubBlock {
    fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        first: bool,
    ) -> Result<Self, ParseError> {
        let zone19_info_exists = if first { true } else { reader.get()? };

        let mut sub_block = Self {
            zone19_info_exists,
            ..Default::default()
        };

        if zone19_info_exists {
            for gain in sub_block.gains.iter_mut() {
                *gain = Gain::read(reader)?;
            }
        }

        Ok(sub_block)
    }

    fn write(&self, writer: &mut BitstreamIoWriter, first: bool) -> io::Result<()> {
        if !first {
            writer.put(self.zone19_info_exists)?;
        }

        if self.zone19_info_exists {
            for gain in &self.gains {
                gain.write(writer)?;
            }
        }

        Ok(())
    }
}

/// 19-zone gain refinement carried as an object sub-element.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectZoneDefinition19 {
    pub sub_blocks: Vec<Zone19SubBlock>,
    pub packing_enabled: bool,
}

impl ObjectZoneDefinition19 {
    pub fn new() -> Self {
        Self {
            sub_blocks: Vec::new(),
            packing_enabled: true,
        }
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        ctx: &FrameCtx,
    ) -> Result<Self, ParseError> {
        let mut zone = Self::new();

        for index in 0..ctx.frame_rate.sub_block_count() {
            zone.sub_blocks.push(Zone19SubBlock::read(reader, index == 0)?);
        }

        reader.align();

        Ok(zone)
    }

    fn write_body(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        for (index, sub_block) in self.sub_blocks.iter().enumerate() {
            sub_block.write(writer, index == 0)?;
        }

        writer.align()
    }

    pub fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        let mut body = BitstreamIoWriter::new();
        self.write_body(&mut body)?;
        write_envelope(writer, ElementId::ObjectZoneDefinition19, &body.into_bytes()?)
    }

    pub fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        let id = IssueId::ObjectZoneDefinition19;

        if let Some(frame_rate) = ctx.frame_rate
            && self.sub_blocks.len() != frame_rate.sub_block_count()
            && !ctx.report_both_bases(id, ErrorCode::ObjectZoneDefinition19SubBlockCountConflict)
        {
            return false;
        }

        for (set, codes) in DOLBY_OBJECT_CODES {
            let params = registry::params(set);

            if let Some(allowed) = params.zone_gain_prefixes {
                for sub_block in self.sub_blocks.iter().filter(|s| s.zone19_info_exists) {
                    if sub_block
                        .gains
                        .iter()
                        .any(|gain| !allowed.contains(&gain.prefix()))
                        && !ctx.report(id, set, codes.invalid_zone_gain_prefix)
                    {
                        return false;
                    }
                }
            }
        }

        true
    }
}

impl Default for ObjectZoneDefinition19 {
    fn default() -> Self {
        Self::new()
    }
}
