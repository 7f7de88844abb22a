//! Bed elements: static channel sets and their remap matrices.

use std::io;

use log::debug;

use crate::structs::element::{
    Element, ElementId, FrameCtx, ParentKind, ParsedChild, impl_sub_element_api, read_child,
    write_envelope,
};
use crate::structs::types::{
    AudioDataId, AudioDescription, ChannelId, DecorCoef, Gain, MetaId, UseCase,
};
use crate::utils::bitstream_io::{BitstreamIoReader, BitstreamIoWriter};
use crate::utils::errors::ParseError;
use crate::validate::issue::{ConstraintSet, ErrorCode, IssueId};
use crate::validate::{ValidationCtx, registry};

/// One channel slot within a bed.
#[derive(Debug, Clone, PartialEq)]
pub struct BedChannel {
    pub channel_id: ChannelId,
    pub audio_data_id: AudioDataId,
    pub gain: Gain,
    /// Decorrelation info; `None` when DecorInfoExists is zero on the wire.
    pub decor: Option<DecorCoef>,
}

impl BedChannel {
    pub fn new(channel_id: ChannelId, audio_data_id: AudioDataId) -> Self {
        Self {
            channel_id,
            audio_data_id,
            gain: Gain::Unity,
            decor: None,
        }
    }

    fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
    ) -> Result<Self, ParseError> {
        let channel_id = ChannelId::from_code(reader.get_plex(4)?);
        let audio_data_id = reader.get_plex(8)?;
        let gain = Gain::read(reader)?;

        let decor = if reader.get()? {
            Some(DecorCoef::read(reader, 4)?)
        } else {
            None
        };

        Ok(Self {
            channel_id,
            audio_data_id,
            gain,
            decor,
        })
    }

    fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_plex(4, self.channel_id.code())?;
        writer.put_plex(8, self.audio_data_id)?;
        self.gain.write(writer)?;

        writer.put(self.decor.is_some())?;
        if let Some(decor) = self.decor {
            decor.write(writer, 4)?;
        }

        Ok(())
    }
}

/// A named static channel set.
#[derive(Debug, Clone, PartialEq)]
pub struct BedDefinition {
    pub meta_id: MetaId,
    pub conditional: bool,
    /// Target intent; only meaningful (and only on the wire) when
    /// `conditional` is set.
    pub use_case: Option<UseCase>,
    pub channels: Vec<BedChannel>,
    pub audio_description: AudioDescription,
    sub_elements: Vec<Element>,
    pub num_undefined_sub_elements: u32,
    pub num_unallowed_sub_elements: u32,
    pub packing_enabled: bool,
}

impl BedDefinition {
    const PARENT_ID_CODE: u32 = ElementId::BedDefinition.code();

    pub fn new(meta_id: MetaId) -> Self {
        Self {
            meta_id,
            conditional: false,
            use_case: None,
            channels: Vec::new(),
            audio_description: AudioDescription::default(),
            sub_elements: Vec::new(),
            num_undefined_sub_elements: 0,
            num_unallowed_sub_elements: 0,
            packing_enabled: true,
        }
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        ctx: &FrameCtx,
    ) -> Result<Self, ParseError> {
        let mut bed = Self::new(reader.get_plex(8)?);

        bed.conditional = reader.get()?;
        if bed.conditional {
            bed.use_case = Some(UseCase::from_code(reader.get_n(8)?));
        }

        let channel_count = reader.get_plex(4)?;
        for _ in 0..channel_count {
            bed.channels.push(BedChannel::read(reader)?);
        }

        reader.align();
        bed.audio_description = AudioDescription::read(reader)?;

        let sub_element_count = reader.get_plex(8)?;
        for _ in 0..sub_element_count {
            match read_child(reader, ctx, ParentKind::Bed)? {
                ParsedChild::Element(element) => bed.sub_elements.push(element),
                ParsedChild::Unallowed(id) => {
                    debug!("skipped element {:#X}, not allowed below a bed", id.code());
                    bed.num_unallowed_sub_elements += 1;
                }
                ParsedChild::Undefined(code) => {
                    debug!("skipped undefined element {code:#X} below a bed");
                    bed.num_undefined_sub_elements += 1;
                }
            }
        }

        Ok(bed)
    }

    fn write_body(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_plex(8, self.meta_id)?;

        writer.put(self.conditional)?;
        if self.conditional {
            let use_case = self.use_case.unwrap_or(UseCase::Always);
            writer.put_n(8, use_case.code() as u32)?;
        }

        writer.put_plex(4, self.channels.len() as u32)?;
        for channel in &self.channels {
            channel.write(writer)?;
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
        write_envelope(writer, ElementId::BedDefinition, &body.into_bytes()?)
    }

    /// Field-level conformance checks plus sub-element recursion. Relational
    /// checks against sibling elements live in the frame validator.
    pub fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        let id = IssueId::MetaId(self.meta_id);

        if self.conditional
            && let Some(use_case) = self.use_case
            && !use_case.is_defined()
            && !ctx.report_both_bases(id, ErrorCode::BedDefinitionUndefinedUseCase)
        {
            return false;
        }

        if self.audio_description.is_reserved()
            && !ctx.report_both_bases(id, ErrorCode::BedDefinitionUndefinedAudioDescription)
        {
            return false;
        }

        let max_text = registry::params(ConstraintSet::CinemaSt2098_2_2018).max_audio_description_bytes;
        if self.audio_description.text.len() > max_text
            && !ctx.report_both_bases(id, ErrorCode::BedDefinitionAudioDescriptionTextExceeded)
        {
            return false;
        }

        for channel in &self.channels {
            if !self.validate_channel(channel, id, ctx) {
                return false;
            }
        }

        if !self.validate_profile_fields(id, ctx) {
            return false;
        }

        for element in &self.sub_elements {
            if let Element::BedRemap(remap) = element
                && remap.source_channels as usize != self.channels.len()
                && !ctx.report_both_bases(
                    IssueId::MetaId(remap.meta_id),
                    ErrorCode::BedRemapSourceChannelCountNotEqualToBed,
                )
            {
                return false;
            }

            if !element.validate(ctx) {
                return false;
            }
        }

        true
    }

    fn validate_channel(
        &self,
        channel: &BedChannel,
        id: IssueId,
        ctx: &mut ValidationCtx<'_>,
    ) -> bool {
        if !channel.channel_id.is_defined()
            && !ctx.report_both_bases(id, ErrorCode::BedDefinitionUndefinedChannelId)
        {
            return false;
        }

        if let Some(decor) = channel.decor
            && decor.is_reserved()
            && !ctx.report_both_bases(id, ErrorCode::BedDefinitionUnsupportedDecorPrefix)
        {
            return false;
        }

        for (set, codes) in DOLBY_BED_CODES {
            let params = registry::params(set);

            if let Some(allowed) = params.bed_channel_ids
                && !allowed.contains(&channel.channel_id)
                && !ctx.report(id, set, codes.invalid_channel_id)
            {
                return false;
            }

            if let Some(allowed) = params.bed_gain_prefixes
                && !allowed.contains(&channel.gain.prefix())
                && !ctx.report(id, set, codes.invalid_gain_prefix)
            {
                return false;
            }

            if params.channel_decor_must_be_absent
                && channel.decor.is_some()
                && !ctx.report(id, set, codes.decor_info_exists_not_zero)
            {
                return false;
            }
        }

        true
    }

    fn validate_profile_fields(&self, id: IssueId, ctx: &mut ValidationCtx<'_>) -> bool {
        if let Some(use_case) = self.use_case.filter(|_| self.conditional) {
            let params = registry::params(ConstraintSet::DbyCinema);
            if let Some(allowed) = params.bed_use_cases
                && !allowed.contains(&use_case)
                && !ctx.report(
                    id,
                    ConstraintSet::DbyCinema,
                    ErrorCode::DbyCinemaBedDefinitionInvalidUseCase,
                )
            {
                return false;
            }
        }

        if !self.sub_elements.is_empty() {
            if !registry::params(ConstraintSet::ImfSt2067_201_2019).allow_bed_sub_elements
                && !ctx.report(
                    id,
                    ConstraintSet::ImfSt2067_201_2019,
                    ErrorCode::BedDefinitionSubElementsNotAllowed,
                )
            {
                return false;
            }

            if !registry::params(ConstraintSet::DbyCinema).allow_bed_sub_elements
                && !ctx.report(
                    id,
                    ConstraintSet::DbyCinema,
                    ErrorCode::DbyCinemaBedDefinitionSubElementsNotAllowed,
                )
            {
                return false;
            }

            for element in &self.sub_elements {
                if matches!(element, Element::BedRemap(_))
                    && !ctx.report(
                        id,
                        ConstraintSet::DbyCinema,
                        ErrorCode::DbyCinemaBedRemapNotAnAllowedSubElement,
                    )
                {
                    return false;
                }
            }
        }

        true
    }
}

struct DolbyBedCodes {
    invalid_channel_id: ErrorCode,
    invalid_gain_prefix: ErrorCode,
    decor_info_exists_not_zero: ErrorCode,
}

const DOLBY_BED_CODES: [(ConstraintSet, DolbyBedCodes); 2] = [
    (
        ConstraintSet::DbyCinema,
        DolbyBedCodes {
            invalid_channel_id: ErrorCode::DbyCinemaBedDefinitionInvalidChannelId,
            invalid_gain_prefix: ErrorCode::DbyCinemaBedDefinitionInvalidGainPrefix,
            decor_info_exists_not_zero: ErrorCode::DbyCinemaBedDefinitionChannelDecorInfoExistsNotZero,
        },
    ),
    (
        ConstraintSet::DbyImf,
        DolbyBedCodes {
            invalid_channel_id: ErrorCode::DbyImfBedDefinitionInvalidChannelId,
            invalid_gain_prefix: ErrorCode::DbyImfBedDefinitionInvalidGainPrefix,
            decor_info_exists_not_zero: ErrorCode::DbyImfBedDefinitionChannelDecorInfoExistsNotZero,
        },
    ),
];

impl_sub_element_api!(BedDefinition, ParentKind::Bed);

/// Remap coefficients for one destination channel: its ID and one gain per
/// source channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RemapCoeffs {
    pub dest_channel_id: ChannelId,
    pub gains: Vec<Gain>,
}

/// One remap time slice. Sub-block zero is always present on the wire;
/// later sub-blocks carry an existence flag and reuse the previous
/// coefficients when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct BedRemapSubBlock {
    pub remap_info_exists: bool,
    pub coeffs: Vec<RemapCoeffs>,
}

/// Remap matrix from a source bed to a destination channel layout.
#[derive(Debug, Clone, PartialEq)]
pub struct BedRemap {
    pub meta_id: MetaId,
    pub use_case: UseCase,
    pub source_channels: u16,
    pub destination_channels: u16,
    pub sub_blocks: Vec<BedRemapSubBlock>,
    pub packing_enabled: bool,
}

impl BedRemap {
    pub fn new(meta_id: MetaId, use_case: UseCase) -> Self {
        Self {
            meta_id,
            use_case,
            source_channels: 0,
            destination_channels: 0,
            sub_blocks: Vec::new(),
            packing_enabled: true,
        }
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        ctx: &FrameCtx,
    ) -> Result<Self, ParseError> {
        let mut remap = Self::new(reader.get_plex(8)?, UseCase::from_code(reader.get_n(8)?));

        remap.source_channels = reader.get_plex(4)? as u16;
        remap.destination_channels = reader.get_plex(4)? as u16;

        for index in 0..ctx.frame_rate.sub_block_count() {
            let exists = if index == 0 { true } else { reader.get()? };

            let mut sub_block = BedRemapSubBlock {
                remap_info_exists: exists,
                coeffs: Vec::new(),
            };

            if exists {
                for _ in 0..remap.destination_channels {
                    let dest_channel_id = ChannelId::from_code(reader.get_plex(4)?);
                    let mut gains = Vec::with_capacity(remap.source_channels as usize);
                    for _ in 0..remap.source_channels {
                        gains.push(Gain::read(reader)?);
                    }

                    sub_block.coeffs.push(RemapCoeffs {
                        dest_channel_id,
                        gains,
                    });
                }
            }

            remap.sub_blocks.push(sub_block);
        }

        reader.align();

        Ok(remap)
    }

    fn write_body(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_plex(8, self.meta_id)?;
        writer.put_n(8, self.use_case.code() as u32)?;
        writer.put_plex(4, self.source_channels as u32)?;
        writer.put_plex(4, self.destination_channels as u32)?;

        for (index, sub_block) in self.sub_blocks.iter().enumerate() {
            if index > 0 {
                writer.put(sub_block.remap_info_exists)?;
            }

            if sub_block.remap_info_exists {
                for coeffs in &sub_block.coeffs {
                    writer.put_plex(4, coeffs.dest_channel_id.code())?;
                    for gain in &coeffs.gains {
                        gain.write(writer)?;
                    }
                }
            }
        }

        writer.align()
    }

    pub fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        let mut body = BitstreamIoWriter::new();
        self.write_body(&mut body)?;
        write_envelope(writer, ElementId::BedRemap, &body.into_bytes()?)
    }

    pub fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        let id = IssueId::MetaId(self.meta_id);

        if !self.use_case.is_defined()
            && !ctx.report_both_bases(id, ErrorCode::BedRemapUndefinedUseCase)
        {
            return false;
        }

        if let Some(frame_rate) = ctx.frame_rate
            && self.sub_blocks.len() != frame_rate.sub_block_count()
            && !ctx.report_both_bases(id, ErrorCode::BedRemapSubBlockCountConflict)
        {
            return false;
        }

        for sub_block in self.sub_blocks.iter().filter(|s| s.remap_info_exists) {
            if sub_block.coeffs.len() != self.destination_channels as usize
                && !ctx.report_both_bases(id, ErrorCode::BedRemapDestinationChannelCountConflict)
            {
                return false;
            }

            for coeffs in &sub_block.coeffs {
                if coeffs.gains.len() != self.source_channels as usize
                    && !ctx.report_both_bases(id, ErrorCode::BedRemapSourceChannelCountConflict)
                {
                    return false;
                }

                if !coeffs.dest_channel_id.is_defined()
                    && !ctx.report_both_bases(id, ErrorCode::BedRemapUndefinedChannelId)
                {
                    return false;
                }
            }
        }

        true
    }
}
