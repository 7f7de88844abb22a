//! Audio essence elements: DLC-compressed and packed PCM sample payloads.

use std::io;

use crate::dlc::DlcCodec;
use crate::structs::element::{ElementId, FrameCtx, write_envelope};
use crate::structs::types::{AudioDataId, BitDepth, FrameRate, SampleRate};
use crate::utils::bitstream_io::{BitstreamIoReader, BitstreamIoWriter};
use crate::utils::errors::ParseError;
use crate::validate::issue::{ConstraintSet, ErrorCode, IssueId};
use crate::validate::{ValidationCtx, registry};

/// Compressed mono audio essence. The DLC payload is opaque to the parser;
/// only the AudioDataID and the coded sample rate are inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDataDlc {
    pub audio_data_id: AudioDataId,
    pub dlc_sample_rate: SampleRate,
    pub dlc_data: Vec<u8>,
    pub packing_enabled: bool,
}

impl AudioDataDlc {
    pub fn new(audio_data_id: AudioDataId, dlc_sample_rate: SampleRate) -> Self {
        Self {
            audio_data_id,
            dlc_sample_rate,
            dlc_data: Vec::new(),
            packing_enabled: true,
        }
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
    ) -> Result<Self, ParseError> {
        let audio_data_id = reader.get_plex(8)?;
        let dlc_sample_rate = SampleRate::from_code(reader.get_n(2)?)?;
        let dlc_size: u16 = reader.get_n(16)?;

        let mut dlc_data = vec![0u8; dlc_size as usize];
        reader.get_aligned_bytes(&mut dlc_data)?;

        Ok(Self {
            audio_data_id,
            dlc_sample_rate,
            dlc_data,
            packing_enabled: true,
        })
    }

    fn write_body(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_plex(8, self.audio_data_id)?;
        writer.put_n(2, self.dlc_sample_rate.code() as u32)?;
        writer.put_n(16, self.dlc_data.len() as u32)?;
        writer.align()?;
        writer.put_bytes(&self.dlc_data)
    }

    pub fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        let mut body = BitstreamIoWriter::new();
        self.write_body(&mut body)?;
        write_envelope(writer, ElementId::AudioDataDlc, &body.into_bytes()?)
    }

    /// Decodes the payload to mono PCM through the codec oracle.
    pub fn decode_mono(
        &self,
        codec: &dyn DlcCodec,
        sample_count: usize,
    ) -> Result<Vec<i32>, ParseError> {
        codec
            .decode(&self.dlc_data, self.dlc_sample_rate, sample_count)
            .map_err(ParseError::Dlc)
    }

    pub fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        let id = IssueId::AudioDataId(self.audio_data_id);

        if self.audio_data_id == 0
            && !ctx.report_both_bases(id, ErrorCode::AudioDataDlcAudioDataIdZero)
        {
            return false;
        }

        if let Some(frame_rate) = ctx.frame_rate
            && frame_rate.is_fractional()
            && !ctx.report_both_bases(id, ErrorCode::DlcUsedWithIncompatibleFrameRate)
        {
            return false;
        }

        // Flag the essence type once per chain, at the first set that
        // forbids it; dependents inherit through the rollup.
        for set in ConstraintSet::ALL {
            let forbidden = !registry::params(set).allow_dlc_essence;
            let base_allows = set
                .base()
                .is_none_or(|base| registry::params(base).allow_dlc_essence);

            if forbidden
                && base_allows
                && !ctx.report(id, set, ErrorCode::AudioDataDlcNotAnAllowedSubElement)
            {
                return false;
            }
        }

        true
    }
}

/// Uncompressed packed audio essence for one bed channel or object.
///
/// Samples live in `i32` containers with the significant bits at the top;
/// on the wire each sample is `bit_depth` big-endian bits.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioDataPcm {
    pub audio_data_id: AudioDataId,
    pub frame_rate: FrameRate,
    pub sample_rate: SampleRate,
    pub bit_depth: BitDepth,
    pub samples: Vec<i32>,
    pub packing_enabled: bool,
}

impl AudioDataPcm {
    pub fn new(
        audio_data_id: AudioDataId,
        frame_rate: FrameRate,
        sample_rate: SampleRate,
        bit_depth: BitDepth,
    ) -> Self {
        Self {
            audio_data_id,
            frame_rate,
            sample_rate,
            bit_depth,
            samples: Vec::new(),
            packing_enabled: true,
        }
    }

    /// Creates a silent PCM element with the sample count the frame
    /// parameters require.
    pub fn silence(
        audio_data_id: AudioDataId,
        frame_rate: FrameRate,
        sample_rate: SampleRate,
        bit_depth: BitDepth,
    ) -> Self {
        let mut pcm = Self::new(audio_data_id, frame_rate, sample_rate, bit_depth);
        pcm.samples = vec![0; frame_rate.samples_per_frame(sample_rate) as usize];
        pcm
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        ctx: &FrameCtx,
    ) -> Result<Self, ParseError> {
        let mut pcm = Self::new(
            reader.get_plex(8)?,
            ctx.frame_rate,
            ctx.sample_rate,
            ctx.bit_depth,
        );

        reader.align();

        let count = ctx.frame_rate.samples_per_frame(ctx.sample_rate);
        let depth = ctx.bit_depth.bits();
        pcm.samples.reserve(count as usize);

        for _ in 0..count {
            let raw: u32 = reader.get_n(depth)?;
            pcm.samples.push((raw << (32 - depth)) as i32);
        }

        reader.align();

        Ok(pcm)
    }

    fn write_body(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_plex(8, self.audio_data_id)?;
        writer.align()?;

        let depth = self.bit_depth.bits();
        for &sample in &self.samples {
            writer.put_n(depth, (sample as u32) >> (32 - depth))?;
        }

        writer.align()
    }

    pub fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        let mut body = BitstreamIoWriter::new();
        self.write_body(&mut body)?;
        write_envelope(writer, ElementId::AudioDataPcm, &body.into_bytes()?)
    }

    pub fn validate(&self, ctx: &mut ValidationCtx<'_>) -> bool {
        let id = IssueId::AudioDataId(self.audio_data_id);

        if self.audio_data_id == 0
            && !ctx.report_both_bases(id, ErrorCode::AudioDataPcmAudioDataIdZero)
        {
            return false;
        }

        for set in ConstraintSet::ALL {
            let forbidden = !registry::params(set).allow_pcm_essence;
            let base_allows = set
                .base()
                .is_none_or(|base| registry::params(base).allow_pcm_essence);

            if forbidden
                && base_allows
                && !ctx.report(id, set, ErrorCode::AudioDataPcmNotAnAllowedSubElement)
            {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::BsIoSliceReader;

    #[test]
    fn pcm_sample_packing_keeps_upper_bits() {
        let ctx = FrameCtx {
            sample_rate: SampleRate::Fs48000,
            bit_depth: BitDepth::Bit24,
            frame_rate: FrameRate::Fps120,
        };

        let mut pcm = AudioDataPcm::new(
            7,
            ctx.frame_rate,
            ctx.sample_rate,
            ctx.bit_depth,
        );
        pcm.samples = vec![0x12_34_56_00u32 as i32; 400];
        pcm.samples[0] = 0xFF_FF_FF_00u32 as i32; // -1 at 24-bit depth
        pcm.samples[1] = i32::MIN; // most negative 24-bit sample

        let mut writer = BitstreamIoWriter::new();
        pcm.write_body(&mut writer).unwrap();
        let bytes = writer.into_bytes().unwrap();

        let mut reader = BsIoSliceReader::from_slice(&bytes);
        let round = AudioDataPcm::read(&mut reader, &ctx).unwrap();
        assert_eq!(round.samples, pcm.samples);
        assert_eq!(round.sample_count(), 400);
    }

    #[test]
    fn silence_matches_frame_sample_count() {
        let pcm = AudioDataPcm::silence(
            1,
            FrameRate::Fps24,
            SampleRate::Fs48000,
            BitDepth::Bit24,
        );
        assert_eq!(pcm.sample_count(), 2000);
        assert!(pcm.samples.iter().all(|&s| s == 0));
    }
}
