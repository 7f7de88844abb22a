//! Frame parsing: preamble seeking, sub-frame headers and frame-element
//! decoding.
//!
//! Parsing one frame walks three phases:
//!
//! ```text
//! SeekPreamble -> ReadSubFrameHeader -> ReadFrameElement -> EndOfFrame
//! ```
//!
//! Absence of the preamble tag is fatal on the first frame and a benign
//! [`ParseError::EndOfStream`] afterwards. A parsed frame stays with the
//! parser until the next parse call, or until released to the caller.

use std::io;

use log::Level::Warn;

use crate::dlc::DlcCodec;
use crate::log_or_err;
use crate::structs::element::Element;
use crate::structs::frame::{FRAME_TAG, Frame, PREAMBLE_TAG};
use crate::structs::types::{AudioDataId, BitDepth, FrameRate, SampleRate};
use crate::utils::bitstream_io::{BitstreamIoReader, BsIoSliceReader};
use crate::utils::errors::ParseError;

/// Parser-level state carried across frames of one stream.
#[derive(Debug)]
pub struct ParserState {
    /// Log level at or below which stream anomalies abort the parse.
    pub fail_level: log::Level,
    pub has_parsed_frame: bool,
    preamble_length: Option<u32>,
    unallowed_sub_element_count: u32,
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            fail_level: log::Level::Error,
            has_parsed_frame: false,
            preamble_length: None,
            unallowed_sub_element_count: 0,
        }
    }
}

/// Parses frames from a byte source into [`Frame`] trees.
///
/// Two entry modes produce identical trees: attach a seekable byte source
/// with [`new_streaming`](Parser::new_streaming) and call
/// [`parse_frame`](Parser::parse_frame) repeatedly, or create a sourceless
/// parser with [`new_buffered`](Parser::new_buffered) and feed
/// self-contained frame buffers to
/// [`parse_frame_buffer`](Parser::parse_frame_buffer).
pub struct Parser<R: io::Read + io::Seek> {
    source: Option<BitstreamIoReader<R>>,
    state: ParserState,
    frame: Option<Frame>,
}

impl Parser<io::Cursor<Vec<u8>>> {
    /// Creates a parser for per-frame buffers, without a streaming source.
    pub fn new_buffered() -> Self {
        Self {
            source: None,
            state: ParserState::default(),
            frame: None,
        }
    }
}

impl<R> Parser<R>
where
    R: io::Read + io::Seek,
{
    /// Creates a parser attached to a seekable byte source.
    pub fn new_streaming(mut source: R) -> io::Result<Self> {
        let len_bytes = source.seek(io::SeekFrom::End(0))?;
        source.seek(io::SeekFrom::Start(0))?;

        Ok(Self {
            source: Some(BitstreamIoReader::new(source, len_bytes)),
            state: ParserState::default(),
            frame: None,
        })
    }

    /// Sets the failure level for stream anomalies.
    ///
    /// - `log::Level::Error`: only fail on hard errors (default)
    /// - `log::Level::Warn`: fail on warnings too (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.state.fail_level = level;
    }

    /// Parses the next frame from the attached streaming source.
    pub fn parse_frame(&mut self) -> Result<(), ParseError> {
        let Some(reader) = self.source.as_mut() else {
            return Err(ParseError::NoByteSource);
        };

        let frame = parse_one(reader, &mut self.state)?;
        self.state.unallowed_sub_element_count +=
            frame.num_unallowed_sub_elements + frame.num_undefined_sub_elements;
        self.frame = Some(frame);

        Ok(())
    }

    /// Parses exactly one frame from a self-contained buffer.
    pub fn parse_frame_buffer(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        let mut reader = BsIoSliceReader::from_slice(bytes);

        // A standalone buffer must open with its preamble; end-of-stream
        // leniency only applies between frames of an attached source.
        let had_parsed = self.state.has_parsed_frame;
        self.state.has_parsed_frame = false;
        let result = parse_one(&mut reader, &mut self.state);
        self.state.has_parsed_frame = had_parsed;

        let frame = result?;
        self.state.has_parsed_frame = true;
        self.state.unallowed_sub_element_count +=
            frame.num_unallowed_sub_elements + frame.num_undefined_sub_elements;
        self.frame = Some(frame);

        Ok(())
    }

    /// Borrows the most recently parsed frame.
    pub fn get_frame(&self) -> Result<&Frame, ParseError> {
        self.frame.as_ref().ok_or(ParseError::NoParsedFrame)
    }

    /// Releases ownership of the most recently parsed frame to the caller,
    /// e.g. to hand it to a validator running on another thread.
    pub fn release_frame(&mut self) -> Result<Frame, ParseError> {
        self.frame.take().ok_or(ParseError::NoParsedFrame)
    }

    pub fn sample_rate(&self) -> Option<SampleRate> {
        self.frame.as_ref().map(|f| f.sample_rate)
    }

    pub fn frame_rate(&self) -> Option<FrameRate> {
        self.frame.as_ref().map(|f| f.frame_rate)
    }

    pub fn bit_depth(&self) -> Option<BitDepth> {
        self.frame.as_ref().map(|f| f.bit_depth)
    }

    /// Samples per bed channel or object in the parsed frame.
    pub fn frame_sample_count(&self) -> Option<u32> {
        self.frame.as_ref().map(|f| f.frame_sample_count())
    }

    pub fn frame_sub_element_count(&self) -> usize {
        self.frame.as_ref().map_or(0, |f| f.sub_element_count())
    }

    /// Undefined plus not-allowed sub-elements encountered so far,
    /// cumulative over all parsed frames.
    pub fn unallowed_sub_element_count(&self) -> u32 {
        self.state.unallowed_sub_element_count
    }

    pub fn maximum_assets_to_be_rendered(&self) -> u32 {
        self.frame.as_ref().map_or(0, |f| f.max_rendered)
    }

    /// Locates the AudioDataDLC element carrying `audio_data_id` in the
    /// parsed frame and decodes it to mono PCM through the codec oracle.
    pub fn audio_asset_from_dlc(
        &self,
        audio_data_id: AudioDataId,
        codec: &dyn DlcCodec,
    ) -> Result<Vec<i32>, ParseError> {
        let frame = self.get_frame()?;

        for element in frame.sub_elements() {
            if let Element::AudioDataDlc(dlc) = element
                && dlc.audio_data_id == audio_data_id
            {
                return dlc.decode_mono(codec, frame.frame_sample_count() as usize);
            }
        }

        Err(ParseError::NoSuchDlcElement(audio_data_id))
    }
}

/// Runs the three parse phases over `reader`, producing one frame tree.
fn parse_one<R: io::Read + io::Seek>(
    reader: &mut BitstreamIoReader<R>,
    state: &mut ParserState,
) -> Result<Frame, ParseError> {
    // SeekPreamble: scan byte-aligned for the preamble tag.
    if let Err(e) = reader.sync(&[PREAMBLE_TAG], None) {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            return if state.has_parsed_frame {
                Err(ParseError::EndOfStream)
            } else {
                Err(ParseError::MissingPreamble)
            };
        }

        return Err(e.into());
    }

    // ReadSubFrameHeader: preamble sub-frame, then the frame payload header.
    let preamble_tag: u8 = reader.get_n(8)?;
    debug_assert_eq!(preamble_tag, PREAMBLE_TAG);

    let preamble_length: u32 = reader.get_n(32)?;
    if let Some(expected) = state.preamble_length
        && expected != preamble_length
    {
        log_or_err!(
            state,
            Warn,
            ParseError::SubFrameHeaderMismatch {
                read: preamble_length,
                expected,
            }
        );
    }
    state.preamble_length = Some(preamble_length);
    reader.skip_n(preamble_length << 3)?;

    let frame_tag: u8 = reader.get_n(8)?;
    if frame_tag != FRAME_TAG {
        return Err(ParseError::InvalidSubFrameTag {
            read: frame_tag,
            expected: FRAME_TAG,
        });
    }

    let frame_length: u32 = reader.get_n(32)?;

    // ReadFrameElement: exactly one IAFrame element, consuming the declared
    // payload whole.
    let element_start = reader.position()?;
    let frame = Frame::read(reader)?;

    let consumed = reader.position()? - element_start;
    if consumed != (frame_length as u64) << 3 {
        return Err(ParseError::FrameLengthMismatch {
            declared: frame_length,
            consumed,
        });
    }

    state.has_parsed_frame = true;

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::types::{BitDepth, FrameRate, SampleRate};
    use crate::utils::bitstream_io::BitstreamIoWriter;

    fn frame_bytes(frame: &Frame) -> Vec<u8> {
        let mut writer = BitstreamIoWriter::new();
        frame.write_sub_frame(&mut writer, &[]).unwrap();
        writer.into_bytes().unwrap()
    }

    #[test]
    fn streaming_parses_consecutive_frames() {
        let frame = Frame::new(SampleRate::Fs48000, BitDepth::Bit24, FrameRate::Fps24);

        let mut stream = frame_bytes(&frame);
        stream.extend(frame_bytes(&frame));

        let mut parser = Parser::new_streaming(io::Cursor::new(stream)).unwrap();

        parser.parse_frame().unwrap();
        assert_eq!(parser.frame_sample_count(), Some(2000));

        parser.parse_frame().unwrap();
        assert_eq!(parser.get_frame().unwrap(), &frame);

        assert!(matches!(
            parser.parse_frame(),
            Err(ParseError::EndOfStream)
        ));
    }

    #[test]
    fn missing_preamble_is_fatal_on_first_frame() {
        let garbage = vec![0xEEu8; 64];
        let mut parser = Parser::new_streaming(io::Cursor::new(garbage)).unwrap();

        assert!(matches!(
            parser.parse_frame(),
            Err(ParseError::MissingPreamble)
        ));
    }

    #[test]
    fn buffered_mode_parses_single_frames() {
        let frame = Frame::new(SampleRate::Fs96000, BitDepth::Bit16, FrameRate::Fps50);
        let bytes = frame_bytes(&frame);

        let mut parser = Parser::new_buffered();
        parser.parse_frame_buffer(&bytes).unwrap();
        assert_eq!(parser.sample_rate(), Some(SampleRate::Fs96000));
        assert_eq!(parser.frame_sample_count(), Some(1920));

        let released = parser.release_frame().unwrap();
        assert_eq!(released, frame);
        assert!(matches!(
            parser.get_frame(),
            Err(ParseError::NoParsedFrame)
        ));
    }

    #[test]
    fn released_frame_transfers_ownership() {
        let frame = Frame::new(SampleRate::Fs48000, BitDepth::Bit24, FrameRate::Fps25);
        let bytes = frame_bytes(&frame);

        let mut parser = Parser::new_buffered();
        parser.parse_frame_buffer(&bytes).unwrap();

        let owned = parser.release_frame().unwrap();
        drop(parser);
        assert_eq!(owned.frame_sample_count(), 1920);
    }
}
