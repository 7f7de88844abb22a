//! Primitive semantic types and enumerated code tables.
//!
//! Every code table lives here and nowhere else; the parser, packer and the
//! constraint registry all map through these enums.

use std::fmt::Display;
use std::io;

use crate::utils::bitstream_io::{BitstreamIoReader, BitstreamIoWriter};
use crate::utils::errors::ParseError;

/// Identifier of a bed, remap or object, unique within one frame.
pub type MetaId = u32;

/// Identifier of an essence element, unique within one frame. `0` denotes
/// silence and never resolves to an essence element.
pub type AudioDataId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleRate {
    Fs48000,
    Fs96000,
}

impl SampleRate {
    pub fn from_code(code: u8) -> Result<Self, ParseError> {
        match code {
            0 => Ok(Self::Fs48000),
            1 => Ok(Self::Fs96000),
            _ => Err(ParseError::InvalidSampleRate(code)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Fs48000 => 0,
            Self::Fs96000 => 1,
        }
    }

    pub fn hertz(self) -> u32 {
        match self {
            Self::Fs48000 => 48_000,
            Self::Fs96000 => 96_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitDepth {
    Bit16,
    Bit24,
}

impl BitDepth {
    pub fn from_code(code: u8) -> Result<Self, ParseError> {
        match code {
            0 => Ok(Self::Bit16),
            1 => Ok(Self::Bit24),
            _ => Err(ParseError::InvalidBitDepth(code)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Bit16 => 0,
            Self::Bit24 => 1,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::Bit16 => 16,
            Self::Bit24 => 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameRate {
    Fps23_976,
    Fps24,
    Fps25,
    Fps30,
    Fps48,
    Fps50,
    Fps60,
    Fps96,
    Fps100,
    Fps120,
}

impl FrameRate {
    pub fn from_code(code: u8) -> Result<Self, ParseError> {
        match code {
            0 => Ok(Self::Fps23_976),
            1 => Ok(Self::Fps24),
            2 => Ok(Self::Fps25),
            3 => Ok(Self::Fps30),
            4 => Ok(Self::Fps48),
            5 => Ok(Self::Fps50),
            6 => Ok(Self::Fps60),
            7 => Ok(Self::Fps96),
            8 => Ok(Self::Fps100),
            9 => Ok(Self::Fps120),
            _ => Err(ParseError::InvalidFrameRate(code)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Fps23_976 => 0,
            Self::Fps24 => 1,
            Self::Fps25 => 2,
            Self::Fps30 => 3,
            Self::Fps48 => 4,
            Self::Fps50 => 5,
            Self::Fps60 => 6,
            Self::Fps96 => 7,
            Self::Fps100 => 8,
            Self::Fps120 => 9,
        }
    }

    /// Samples per bed channel or object for one frame duration.
    pub fn samples_per_frame(self, sample_rate: SampleRate) -> u32 {
        let base = match self {
            Self::Fps23_976 => 2002,
            Self::Fps24 => 2000,
            Self::Fps25 => 1920,
            Self::Fps30 => 1600,
            Self::Fps48 => 1000,
            Self::Fps50 => 960,
            Self::Fps60 => 800,
            Self::Fps96 => 500,
            Self::Fps100 => 480,
            Self::Fps120 => 400,
        };

        match sample_rate {
            SampleRate::Fs48000 => base,
            SampleRate::Fs96000 => base * 2,
        }
    }

    /// Number of pan/remap sub-blocks per frame. Halves as the frame rate
    /// family doubles so sub-block duration stays roughly constant.
    pub fn sub_block_count(self) -> usize {
        match self {
            Self::Fps23_976 | Self::Fps24 | Self::Fps25 | Self::Fps30 => 8,
            Self::Fps48 | Self::Fps50 | Self::Fps60 => 4,
            Self::Fps96 | Self::Fps100 | Self::Fps120 => 2,
        }
    }

    /// True for the NTSC-family fractional rate, which DLC coding does not
    /// support.
    pub fn is_fractional(self) -> bool {
        matches!(self, Self::Fps23_976)
    }
}

impl Display for FrameRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fps23_976 => write!(f, "23.976 fps"),
            Self::Fps24 => write!(f, "24 fps"),
            Self::Fps25 => write!(f, "25 fps"),
            Self::Fps30 => write!(f, "30 fps"),
            Self::Fps48 => write!(f, "48 fps"),
            Self::Fps50 => write!(f, "50 fps"),
            Self::Fps60 => write!(f, "60 fps"),
            Self::Fps96 => write!(f, "96 fps"),
            Self::Fps100 => write!(f, "100 fps"),
            Self::Fps120 => write!(f, "120 fps"),
        }
    }
}

/// Bed channel slot codes.
///
/// Codes outside the defined table parse into [`ChannelId::Undefined`]; the
/// validator decides whether that is a warning or a profile error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Left,
    LeftCenter,
    Center,
    RightCenter,
    Right,
    LeftSideSurround,
    LeftSurround,
    LeftRearSurround,
    RightRearSurround,
    RightSideSurround,
    RightSurround,
    LeftTopSurround,
    RightTopSurround,
    Lfe,
    LeftHeight,
    RightHeight,
    CenterHeight,
    LeftSurroundHeight,
    RightSurroundHeight,
    LeftSideSurroundHeight,
    RightSideSurroundHeight,
    LeftRearSurroundHeight,
    RightRearSurroundHeight,
    TopSurround,
    Undefined(u32),
}

impl ChannelId {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Left,
            1 => Self::LeftCenter,
            2 => Self::Center,
            3 => Self::RightCenter,
            4 => Self::Right,
            5 => Self::LeftSideSurround,
            6 => Self::LeftSurround,
            7 => Self::LeftRearSurround,
            8 => Self::RightRearSurround,
            9 => Self::RightSideSurround,
            10 => Self::RightSurround,
            11 => Self::LeftTopSurround,
            12 => Self::RightTopSurround,
            13 => Self::Lfe,
            14 => Self::LeftHeight,
            15 => Self::RightHeight,
            16 => Self::CenterHeight,
            17 => Self::LeftSurroundHeight,
            18 => Self::RightSurroundHeight,
            19 => Self::LeftSideSurroundHeight,
            20 => Self::RightSideSurroundHeight,
            21 => Self::LeftRearSurroundHeight,
            22 => Self::RightRearSurroundHeight,
            23 => Self::TopSurround,
            other => Self::Undefined(other),
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Left => 0,
            Self::LeftCenter => 1,
            Self::Center => 2,
            Self::RightCenter => 3,
            Self::Right => 4,
            Self::LeftSideSurround => 5,
            Self::LeftSurround => 6,
            Self::LeftRearSurround => 7,
            Self::RightRearSurround => 8,
            Self::RightSideSurround => 9,
            Self::RightSurround => 10,
            Self::LeftTopSurround => 11,
            Self::RightTopSurround => 12,
            Self::Lfe => 13,
            Self::LeftHeight => 14,
            Self::RightHeight => 15,
            Self::CenterHeight => 16,
            Self::LeftSurroundHeight => 17,
            Self::RightSurroundHeight => 18,
            Self::LeftSideSurroundHeight => 19,
            Self::RightSideSurroundHeight => 20,
            Self::LeftRearSurroundHeight => 21,
            Self::RightRearSurroundHeight => 22,
            Self::TopSurround => 23,
            Self::Undefined(other) => other,
        }
    }

    pub fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined(_))
    }
}

/// Encoded target-configuration intent for conditional elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseCase {
    Case5_1,
    Case7_1Ds,
    Case7_1Sds,
    Case11_1Ht,
    Case13_1Ht,
    Case9_1Oh,
    Always,
    Undefined(u8),
}

impl UseCase {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::Case5_1,
            0x02 => Self::Case7_1Ds,
            0x03 => Self::Case7_1Sds,
            0x04 => Self::Case11_1Ht,
            0x05 => Self::Case13_1Ht,
            0x06 => Self::Case9_1Oh,
            0xFF => Self::Always,
            other => Self::Undefined(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Case5_1 => 0x01,
            Self::Case7_1Ds => 0x02,
            Self::Case7_1Sds => 0x03,
            Self::Case11_1Ht => 0x04,
            Self::Case13_1Ht => 0x05,
            Self::Case9_1Oh => 0x06,
            Self::Always => 0xFF,
            Self::Undefined(other) => other,
        }
    }

    pub fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined(_))
    }
}

/// Quantized gain with a two-bit prefix selector.
///
/// Prefix 0 selects unity, 1 selects silence, 2 carries a 10-bit code in
/// half-decibel attenuation steps. Prefix 3 is reserved and rejected at
/// parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gain {
    Unity,
    Silence,
    InStream(u16),
}

impl Default for Gain {
    fn default() -> Self {
        Self::Unity
    }
}

impl Gain {
    pub fn prefix(self) -> u8 {
        match self {
            Self::Unity => 0,
            Self::Silence => 1,
            Self::InStream(_) => 2,
        }
    }

    pub fn linear(self) -> f32 {
        match self {
            Self::Unity => 1.0,
            Self::Silence => 0.0,
            Self::InStream(code) => 10f32.powf(-0.5 * code as f32 / 20.0),
        }
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
    ) -> Result<Self, ParseError> {
        match reader.get_n::<u8>(2)? {
            0 => Ok(Self::Unity),
            1 => Ok(Self::Silence),
            2 => Ok(Self::InStream(reader.get_n(10)?)),
            _ => Err(ParseError::Corruption("reserved gain prefix")),
        }
    }

    pub(crate) fn write(self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_n(2, self.prefix() as u32)?;
        if let Self::InStream(code) = self {
            writer.put_n(10, code as u32)?;
        }

        Ok(())
    }
}

/// Decorrelation coefficient with a prefix selector.
///
/// Bed channels carry a four-bit prefix, object sub-blocks a two-bit one;
/// reserved prefixes are preserved so the validator can flag them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorCoef {
    NoDecor,
    MaxDecor,
    InStream(u8),
    Reserved(u8),
}

impl Default for DecorCoef {
    fn default() -> Self {
        Self::NoDecor
    }
}

impl DecorCoef {
    pub fn prefix(self) -> u8 {
        match self {
            Self::NoDecor => 0,
            Self::MaxDecor => 1,
            Self::InStream(_) => 2,
            Self::Reserved(code) => code,
        }
    }

    pub fn is_reserved(self) -> bool {
        matches!(self, Self::Reserved(_))
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
        prefix_bits: u32,
    ) -> Result<Self, ParseError> {
        match reader.get_n::<u8>(prefix_bits)? {
            0 => Ok(Self::NoDecor),
            1 => Ok(Self::MaxDecor),
            2 => Ok(Self::InStream(reader.get_n(8)?)),
            code => Ok(Self::Reserved(code)),
        }
    }

    pub(crate) fn write(self, writer: &mut BitstreamIoWriter, prefix_bits: u32) -> io::Result<()> {
        writer.put_n(prefix_bits, self.prefix() as u32)?;
        if let Self::InStream(coef) = self {
            writer.put_n(8, coef as u32)?;
        }

        Ok(())
    }
}

/// Object position quantized to the unit cube, 16 bits per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: u16,
    pub y: u16,
    pub z: u16,
}

impl Position {
    pub fn to_unit_cube(self) -> (f32, f32, f32) {
        let scale = |v: u16| v as f32 / u16::MAX as f32;
        (scale(self.x), scale(self.y), scale(self.z))
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
    ) -> io::Result<Self> {
        Ok(Self {
            x: reader.get_n(16)?,
            y: reader.get_n(16)?,
            z: reader.get_n(16)?,
        })
    }

    pub(crate) fn write(self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_n(16, self.x as u32)?;
        writer.put_n(16, self.y as u32)?;
        writer.put_n(16, self.z as u32)
    }
}

/// Object snap state. The 12-bit tolerance is only present on the wire when
/// both flags are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Snap {
    pub present: bool,
    pub tol_exists: bool,
    pub tolerance: u16,
}

impl Snap {
    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
    ) -> io::Result<Self> {
        let mut snap = Self {
            present: reader.get()?,
            ..Default::default()
        };

        if snap.present {
            snap.tol_exists = reader.get()?;
            if snap.tol_exists {
                snap.tolerance = reader.get_n(12)?;
            }
        }

        Ok(snap)
    }

    pub(crate) fn write(self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put(self.present)?;
        if self.present {
            writer.put(self.tol_exists)?;
            if self.tol_exists {
                writer.put_n(12, self.tolerance as u32)?;
            }
        }

        Ok(())
    }
}

/// Nine-zone gain refinement carried inside object pan sub-blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectZoneGains9 {
    pub control: bool,
    pub gains: [Gain; 9],
}

impl Default for ObjectZoneGains9 {
    fn default() -> Self {
        Self {
            control: false,
            gains: [Gain::Unity; 9],
        }
    }
}

impl ObjectZoneGains9 {
    /// Bitmask with bit `i` set when zone `i` is not silent. Used for the
    /// preset-pattern profile checks.
    pub fn activation_mask(&self) -> u16 {
        self.gains
            .iter()
            .enumerate()
            .fold(0, |mask, (i, gain)| match gain {
                Gain::Silence => mask,
                _ => mask | (1 << i),
            })
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
    ) -> Result<Self, ParseError> {
        let mut zone = Self {
            control: reader.get()?,
            ..Default::default()
        };

        if zone.control {
            for gain in zone.gains.iter_mut() {
                *gain = Gain::read(reader)?;
            }
        }

        Ok(zone)
    }

    pub(crate) fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put(self.control)?;
        if self.control {
            for gain in &self.gains {
                gain.write(writer)?;
            }
        }

        Ok(())
    }
}

/// Object spread. The two-bit mode selector chooses the payload resolution;
/// mode 1 is reserved and rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spread {
    LowRes1d(u8),
    HighRes1d(u16),
    HighRes3d { x: u16, y: u16, z: u16 },
}

impl Default for Spread {
    fn default() -> Self {
        Self::LowRes1d(0)
    }
}

impl Spread {
    pub fn mode(self) -> u8 {
        match self {
            Self::LowRes1d(_) => 0,
            Self::HighRes1d(_) => 2,
            Self::HighRes3d { .. } => 3,
        }
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
    ) -> Result<Self, ParseError> {
        match reader.get_n::<u8>(2)? {
            0 => Ok(Self::LowRes1d(reader.get_n(8)?)),
            2 => Ok(Self::HighRes1d(reader.get_n(12)?)),
            3 => Ok(Self::HighRes3d {
                x: reader.get_n(12)?,
                y: reader.get_n(12)?,
                z: reader.get_n(12)?,
            }),
            _ => Err(ParseError::Corruption("reserved spread mode")),
        }
    }

    pub(crate) fn write(self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_n(2, self.mode() as u32)?;
        match self {
            Self::LowRes1d(spread) => writer.put_n(8, spread as u32),
            Self::HighRes1d(spread) => writer.put_n(12, spread as u32),
            Self::HighRes3d { x, y, z } => {
                writer.put_n(12, x as u32)?;
                writer.put_n(12, y as u32)?;
                writer.put_n(12, z as u32)
            }
        }
    }
}

/// Audio content description: an eight-bit code, optionally followed by a
/// NUL-terminated text string when the text bit (0x80) is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AudioDescription {
    pub code: u8,
    pub text: Vec<u8>,
}

pub const AUDIO_DESCRIPTION_TEXT_BIT: u8 = 0x80;

/// Defined audio description content codes, ignoring the text bit.
pub const AUDIO_DESCRIPTION_DEFINED_MASK: u8 = 0x0F;

impl AudioDescription {
    pub fn has_text(&self) -> bool {
        self.code & AUDIO_DESCRIPTION_TEXT_BIT != 0
    }

    /// True when reserved bits of the content code are set.
    pub fn is_reserved(&self) -> bool {
        self.code & !AUDIO_DESCRIPTION_TEXT_BIT & !AUDIO_DESCRIPTION_DEFINED_MASK != 0
    }

    pub(crate) fn read<R: io::Read + io::Seek>(
        reader: &mut BitstreamIoReader<R>,
    ) -> io::Result<Self> {
        let mut description = Self {
            code: reader.get_n(8)?,
            ..Default::default()
        };

        if description.has_text() {
            loop {
                let byte: u8 = reader.get_n(8)?;
                if byte == 0 {
                    break;
                }
                description.text.push(byte);
            }
        }

        Ok(description)
    }

    pub(crate) fn write(&self, writer: &mut BitstreamIoWriter) -> io::Result<()> {
        writer.put_n(8, self.code as u32)?;
        if self.has_text() {
            writer.put_bytes(&self.text)?;
            writer.put_n(8, 0u32)?;
        }

        Ok(())
    }
}
