#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("End of stream reached")]
    EndOfStream,

    #[error("Bitstream preamble sub-frame is missing")]
    MissingPreamble,

    #[error("Invalid bitstream version: {0:#04X}")]
    InvalidVersion(u8),

    #[error("Invalid sample rate code: {0:#X}")]
    InvalidSampleRate(u8),

    #[error("Invalid frame rate code: {0:#X}")]
    InvalidFrameRate(u8),

    #[error("Invalid bit depth code: {0:#X}")]
    InvalidBitDepth(u8),

    #[error("Invalid sub-frame tag: read {read:#04X}, expected {expected:#04X}")]
    InvalidSubFrameTag { read: u8, expected: u8 },

    #[error("Preamble length changed between frames: read {read}, expected {expected}")]
    SubFrameHeaderMismatch { read: u32, expected: u32 },

    #[error("First element of a frame sub-frame must be an IAFrame, read element ID {0:#X}")]
    NotAFrameElement(u32),

    #[error(
        "Element {element:#X} body length mismatch: declared {declared} bytes, consumed {consumed} bits"
    )]
    ElementLengthMismatch {
        element: u32,
        declared: u32,
        consumed: u64,
    },

    #[error("Frame sub-frame length mismatch: declared {declared} bytes, consumed {consumed} bits")]
    FrameLengthMismatch { declared: u32, consumed: u64 },

    #[error("Possible data corruption: {0}")]
    Corruption(&'static str),

    #[error("No parsed frame available")]
    NoParsedFrame,

    #[error("Parser was created without a byte source")]
    NoByteSource,

    #[error("No AudioDataDLC element with AudioDataID {0} in the parsed frame")]
    NoSuchDlcElement(u32),

    #[error("DLC codec error: {0}")]
    Dlc(anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("Plex field width {0} exceeds the 32-bit maximum")]
    PlexWidthExceeded(u32),

    #[error("Plex value {0} is not encodable")]
    PlexValueTooLarge(u64),

    #[error("PackedLength field spans {0} bytes, maximum is 4")]
    PackedLengthTooWide(u8),
}

#[derive(thiserror::Error, Debug)]
pub enum ElementError {
    #[error("Element type {child:#X} is not an allowed sub-element of {parent:#X}")]
    NotAnAllowedSubElement { parent: u32, child: u32 },

    #[error("Writer capacity of {capacity} bytes cannot hold {written} already-written bits")]
    CapacityBelowWritten { capacity: u64, written: u64 },
}
