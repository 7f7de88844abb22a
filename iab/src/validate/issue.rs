//! Issue model shared by the per-element and cross-element validators.
//!
//! A conformance finding is an [`Issue`]: an [`ErrorCode`] reported under one
//! [`ConstraintSet`] against one element ([`IssueId`]) of one frame. Issues
//! flow through an [`EventHandler`]; the stock handler lives in
//! [`super::handler`].

use std::fmt::Display;

/// The supported constraint-set profiles.
///
/// Two dependency chains, kept in declaration order:
/// Cinema ST2098-2:2018 → Cinema ST429-18:2019 → DbyCinema and
/// IMF ST2098-2:2019 → IMF ST2067-201:2019 → DbyIMF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintSet {
    CinemaSt2098_2_2018,
    CinemaSt429_18_2019,
    DbyCinema,
    ImfSt2098_2_2019,
    ImfSt2067_201_2019,
    DbyImf,
}

impl ConstraintSet {
    pub const ALL: [Self; 6] = [
        Self::CinemaSt2098_2_2018,
        Self::CinemaSt429_18_2019,
        Self::DbyCinema,
        Self::ImfSt2098_2_2019,
        Self::ImfSt2067_201_2019,
        Self::DbyImf,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::CinemaSt2098_2_2018 => 0,
            Self::CinemaSt429_18_2019 => 1,
            Self::DbyCinema => 2,
            Self::ImfSt2098_2_2019 => 3,
            Self::ImfSt2067_201_2019 => 4,
            Self::DbyImf => 5,
        }
    }

    /// The set this one directly depends on, if any.
    pub fn base(self) -> Option<Self> {
        match self {
            Self::CinemaSt2098_2_2018 | Self::ImfSt2098_2_2019 => None,
            Self::CinemaSt429_18_2019 => Some(Self::CinemaSt2098_2_2018),
            Self::DbyCinema => Some(Self::CinemaSt429_18_2019),
            Self::ImfSt2067_201_2019 => Some(Self::ImfSt2098_2_2019),
            Self::DbyImf => Some(Self::ImfSt2067_201_2019),
        }
    }

    /// Dependency chain ending at this set, base first.
    pub fn chain(self) -> &'static [Self] {
        match self {
            Self::CinemaSt2098_2_2018 => &[Self::CinemaSt2098_2_2018],
            Self::CinemaSt429_18_2019 => &[Self::CinemaSt2098_2_2018, Self::CinemaSt429_18_2019],
            Self::DbyCinema => &[
                Self::CinemaSt2098_2_2018,
                Self::CinemaSt429_18_2019,
                Self::DbyCinema,
            ],
            Self::ImfSt2098_2_2019 => &[Self::ImfSt2098_2_2019],
            Self::ImfSt2067_201_2019 => &[Self::ImfSt2098_2_2019, Self::ImfSt2067_201_2019],
            Self::DbyImf => &[
                Self::ImfSt2098_2_2019,
                Self::ImfSt2067_201_2019,
                Self::DbyImf,
            ],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::CinemaSt2098_2_2018 => "Cinema ST2098-2:2018",
            Self::CinemaSt429_18_2019 => "Cinema ST429-18:2019",
            Self::DbyCinema => "DbyCinema",
            Self::ImfSt2098_2_2019 => "IMF ST2098-2:2019",
            Self::ImfSt2067_201_2019 => "IMF ST2067-201:2019",
            Self::DbyImf => "DbyIMF",
        }
    }
}

impl Display for ConstraintSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// What an issue is reported against: a bed/remap/object MetaID, an essence
/// AudioDataID, or one of the synthetic singleton identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueId {
    Frame,
    AuthoringToolInfo,
    UserData,
    ObjectZoneDefinition19,
    MetaId(u32),
    AudioDataId(u32),
}

impl Display for IssueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Frame => write!(f, "IAFrame"),
            Self::AuthoringToolInfo => write!(f, "AuthoringToolInfo"),
            Self::UserData => write!(f, "UserData"),
            Self::ObjectZoneDefinition19 => write!(f, "ObjectZoneDefinition19"),
            Self::MetaId(id) => write!(f, "MetaID {id}"),
            Self::AudioDataId(id) => write!(f, "AudioDataID {id}"),
        }
    }
}

/// A single conformance finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub frame_index: u32,
    pub id: IssueId,
    pub set: ConstraintSet,
    pub severity: Severity,
    pub code: ErrorCode,
}

/// Aggregated state of one constraint set after the frames seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    ValidWithWarning,
    Invalid,
}

impl ValidationResult {
    /// The worse of two results.
    pub(crate) fn combine(self, other: Self) -> Self {
        use ValidationResult::*;
        match (self, other) {
            (Invalid, _) | (_, Invalid) => Invalid,
            (ValidWithWarning, _) | (_, ValidWithWarning) => ValidWithWarning,
            _ => Valid,
        }
    }
}

impl Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid => write!(f, "Valid"),
            Self::ValidWithWarning => write!(f, "ValidWithWarning"),
            Self::Invalid => write!(f, "Invalid"),
        }
    }
}

/// Receives every issue the validator raises. Returning `false` asks the
/// validator to stop processing; the request propagates to the caller as
/// [`StopRequested`].
pub trait EventHandler {
    fn handle(&mut self, issue: &Issue) -> bool;
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Validation stopped at the event handler's request")]
pub struct StopRequested;

/// Context threaded through per-element validation: the handler, the frame
/// position and the frame header parameters sub-element checks depend on.
pub struct ValidationCtx<'a> {
    pub handler: &'a mut dyn EventHandler,
    pub frame_index: u32,
    pub frame_rate: Option<crate::structs::types::FrameRate>,
    pub frame_sample_rate: Option<crate::structs::types::SampleRate>,
}

impl ValidationCtx<'_> {
    /// Reports `code` against `id` under `set`. Returns the handler's
    /// continue decision.
    pub fn report(&mut self, id: IssueId, set: ConstraintSet, code: ErrorCode) -> bool {
        let issue = Issue {
            frame_index: self.frame_index,
            id,
            set,
            severity: code.severity(),
            code,
        };

        self.handler.handle(&issue)
    }

    /// Reports `code` under both base sets, the common case for ST2098-2
    /// structural rules.
    pub fn report_both_bases(&mut self, id: IssueId, code: ErrorCode) -> bool {
        self.report(id, ConstraintSet::CinemaSt2098_2_2018, code)
            && self.report(id, ConstraintSet::ImfSt2098_2_2019, code)
    }
}

macro_rules! error_codes {
    ($( $variant:ident => ($severity:ident, $description:expr), )+) => {
        /// Conformance rule identifiers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $( $variant, )+
        }

        impl ErrorCode {
            pub fn severity(self) -> Severity {
                match self {
                    $( Self::$variant => Severity::$severity, )+
                }
            }

            /// Human-readable rule description for reports.
            pub fn description(self) -> &'static str {
                match self {
                    $( Self::$variant => $description, )+
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )+
                }
            }
        }
    };
}

error_codes! {
    // Frame-level structural rules.
    FrameIllegalBitstreamVersion => (Error, "IAFrame bitstream version is illegal"),
    FrameUnsupportedSampleRate => (Error, "IAFrame sample rate is not supported"),
    FrameUnsupportedBitDepth => (Error, "IAFrame bit depth is not supported"),
    FrameUnsupportedFrameRate => (Error, "IAFrame frame rate is not supported"),
    FrameUndefinedElementType => (Error, "IAFrame contains an element type outside the specification"),
    FrameVersionNotPersistent => (Error, "IAFrame bitstream version changes over program frames"),
    FrameSampleRateNotPersistent => (Error, "IAFrame sample rate changes over program frames"),
    FrameBitDepthNotPersistent => (Error, "IAFrame bit depth changes over program frames"),
    FrameRateNotPersistent => (Error, "IAFrame frame rate changes over program frames"),

    // Frame-level warnings.
    FrameContainUndefinedSubElement => (Warning, "IAFrame contains an undefined element as a sub-element"),
    FrameMaxRenderedNotMatchObjectNumbers => (Warning, "MaxRendered of IAFrame does not agree with channel and object counts"),
    AuthoringToolInfoMultipleElements => (Warning, "IAFrame contains more than one AuthoringToolInfo element"),

    // BedDefinition.
    BedDefinitionDuplicateMetaId => (Error, "BedDefinition MetaID duplicated within frame"),
    BedDefinitionDuplicateChannelId => (Error, "BedDefinition contains a duplicated ChannelID"),
    BedDefinitionMultiActiveSubElements => (Error, "BedDefinition contains multiple simultaneously active sub-elements"),
    BedDefinitionHierarchyLevelExceeded => (Error, "BedDefinition sub-element hierarchy exceeds one level"),
    BedDefinitionUnsupportedDecorPrefix => (Error, "BedDefinition contains an unsupported ChannelDecorCoefPrefix code"),
    BedDefinitionAudioDescriptionTextExceeded => (Error, "BedDefinition AudioDescription text exceeds the size limit"),
    BedDefinitionUndefinedUseCase => (Warning, "BedDefinition contains an undefined or reserved use case code"),
    BedDefinitionUndefinedChannelId => (Warning, "BedDefinition contains an undefined or reserved ChannelID code"),
    BedDefinitionUndefinedAudioDescription => (Warning, "BedDefinition contains an undefined or reserved AudioDescription code"),
    BedDefinitionAlwaysActiveSubElement => (Warning, "BedDefinition contains a non-conditional BedDefinition sub-element"),
    BedDefinitionSubElementsNotAllowed => (Error, "BedDefinition must not contain sub-elements for the constraint set"),
    BedDefinitionCountNotPersistent => (Error, "BedDefinition count changes over program frames"),
    BedDefinitionMetaIdNotPersistent => (Error, "BedDefinition MetaID set changes over program frames"),
    BedDefinitionChannelCountNotPersistent => (Error, "BedDefinition channel count changes over program frames"),
    BedDefinitionChannelIdsNotPersistent => (Error, "BedDefinition channel ID composition changes over program frames"),
    BedDefinitionConditionalStateNotPersistent => (Error, "BedDefinition conditional state changes over program frames"),

    // BedRemap.
    BedRemapDuplicateMetaId => (Error, "BedRemap MetaID duplicated within frame"),
    BedRemapSourceChannelCountNotEqualToBed => (Error, "BedRemap source channel count differs from the parent bed channel count"),
    BedRemapSubBlockCountConflict => (Error, "BedRemap sub-block count disagrees with the frame rate"),
    BedRemapSourceChannelCountConflict => (Error, "BedRemap source channel count disagrees with the remap coefficient rows"),
    BedRemapDestinationChannelCountConflict => (Error, "BedRemap destination channel count disagrees with the remap coefficient columns"),
    BedRemapUndefinedUseCase => (Warning, "BedRemap contains an undefined or reserved use case code"),
    BedRemapUndefinedChannelId => (Warning, "BedRemap contains an undefined or reserved destination ChannelID code"),

    // ObjectDefinition.
    ObjectDefinitionDuplicateMetaId => (Error, "ObjectDefinition MetaID duplicated within frame"),
    ObjectDefinitionMultiActiveSubElements => (Error, "ObjectDefinition contains multiple simultaneously active sub-elements"),
    ObjectDefinitionHierarchyLevelExceeded => (Error, "ObjectDefinition sub-element hierarchy exceeds one level"),
    ObjectDefinitionPanSubBlockCountConflict => (Error, "ObjectDefinition pan sub-block count disagrees with the frame rate"),
    ObjectDefinitionUnsupportedDecorPrefix => (Error, "ObjectDefinition contains an unsupported DecorCoefPrefix code"),
    ObjectDefinitionAudioDescriptionTextExceeded => (Error, "ObjectDefinition AudioDescription text exceeds the size limit"),
    ObjectDefinitionUndefinedUseCase => (Warning, "ObjectDefinition contains an undefined or reserved use case code"),
    ObjectDefinitionUndefinedAudioDescription => (Warning, "ObjectDefinition contains an undefined or reserved AudioDescription code"),
    ObjectDefinitionMultipleZone19SubElements => (Warning, "ObjectDefinition contains multiple ObjectZoneDefinition19 sub-elements"),
    ObjectDefinitionAlwaysActiveSubElement => (Warning, "ObjectDefinition contains a non-conditional ObjectDefinition sub-element"),
    ObjectDefinitionSubElementsNotAllowed => (Error, "ObjectDefinition must not contain sub-elements for the constraint set"),
    ObjectDefinitionConditionalStateNotPersistent => (Error, "ObjectDefinition conditional state changes over program frames"),

    // ObjectZoneDefinition19.
    ObjectZoneDefinition19SubBlockCountConflict => (Error, "ObjectZoneDefinition19 sub-block count disagrees with the frame rate"),

    // Essence elements.
    AudioDataDlcAudioDataIdZero => (Error, "AudioDataDLC AudioDataID is zero"),
    AudioDataDlcDuplicateAudioDataId => (Error, "AudioDataDLC AudioDataID duplicated within frame"),
    AudioDataDlcSampleRateConflict => (Error, "AudioDataDLC sample rate disagrees with the IAFrame sample rate"),
    AudioDataDlcNotAnAllowedSubElement => (Error, "AudioDataDLC is not an allowed element type for the constraint set"),
    AudioDataPcmAudioDataIdZero => (Error, "AudioDataPCM AudioDataID is zero"),
    AudioDataPcmDuplicateAudioDataId => (Error, "AudioDataPCM AudioDataID duplicated within frame"),
    AudioDataPcmNotAnAllowedSubElement => (Error, "AudioDataPCM is not an allowed element type for the constraint set"),
    MissingAudioDataEssenceElement => (Error, "A referred audio data essence element is missing from the frame"),
    UnreferencedAudioDataDlcElement => (Warning, "AudioDataDLC element is not referenced by any bed channel or object"),
    UnreferencedAudioDataPcmElement => (Warning, "AudioDataPCM element is not referenced by any bed channel or object"),
    DlcUsedWithIncompatibleFrameRate => (Error, "Fractional frame rate is incompatible with DLC coding"),

    // UserData.
    UserDataNotAnAllowedSubElement => (Error, "UserData is not an allowed element type for the constraint set"),

    // DbyCinema.
    DbyCinemaFrameUnsupportedSampleRate => (Error, "IAFrame sample rate is not supported by DbyCinema"),
    DbyCinemaBedDefinitionSubElementsNotAllowed => (Error, "BedDefinition must not contain sub-elements under DbyCinema"),
    DbyCinemaBedDefinitionInvalidChannelId => (Error, "BedDefinition ChannelID code is invalid under DbyCinema"),
    DbyCinemaBedDefinitionInvalidUseCase => (Error, "BedDefinition use case code is invalid under DbyCinema"),
    DbyCinemaBedDefinitionMultipleBedsNotAllowed => (Error, "More than one BedDefinition found, DbyCinema allows exactly one"),
    DbyCinemaBedDefinitionInvalidGainPrefix => (Error, "BedDefinition ChannelGainPrefix code is invalid under DbyCinema"),
    DbyCinemaBedDefinitionChannelDecorInfoExistsNotZero => (Error, "BedDefinition channel DecorInfoExists must be zero under DbyCinema"),
    DbyCinemaBedDefinitionMaxChannelCountExceeded => (Error, "BedDefinition channel count exceeds the DbyCinema limit"),
    DbyCinemaBedDefinitionCountNotPersistent => (Error, "BedDefinition count changes over program frames under DbyCinema"),
    DbyCinemaBedDefinitionMetaIdNotPersistent => (Error, "BedDefinition MetaID changes over program frames under DbyCinema"),
    DbyCinemaBedDefinitionChannelListNotPersistent => (Error, "BedDefinition channel list changes over program frames under DbyCinema"),
    DbyCinemaBedRemapNotAnAllowedSubElement => (Error, "BedRemap is not an allowed sub-element under DbyCinema"),
    DbyCinemaObjectDefinitionSubElementsNotAllowed => (Error, "ObjectDefinition must not contain sub-elements under DbyCinema"),
    DbyCinemaObjectDefinitionInvalidUseCase => (Error, "ObjectDefinition use case code is invalid under DbyCinema"),
    DbyCinemaObjectDefinitionInvalidGainPrefix => (Error, "ObjectDefinition GainPrefix code is invalid under DbyCinema"),
    DbyCinemaObjectDefinitionInvalidZoneGainPrefix => (Error, "ObjectDefinition ZoneGainPrefix code is invalid under DbyCinema"),
    DbyCinemaObjectDefinitionInvalidSpreadMode => (Error, "ObjectDefinition spread mode code is invalid under DbyCinema"),
    DbyCinemaObjectDefinitionInvalidDecorPrefix => (Error, "ObjectDefinition DecorCoefPrefix code is invalid under DbyCinema"),
    DbyCinemaObjectDefinitionSnapTolExistsNotZero => (Error, "ObjectDefinition SnapTolExists must be zero under DbyCinema"),
    DbyCinemaObjectDefinitionMaxObjectCountExceeded => (Error, "ObjectDefinition count exceeds the DbyCinema limit"),
    DbyCinemaObjectDefinitionNonSequentialMetaId => (Error, "ObjectDefinition MetaIDs are not sequential from one under DbyCinema"),
    DbyCinemaObjectDefinitionZoneGainsNotAPreset => (Error, "ObjectDefinition zone gains do not match a DbyCinema preset"),
    DbyCinemaObjectZoneDefinition19NotAnAllowedSubElement => (Error, "ObjectZoneDefinition19 is not an allowed sub-element under DbyCinema"),
    DbyCinemaAuthoringToolInfoNotAnAllowedSubElement => (Error, "AuthoringToolInfo is not an allowed element type under DbyCinema"),

    // DbyIMF.
    DbyImfBedDefinitionInvalidChannelId => (Error, "BedDefinition ChannelID code is invalid under DbyIMF"),
    DbyImfBedDefinitionInvalidGainPrefix => (Error, "BedDefinition ChannelGainPrefix code is invalid under DbyIMF"),
    DbyImfBedDefinitionChannelDecorInfoExistsNotZero => (Error, "BedDefinition channel DecorInfoExists must be zero under DbyIMF"),
    DbyImfObjectDefinitionInvalidGainPrefix => (Error, "ObjectDefinition GainPrefix code is invalid under DbyIMF"),
    DbyImfObjectDefinitionInvalidZoneGainPrefix => (Error, "ObjectDefinition ZoneGainPrefix code is invalid under DbyIMF"),
    DbyImfObjectDefinitionInvalidSpreadMode => (Error, "ObjectDefinition spread mode code is invalid under DbyIMF"),
    DbyImfObjectDefinitionInvalidDecorPrefix => (Error, "ObjectDefinition DecorCoefPrefix code is invalid under DbyIMF"),
    DbyImfObjectDefinitionSnapTolExistsNotZero => (Error, "ObjectDefinition SnapTolExists must be zero under DbyIMF"),
    DbyImfObjectDefinitionZoneGainsNotAPreset => (Warning, "ObjectDefinition zone gains do not match a DbyIMF preset"),
    DbyImfNotMeetingContinuousAudioSequence => (Error, "Frame bed, object and linked PCM element order does not meet the DbyIMF continuous audio sequence"),
    DbyImfContinuousAudioSequenceNotPersistent => (Error, "Continuous audio packing sequence changes over program frames under DbyIMF"),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_are_base_first() {
        assert_eq!(
            ConstraintSet::DbyCinema.chain(),
            &[
                ConstraintSet::CinemaSt2098_2_2018,
                ConstraintSet::CinemaSt429_18_2019,
                ConstraintSet::DbyCinema
            ]
        );
        assert_eq!(ConstraintSet::ImfSt2098_2_2019.chain().len(), 1);
        assert_eq!(
            ConstraintSet::DbyImf.base(),
            Some(ConstraintSet::ImfSt2067_201_2019)
        );
    }

    #[test]
    fn severity_follows_code() {
        assert_eq!(
            ErrorCode::MissingAudioDataEssenceElement.severity(),
            Severity::Error
        );
        assert_eq!(
            ErrorCode::UnreferencedAudioDataDlcElement.severity(),
            Severity::Warning
        );
        assert_eq!(
            ErrorCode::DbyImfObjectDefinitionZoneGainsNotAPreset.severity(),
            Severity::Warning
        );
        assert_eq!(
            ErrorCode::DbyCinemaObjectDefinitionZoneGainsNotAPreset.severity(),
            Severity::Error
        );
    }

    #[test]
    fn result_combination_is_monotone() {
        use ValidationResult::*;
        assert_eq!(Valid.combine(Valid), Valid);
        assert_eq!(Valid.combine(ValidWithWarning), ValidWithWarning);
        assert_eq!(ValidWithWarning.combine(Invalid), Invalid);
        assert_eq!(Invalid.combine(Valid), Invalid);
    }
}
