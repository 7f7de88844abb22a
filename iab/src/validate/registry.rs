//! Static per-profile constraint tables.
//!
//! One [`ConstraintParams`] row per constraint set is the single source of
//! truth for allowed codes, limits and structural permissions. Both the
//! per-element and the cross-element validators consult these rows; adding a
//! profile means adding a row (plus any new error codes it needs).

use crate::structs::types::{BitDepth, ChannelId, FrameRate, SampleRate, UseCase};
use crate::validate::issue::ConstraintSet;

/// Allowed values and limits of one constraint set. `None` in an `Option`
/// field means the set imposes no restriction of its own beyond the defined
/// code tables.
#[derive(Debug)]
pub struct ConstraintParams {
    pub sample_rates: &'static [SampleRate],
    pub frame_rates: &'static [FrameRate],
    pub bit_depths: &'static [BitDepth],

    /// Bed channel IDs the profile permits; `None` = any defined code.
    pub bed_channel_ids: Option<&'static [ChannelId]>,
    /// Use cases permitted for conditional beds and bed remaps.
    pub bed_use_cases: Option<&'static [UseCase]>,
    /// Use cases permitted for conditional objects.
    pub object_use_cases: Option<&'static [UseCase]>,

    /// Allowed gain prefix codes for bed channels.
    pub bed_gain_prefixes: Option<&'static [u8]>,
    /// Allowed gain prefix codes for object pan sub-blocks.
    pub object_gain_prefixes: Option<&'static [u8]>,
    /// Allowed zone gain prefix codes (9- and 19-zone alike).
    pub zone_gain_prefixes: Option<&'static [u8]>,
    /// Allowed spread mode codes.
    pub spread_modes: Option<&'static [u8]>,
    /// Allowed decorrelation prefix codes.
    pub decor_prefixes: Option<&'static [u8]>,

    /// Bed channel decorrelation info must be absent.
    pub channel_decor_must_be_absent: bool,
    /// Object snap tolerance field must not be present.
    pub snap_tol_exists_must_be_zero: bool,
    /// Zone-gain activation masks must match one of these presets.
    pub zone_gain_preset_masks: Option<&'static [u16]>,

    pub max_bed_channels: Option<usize>,
    pub max_object_count: Option<usize>,
    pub max_audio_description_bytes: usize,

    pub allow_bed_sub_elements: bool,
    pub allow_object_sub_elements: bool,
    pub allow_authoring_tool_info: bool,
    pub allow_user_data: bool,
    pub allow_dlc_essence: bool,
    pub allow_pcm_essence: bool,

    /// Undefined frame sub-elements are an error rather than a warning.
    pub undefined_elements_are_errors: bool,
    /// Object MetaIDs must be 1, 2, 3, ... with no gaps.
    pub require_sequential_object_meta_ids: bool,
    /// Exactly one BedDefinition per frame.
    pub single_bed_only: bool,
}

const ALL_SAMPLE_RATES: &[SampleRate] = &[SampleRate::Fs48000, SampleRate::Fs96000];
const ALL_BIT_DEPTHS: &[BitDepth] = &[BitDepth::Bit16, BitDepth::Bit24];
const ALL_FRAME_RATES: &[FrameRate] = &[
    FrameRate::Fps23_976,
    FrameRate::Fps24,
    FrameRate::Fps25,
    FrameRate::Fps30,
    FrameRate::Fps48,
    FrameRate::Fps50,
    FrameRate::Fps60,
    FrameRate::Fps96,
    FrameRate::Fps100,
    FrameRate::Fps120,
];

/// Cinema frame rates are the integer theatrical family.
const CINEMA_FRAME_RATES: &[FrameRate] = &[
    FrameRate::Fps24,
    FrameRate::Fps25,
    FrameRate::Fps30,
    FrameRate::Fps48,
    FrameRate::Fps50,
    FrameRate::Fps60,
    FrameRate::Fps96,
    FrameRate::Fps100,
    FrameRate::Fps120,
];

/// The ten bed channel slots of the Dolby cinema target layout.
const DBY_BED_CHANNEL_IDS: &[ChannelId] = &[
    ChannelId::Left,
    ChannelId::Center,
    ChannelId::Right,
    ChannelId::LeftSideSurround,
    ChannelId::RightSideSurround,
    ChannelId::LeftRearSurround,
    ChannelId::RightRearSurround,
    ChannelId::Lfe,
    ChannelId::LeftTopSurround,
    ChannelId::RightTopSurround,
];

const DBY_BED_USE_CASES: &[UseCase] = &[
    UseCase::Case5_1,
    UseCase::Case7_1Ds,
    UseCase::Case9_1Oh,
    UseCase::Always,
];

const DBY_OBJECT_USE_CASES: &[UseCase] = &[UseCase::Always];

/// Unity and silence only.
const UNITY_SILENCE_PREFIXES: &[u8] = &[0, 1];
/// Unity, silence and the in-stream code.
const ALL_GAIN_PREFIXES: &[u8] = &[0, 1, 2];
const DBY_SPREAD_MODES: &[u8] = &[0, 2];
const DBY_DECOR_PREFIXES: &[u8] = &[0, 1, 2];

/// Zone-gain activation masks accepted as presets by the Dolby sets.
/// Zone order: bit 0 = screen left .. bit 8 = overhead. The presets cover
/// "all on", screen only, room only (no screen), no overhead, screen plus
/// overhead, surround-only and center-screen-only configurations.
const DBY_ZONE_PRESET_MASKS: &[u16] = &[
    0b1_1111_1111, // all zones active
    0b0_0000_0111, // screen only
    0b1_1111_1000, // room only
    0b0_1111_1111, // no overhead
    0b1_0000_0111, // screen and overhead
    0b0_1111_1000, // floor surrounds only
    0b0_0000_0010, // center screen only
];

static CINEMA_ST2098_2_2018: ConstraintParams = ConstraintParams {
    sample_rates: ALL_SAMPLE_RATES,
    frame_rates: ALL_FRAME_RATES,
    bit_depths: ALL_BIT_DEPTHS,
    bed_channel_ids: None,
    bed_use_cases: None,
    object_use_cases: None,
    bed_gain_prefixes: None,
    object_gain_prefixes: None,
    zone_gain_prefixes: None,
    spread_modes: None,
    decor_prefixes: None,
    channel_decor_must_be_absent: false,
    snap_tol_exists_must_be_zero: false,
    zone_gain_preset_masks: None,
    max_bed_channels: None,
    max_object_count: None,
    max_audio_description_bytes: 64,
    allow_bed_sub_elements: true,
    allow_object_sub_elements: true,
    allow_authoring_tool_info: true,
    allow_user_data: true,
    allow_dlc_essence: true,
    allow_pcm_essence: true,
    undefined_elements_are_errors: false,
    require_sequential_object_meta_ids: false,
    single_bed_only: false,
};

static CINEMA_ST429_18_2019: ConstraintParams = ConstraintParams {
    sample_rates: ALL_SAMPLE_RATES,
    frame_rates: CINEMA_FRAME_RATES,
    bit_depths: ALL_BIT_DEPTHS,
    bed_channel_ids: None,
    bed_use_cases: None,
    object_use_cases: None,
    bed_gain_prefixes: None,
    object_gain_prefixes: None,
    zone_gain_prefixes: None,
    spread_modes: None,
    decor_prefixes: None,
    channel_decor_must_be_absent: false,
    snap_tol_exists_must_be_zero: false,
    zone_gain_preset_masks: None,
    max_bed_channels: None,
    max_object_count: None,
    max_audio_description_bytes: 64,
    allow_bed_sub_elements: true,
    allow_object_sub_elements: true,
    allow_authoring_tool_info: true,
    allow_user_data: true,
    allow_dlc_essence: true,
    allow_pcm_essence: false,
    undefined_elements_are_errors: true,
    require_sequential_object_meta_ids: false,
    single_bed_only: false,
};

static DBY_CINEMA: ConstraintParams = ConstraintParams {
    sample_rates: &[SampleRate::Fs48000],
    frame_rates: CINEMA_FRAME_RATES,
    bit_depths: ALL_BIT_DEPTHS,
    bed_channel_ids: Some(DBY_BED_CHANNEL_IDS),
    bed_use_cases: Some(DBY_BED_USE_CASES),
    object_use_cases: Some(DBY_OBJECT_USE_CASES),
    bed_gain_prefixes: Some(&[0]),
    object_gain_prefixes: Some(ALL_GAIN_PREFIXES),
    zone_gain_prefixes: Some(UNITY_SILENCE_PREFIXES),
    spread_modes: Some(DBY_SPREAD_MODES),
    decor_prefixes: Some(DBY_DECOR_PREFIXES),
    channel_decor_must_be_absent: true,
    snap_tol_exists_must_be_zero: true,
    zone_gain_preset_masks: Some(DBY_ZONE_PRESET_MASKS),
    max_bed_channels: Some(10),
    max_object_count: Some(118),
    max_audio_description_bytes: 64,
    allow_bed_sub_elements: false,
    allow_object_sub_elements: false,
    allow_authoring_tool_info: false,
    allow_user_data: false,
    allow_dlc_essence: true,
    allow_pcm_essence: false,
    undefined_elements_are_errors: true,
    require_sequential_object_meta_ids: true,
    single_bed_only: true,
};

static IMF_ST2098_2_2019: ConstraintParams = ConstraintParams {
    sample_rates: ALL_SAMPLE_RATES,
    frame_rates: ALL_FRAME_RATES,
    bit_depths: ALL_BIT_DEPTHS,
    bed_channel_ids: None,
    bed_use_cases: None,
    object_use_cases: None,
    bed_gain_prefixes: None,
    object_gain_prefixes: None,
    zone_gain_prefixes: None,
    spread_modes: None,
    decor_prefixes: None,
    channel_decor_must_be_absent: false,
    snap_tol_exists_must_be_zero: false,
    zone_gain_preset_masks: None,
    max_bed_channels: None,
    max_object_count: None,
    max_audio_description_bytes: 64,
    allow_bed_sub_elements: true,
    allow_object_sub_elements: true,
    allow_authoring_tool_info: true,
    allow_user_data: true,
    allow_dlc_essence: true,
    allow_pcm_essence: true,
    undefined_elements_are_errors: false,
    require_sequential_object_meta_ids: false,
    single_bed_only: false,
};

static IMF_ST2067_201_2019: ConstraintParams = ConstraintParams {
    sample_rates: ALL_SAMPLE_RATES,
    frame_rates: ALL_FRAME_RATES,
    bit_depths: ALL_BIT_DEPTHS,
    bed_channel_ids: None,
    bed_use_cases: None,
    object_use_cases: None,
    bed_gain_prefixes: None,
    object_gain_prefixes: None,
    zone_gain_prefixes: None,
    spread_modes: None,
    decor_prefixes: None,
    channel_decor_must_be_absent: false,
    snap_tol_exists_must_be_zero: false,
    zone_gain_preset_masks: None,
    max_bed_channels: None,
    max_object_count: None,
    max_audio_description_bytes: 64,
    allow_bed_sub_elements: false,
    allow_object_sub_elements: false,
    allow_authoring_tool_info: true,
    allow_user_data: true,
    allow_dlc_essence: false,
    allow_pcm_essence: true,
    undefined_elements_are_errors: true,
    require_sequential_object_meta_ids: false,
    single_bed_only: false,
};

static DBY_IMF: ConstraintParams = ConstraintParams {
    sample_rates: &[SampleRate::Fs48000],
    frame_rates: ALL_FRAME_RATES,
    bit_depths: &[BitDepth::Bit24],
    bed_channel_ids: Some(DBY_BED_CHANNEL_IDS),
    bed_use_cases: Some(DBY_BED_USE_CASES),
    object_use_cases: Some(DBY_OBJECT_USE_CASES),
    bed_gain_prefixes: Some(&[0]),
    object_gain_prefixes: Some(ALL_GAIN_PREFIXES),
    zone_gain_prefixes: Some(UNITY_SILENCE_PREFIXES),
    spread_modes: Some(DBY_SPREAD_MODES),
    decor_prefixes: Some(DBY_DECOR_PREFIXES),
    channel_decor_must_be_absent: true,
    snap_tol_exists_must_be_zero: true,
    zone_gain_preset_masks: Some(DBY_ZONE_PRESET_MASKS),
    max_bed_channels: Some(10),
    max_object_count: Some(118),
    max_audio_description_bytes: 64,
    allow_bed_sub_elements: false,
    allow_object_sub_elements: false,
    allow_authoring_tool_info: true,
    allow_user_data: true,
    allow_dlc_essence: false,
    allow_pcm_essence: true,
    undefined_elements_are_errors: true,
    require_sequential_object_meta_ids: false,
    single_bed_only: false,
};

/// Returns the constraint table row for `set`.
pub fn params(set: ConstraintSet) -> &'static ConstraintParams {
    match set {
        ConstraintSet::CinemaSt2098_2_2018 => &CINEMA_ST2098_2_2018,
        ConstraintSet::CinemaSt429_18_2019 => &CINEMA_ST429_18_2019,
        ConstraintSet::DbyCinema => &DBY_CINEMA,
        ConstraintSet::ImfSt2098_2_2019 => &IMF_ST2098_2_2019,
        ConstraintSet::ImfSt2067_201_2019 => &IMF_ST2067_201_2019,
        ConstraintSet::DbyImf => &DBY_IMF,
    }
}
