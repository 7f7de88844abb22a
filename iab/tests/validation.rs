//! End-to-end validation behavior over programmatically built frame trees.

use iab::process::validate::Validator;
use iab::structs::bed::{BedChannel, BedDefinition};
use iab::structs::element::Element;
use iab::structs::essence::{AudioDataDlc, AudioDataPcm};
use iab::structs::frame::Frame;
use iab::structs::object::ObjectDefinition;
use iab::structs::types::{AudioDataId, BitDepth, ChannelId, FrameRate, SampleRate};
use iab::validate::{ConstraintSet, ErrorCode, IssueId, Severity, ValidationResult};

const CINEMA_5_1: [ChannelId; 6] = [
    ChannelId::Left,
    ChannelId::Right,
    ChannelId::Center,
    ChannelId::Lfe,
    ChannelId::LeftSurround,
    ChannelId::RightSurround,
];

fn empty_frame(frame_rate: FrameRate) -> Frame {
    Frame::new(SampleRate::Fs48000, BitDepth::Bit24, frame_rate)
}

fn bed_with_channels(meta_id: u32, channels: &[(ChannelId, AudioDataId)]) -> BedDefinition {
    let mut bed = BedDefinition::new(meta_id);
    bed.channels = channels
        .iter()
        .map(|&(channel_id, audio_data_id)| BedChannel::new(channel_id, audio_data_id))
        .collect();
    bed
}

/// A 5.1 bed referencing DLC essence elements 1..=6, all present.
fn minimal_cinema_frame() -> Frame {
    let mut frame = empty_frame(FrameRate::Fps24);

    let channels: Vec<_> = CINEMA_5_1
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i as AudioDataId + 1))
        .collect();
    frame
        .add_sub_element(Element::BedDefinition(bed_with_channels(1, &channels)))
        .unwrap();

    for audio_data_id in 1..=6 {
        frame
            .add_sub_element(Element::AudioDataDlc(AudioDataDlc::new(
                audio_data_id,
                SampleRate::Fs48000,
            )))
            .unwrap();
    }

    frame.max_rendered = 6;
    frame
}

fn silent_object(meta_id: u32, frame_rate: FrameRate) -> ObjectDefinition {
    ObjectDefinition::with_sub_blocks(meta_id, 0, frame_rate)
}

#[test]
fn minimal_cinema_frame_is_valid() {
    let frame = minimal_cinema_frame();

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::CinemaSt2098_2_2018),
        ValidationResult::Valid
    );
    assert!(validator.issues(ConstraintSet::CinemaSt2098_2_2018).is_empty());
}

#[test]
fn missing_essence_is_a_single_referential_error() {
    let mut frame = empty_frame(FrameRate::Fps24);

    let channels: Vec<_> = CINEMA_5_1
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            let audio_data_id = if i == 3 { 99 } else { i as AudioDataId + 1 };
            (id, audio_data_id)
        })
        .collect();
    frame
        .add_sub_element(Element::BedDefinition(bed_with_channels(1, &channels)))
        .unwrap();

    for audio_data_id in [1u32, 2, 3, 5, 6] {
        frame
            .add_sub_element(Element::AudioDataDlc(AudioDataDlc::new(
                audio_data_id,
                SampleRate::Fs48000,
            )))
            .unwrap();
    }
    frame.max_rendered = 6;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::CinemaSt2098_2_2018),
        ValidationResult::Invalid
    );

    let issues = validator.issues(ConstraintSet::CinemaSt2098_2_2018).to_vec();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].code, ErrorCode::MissingAudioDataEssenceElement);
    assert_eq!(issues[0].id, IssueId::AudioDataId(99));
    assert_eq!(issues[0].frame_index, 0);
}

#[test]
fn same_meta_id_across_frames_is_fine() {
    let mut validator = Validator::new();

    for frame_index in 0..2 {
        let mut frame = empty_frame(FrameRate::Fps24);
        frame
            .add_sub_element(Element::ObjectDefinition(silent_object(7, FrameRate::Fps24)))
            .unwrap();
        frame.max_rendered = 1;

        validator.validate_frame(&frame, frame_index).unwrap();
    }

    assert_eq!(
        validator.result(ConstraintSet::CinemaSt2098_2_2018),
        ValidationResult::Valid
    );
    assert!(validator.issues(ConstraintSet::CinemaSt2098_2_2018).is_empty());
}

#[test]
fn duplicate_meta_id_within_frame_is_an_error() {
    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::ObjectDefinition(silent_object(7, FrameRate::Fps24)))
        .unwrap();
    frame
        .add_sub_element(Element::ObjectDefinition(silent_object(7, FrameRate::Fps24)))
        .unwrap();
    frame.max_rendered = 2;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    let issues = validator.issues_single_set(ConstraintSet::CinemaSt2098_2_2018);
    let duplicates: Vec<_> = issues
        .iter()
        .filter(|i| i.code == ErrorCode::ObjectDefinitionDuplicateMetaId)
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].id, IssueId::MetaId(7));
}

#[test]
fn frame_rate_change_is_reported_at_the_transition_only() {
    let mut validator = Validator::new();

    validator
        .validate_frame(&empty_frame(FrameRate::Fps24), 0)
        .unwrap();
    validator
        .validate_frame(&empty_frame(FrameRate::Fps25), 1)
        .unwrap();
    // The snapshot is overwritten after each frame, so a third frame at the
    // new rate reports nothing further.
    validator
        .validate_frame(&empty_frame(FrameRate::Fps25), 2)
        .unwrap();

    let issues = validator.issues_single_set(ConstraintSet::CinemaSt2098_2_2018);
    let rate_issues: Vec<_> = issues
        .iter()
        .filter(|i| i.code == ErrorCode::FrameRateNotPersistent)
        .collect();
    assert_eq!(rate_issues.len(), 1);
    assert_eq!(rate_issues[0].frame_index, 1);
    assert_eq!(rate_issues[0].id, IssueId::Frame);
}

fn pcm_then_bed_frame(swap: bool) -> Frame {
    let mut frame = empty_frame(FrameRate::Fps24);

    let pcm = Element::AudioDataPcm(AudioDataPcm::silence(
        1,
        FrameRate::Fps24,
        SampleRate::Fs48000,
        BitDepth::Bit24,
    ));
    let bed = Element::BedDefinition(bed_with_channels(1, &[(ChannelId::Center, 1)]));

    if swap {
        frame.add_sub_element(bed).unwrap();
        frame.add_sub_element(pcm).unwrap();
    } else {
        frame.add_sub_element(pcm).unwrap();
        frame.add_sub_element(bed).unwrap();
    }

    frame.max_rendered = 1;
    frame
}

#[test]
fn continuous_audio_sequence_accepts_pcm_before_bed() {
    let frame = pcm_then_bed_frame(false);

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::DbyImf),
        ValidationResult::Valid
    );
    assert!(validator.issues(ConstraintSet::DbyImf).is_empty());
}

#[test]
fn continuous_audio_sequence_rejects_bed_before_pcm() {
    let frame = pcm_then_bed_frame(true);

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::DbyImf),
        ValidationResult::Invalid
    );

    let issues = validator.issues_single_set(ConstraintSet::DbyImf);
    assert!(
        issues
            .iter()
            .any(|i| i.code == ErrorCode::DbyImfNotMeetingContinuousAudioSequence)
    );
}

#[test]
fn silent_bed_channels_demand_no_linked_pcm() {
    let mut frame = empty_frame(FrameRate::Fps24);

    // One PCM element covers the only non-zero channel reference; the LFE
    // slot is silent (AudioDataID zero) and has no essence to precede it.
    frame
        .add_sub_element(Element::AudioDataPcm(AudioDataPcm::silence(
            1,
            FrameRate::Fps24,
            SampleRate::Fs48000,
            BitDepth::Bit24,
        )))
        .unwrap();
    frame
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            1,
            &[(ChannelId::Center, 1), (ChannelId::Lfe, 0)],
        )))
        .unwrap();
    frame.max_rendered = 2;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::DbyImf),
        ValidationResult::Valid
    );
    assert!(validator.issues(ConstraintSet::DbyImf).is_empty());
}

#[test]
fn continuous_audio_packing_order_must_persist() {
    let mut validator = Validator::new();

    validator.validate_frame(&pcm_then_bed_frame(false), 0).unwrap();

    // Still a legal sequence, but the linked PCM identifier changed.
    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::AudioDataPcm(AudioDataPcm::silence(
            2,
            FrameRate::Fps24,
            SampleRate::Fs48000,
            BitDepth::Bit24,
        )))
        .unwrap();
    frame
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            1,
            &[(ChannelId::Center, 2)],
        )))
        .unwrap();
    frame.max_rendered = 1;

    validator.validate_frame(&frame, 1).unwrap();

    let issues = validator.issues_single_set(ConstraintSet::DbyImf);
    assert!(
        issues
            .iter()
            .any(|i| i.code == ErrorCode::DbyImfContinuousAudioSequenceNotPersistent)
    );
}

#[test]
fn sequential_object_meta_ids_satisfy_dby_cinema() {
    let mut frame = empty_frame(FrameRate::Fps24);
    for meta_id in 1..=3 {
        frame
            .add_sub_element(Element::ObjectDefinition(silent_object(
                meta_id,
                FrameRate::Fps24,
            )))
            .unwrap();
    }
    frame.max_rendered = 3;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::DbyCinema),
        ValidationResult::Valid
    );
}

#[test]
fn gapped_object_meta_ids_fail_dby_cinema_only() {
    let mut frame = empty_frame(FrameRate::Fps24);
    for meta_id in [1u32, 2, 4] {
        frame
            .add_sub_element(Element::ObjectDefinition(silent_object(
                meta_id,
                FrameRate::Fps24,
            )))
            .unwrap();
    }
    frame.max_rendered = 3;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::DbyCinema),
        ValidationResult::Invalid
    );
    assert!(
        validator
            .issues_single_set(ConstraintSet::DbyCinema)
            .iter()
            .any(|i| i.code == ErrorCode::DbyCinemaObjectDefinitionNonSequentialMetaId)
    );

    // The base sets are untouched by the vendor rule.
    assert_eq!(
        validator.result(ConstraintSet::CinemaSt2098_2_2018),
        ValidationResult::Valid
    );
    assert_eq!(
        validator.result(ConstraintSet::CinemaSt429_18_2019),
        ValidationResult::Valid
    );
}

#[test]
fn zero_audio_data_id_is_silence_not_missing_essence() {
    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            1,
            &[(ChannelId::Center, 0)],
        )))
        .unwrap();
    frame.max_rendered = 1;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert!(
        !validator
            .issues(ConstraintSet::CinemaSt2098_2_2018)
            .iter()
            .any(|i| i.code == ErrorCode::MissingAudioDataEssenceElement)
    );
}

#[test]
fn max_rendered_mismatch_is_a_warning() {
    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::ObjectDefinition(silent_object(1, FrameRate::Fps24)))
        .unwrap();
    // max_rendered stays zero although an object exists.

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::CinemaSt2098_2_2018),
        ValidationResult::ValidWithWarning
    );

    let issues = validator.issues_single_set(ConstraintSet::CinemaSt2098_2_2018);
    assert!(
        issues
            .iter()
            .any(|i| i.code == ErrorCode::FrameMaxRenderedNotMatchObjectNumbers
                && i.severity == Severity::Warning)
    );
}

#[test]
fn unreferenced_essence_is_a_warning() {
    let mut frame = minimal_cinema_frame();
    frame
        .add_sub_element(Element::AudioDataDlc(AudioDataDlc::new(
            42,
            SampleRate::Fs48000,
        )))
        .unwrap();

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::CinemaSt2098_2_2018),
        ValidationResult::ValidWithWarning
    );
    assert!(
        validator
            .issues_single_set(ConstraintSet::CinemaSt2098_2_2018)
            .iter()
            .any(|i| i.code == ErrorCode::UnreferencedAudioDataDlcElement
                && i.id == IssueId::AudioDataId(42))
    );
}

#[test]
fn dlc_essence_sample_rate_must_match_frame() {
    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            1,
            &[(ChannelId::Center, 1)],
        )))
        .unwrap();
    frame
        .add_sub_element(Element::AudioDataDlc(AudioDataDlc::new(
            1,
            SampleRate::Fs96000,
        )))
        .unwrap();
    frame.max_rendered = 1;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert!(
        validator
            .issues_single_set(ConstraintSet::CinemaSt2098_2_2018)
            .iter()
            .any(|i| i.code == ErrorCode::AudioDataDlcSampleRateConflict)
    );
}

#[test]
fn oversized_dby_cinema_bed_is_flagged() {
    let channels: Vec<(ChannelId, AudioDataId)> = (0..11)
        .map(|code| (ChannelId::from_code(code), 0))
        .collect();

    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::BedDefinition(bed_with_channels(1, &channels)))
        .unwrap();
    frame.max_rendered = 11;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert_eq!(
        validator.result(ConstraintSet::DbyCinema),
        ValidationResult::Invalid
    );
    assert!(
        validator
            .issues_single_set(ConstraintSet::DbyCinema)
            .iter()
            .any(|i| i.code == ErrorCode::DbyCinemaBedDefinitionMaxChannelCountExceeded)
    );
}

#[test]
fn issue_lists_union_along_the_chain() {
    let mut frame = empty_frame(FrameRate::Fps24);
    for meta_id in [1u32, 2, 4] {
        frame
            .add_sub_element(Element::ObjectDefinition(silent_object(
                meta_id,
                FrameRate::Fps24,
            )))
            .unwrap();
    }
    // Mismatched MaxRendered adds a base-set warning on top of the
    // DbyCinema sequence error.
    frame.max_rendered = 0;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    let base: Vec<_> = validator
        .issues_single_set(ConstraintSet::CinemaSt2098_2_2018)
        .to_vec();
    let middle: Vec<_> = validator
        .issues_single_set(ConstraintSet::CinemaSt429_18_2019)
        .to_vec();
    let leaf: Vec<_> = validator.issues_single_set(ConstraintSet::DbyCinema).to_vec();

    let mut expected = base;
    expected.extend(middle);
    expected.extend(leaf);

    assert_eq!(validator.issues(ConstraintSet::DbyCinema), &expected[..]);

    // Hierarchical monotonicity: dependents are never better than bases.
    let base_result = validator.result(ConstraintSet::CinemaSt2098_2_2018);
    let middle_result = validator.result(ConstraintSet::CinemaSt429_18_2019);
    let leaf_result = validator.result(ConstraintSet::DbyCinema);
    assert_eq!(base_result, ValidationResult::ValidWithWarning);
    assert_eq!(middle_result, ValidationResult::ValidWithWarning);
    assert_eq!(leaf_result, ValidationResult::Invalid);
}

#[test]
fn conditional_sub_elements_must_not_share_a_use_case() {
    use iab::structs::types::UseCase;

    let mut parent = bed_with_channels(1, &[(ChannelId::Center, 0)]);

    for meta_id in [2u32, 3] {
        let mut alternative = bed_with_channels(meta_id, &[(ChannelId::Center, 0)]);
        alternative.conditional = true;
        alternative.use_case = Some(UseCase::Case5_1);
        parent
            .add_sub_element(Element::BedDefinition(alternative))
            .unwrap();
    }

    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::BedDefinition(parent))
        .unwrap();
    frame.max_rendered = 1;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    let issues = validator.issues_single_set(ConstraintSet::CinemaSt2098_2_2018);
    assert!(
        issues
            .iter()
            .any(|i| i.code == ErrorCode::BedDefinitionMultiActiveSubElements
                && i.id == IssueId::MetaId(1))
    );
}

#[test]
fn always_active_sub_element_is_a_warning() {
    let mut parent = bed_with_channels(1, &[(ChannelId::Center, 0)]);
    parent
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            2,
            &[(ChannelId::Center, 0)],
        )))
        .unwrap();

    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::BedDefinition(parent))
        .unwrap();
    frame.max_rendered = 1;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert!(
        validator
            .issues_single_set(ConstraintSet::CinemaSt2098_2_2018)
            .iter()
            .any(|i| i.code == ErrorCode::BedDefinitionAlwaysActiveSubElement
                && i.severity == Severity::Warning)
    );
}

#[test]
fn bed_hierarchy_is_limited_to_one_level() {
    // A level-1 bed that itself nests a further bed.
    let mut middle = bed_with_channels(2, &[(ChannelId::Center, 0)]);
    middle.conditional = true;
    middle.use_case = Some(iab::structs::types::UseCase::Case5_1);
    middle
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            3,
            &[(ChannelId::Center, 0)],
        )))
        .unwrap();

    let mut parent = bed_with_channels(1, &[(ChannelId::Center, 0)]);
    parent
        .add_sub_element(Element::BedDefinition(middle))
        .unwrap();

    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::BedDefinition(parent))
        .unwrap();
    frame.max_rendered = 1;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert!(
        validator
            .issues_single_set(ConstraintSet::CinemaSt2098_2_2018)
            .iter()
            .any(|i| i.code == ErrorCode::BedDefinitionHierarchyLevelExceeded)
    );
}

#[test]
fn remap_source_count_must_match_parent_bed() {
    use iab::structs::bed::BedRemap;
    use iab::structs::types::UseCase;

    let mut remap = BedRemap::new(9, UseCase::Case5_1);
    remap.source_channels = 5; // parent bed has 1 channel
    remap.destination_channels = 0;
    remap.sub_blocks = (0..FrameRate::Fps24.sub_block_count())
        .map(|index| iab::structs::bed::BedRemapSubBlock {
            remap_info_exists: index == 0,
            coeffs: Vec::new(),
        })
        .collect();

    let mut bed = bed_with_channels(1, &[(ChannelId::Center, 0)]);
    bed.add_sub_element(Element::BedRemap(remap)).unwrap();

    let mut frame = empty_frame(FrameRate::Fps24);
    frame.add_sub_element(Element::BedDefinition(bed)).unwrap();
    frame.max_rendered = 1;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    let issues = validator.issues_single_set(ConstraintSet::CinemaSt2098_2_2018);
    assert!(
        issues
            .iter()
            .any(|i| i.code == ErrorCode::BedRemapSourceChannelCountNotEqualToBed
                && i.id == IssueId::MetaId(9))
    );
    // Sub-block zero declares zero destination rows, agreeing with the
    // destination count, so no shape conflict on top.
    assert!(
        !issues
            .iter()
            .any(|i| i.code == ErrorCode::BedRemapDestinationChannelCountConflict)
    );
}

#[test]
fn multiple_beds_violate_dby_cinema() {
    let mut frame = empty_frame(FrameRate::Fps24);
    frame
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            1,
            &[(ChannelId::Center, 0)],
        )))
        .unwrap();
    frame
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            2,
            &[(ChannelId::Left, 0)],
        )))
        .unwrap();
    frame.max_rendered = 2;

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert!(
        validator
            .issues_single_set(ConstraintSet::DbyCinema)
            .iter()
            .any(|i| i.code == ErrorCode::DbyCinemaBedDefinitionMultipleBedsNotAllowed)
    );
    assert_eq!(
        validator.result(ConstraintSet::CinemaSt2098_2_2018),
        ValidationResult::Valid
    );
}

#[test]
fn multiple_authoring_tool_infos_warn() {
    use iab::structs::userdata::AuthoringToolInfo;

    let mut frame = empty_frame(FrameRate::Fps24);
    for uri in ["tool-a", "tool-b"] {
        frame
            .add_sub_element(Element::AuthoringToolInfo(AuthoringToolInfo::new(
                uri.as_bytes().to_vec(),
            )))
            .unwrap();
    }

    let mut validator = Validator::new();
    validator.validate_frame(&frame, 0).unwrap();

    assert!(
        validator
            .issues_single_set(ConstraintSet::ImfSt2098_2_2019)
            .iter()
            .any(|i| i.code == ErrorCode::AuthoringToolInfoMultipleElements
                && i.id == IssueId::AuthoringToolInfo
                || i.code == ErrorCode::AuthoringToolInfoMultipleElements
                    && i.id == IssueId::Frame)
    );
}

#[test]
fn bed_composition_must_persist_for_imf_application_profile() {
    let mut validator = Validator::new();

    let mut first = empty_frame(FrameRate::Fps24);
    first
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            1,
            &[(ChannelId::Left, 0), (ChannelId::Right, 0)],
        )))
        .unwrap();
    first.max_rendered = 2;
    validator.validate_frame(&first, 0).unwrap();

    let mut second = empty_frame(FrameRate::Fps24);
    second
        .add_sub_element(Element::BedDefinition(bed_with_channels(
            1,
            &[(ChannelId::Left, 0), (ChannelId::Center, 0)],
        )))
        .unwrap();
    second.max_rendered = 2;
    validator.validate_frame(&second, 1).unwrap();

    assert!(
        validator
            .issues_single_set(ConstraintSet::ImfSt2067_201_2019)
            .iter()
            .any(|i| i.code == ErrorCode::BedDefinitionChannelIdsNotPersistent
                && i.id == IssueId::MetaId(1)
                && i.frame_index == 1)
    );
}
