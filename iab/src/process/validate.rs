//! Cross-element and cross-frame validation.
//!
//! Per frame, after the per-element checks, the validator walks the frame
//! sub-element list collecting identifier sets, counts and packing-order
//! sequences, enforces referential integrity between beds/objects and their
//! essence elements, applies the per-profile frame rules, and compares the
//! frame against the snapshot of the previous one for program persistence.

use std::collections::{BTreeMap, BTreeSet};

use crate::structs::bed::BedDefinition;
use crate::structs::element::{Element, ElementId};
use crate::structs::frame::Frame;
use crate::structs::object::ObjectDefinition;
use crate::structs::types::{AudioDataId, BitDepth, FrameRate, MetaId, SampleRate, UseCase};
use crate::validate::handler::CumulativeEventHandler;
use crate::validate::issue::{
    ConstraintSet, ErrorCode, EventHandler, Issue, IssueId, StopRequested, ValidationCtx,
    ValidationResult,
};
use crate::validate::registry;

/// Bed or object parameters subject to cross-frame persistence rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PersistenceParams {
    conditional: bool,
    use_case: Option<UseCase>,
    /// Channel ID codes; beds only.
    channel_ids: BTreeSet<u32>,
}

/// Frame parameters and sub-element composition frozen after one frame, for
/// comparison against the next.
#[derive(Debug, Clone)]
struct FrameSnapshot {
    version: u8,
    sample_rate: SampleRate,
    bit_depth: BitDepth,
    frame_rate: FrameRate,
    bed_count: u32,
    bed_meta_ids: BTreeSet<MetaId>,
    beds: BTreeMap<MetaId, PersistenceParams>,
    objects: BTreeMap<MetaId, PersistenceParams>,
    seq_ids: Vec<u32>,
    seq_kinds: Vec<ElementId>,
}

/// Multi-profile frame validator.
///
/// Feed frames in presentation order through
/// [`validate_frame`](Validator::validate_frame), then query results and
/// issue lists per constraint set. All six sets are evaluated on every
/// frame; selecting which to report on is the caller's concern.
#[derive(Default)]
pub struct Validator {
    handler: CumulativeEventHandler,
    frame_index: u32,

    // Per-frame stats, rebuilt by the collection pass.
    frame_bed_meta_ids: BTreeSet<MetaId>,
    frame_bed_remap_meta_ids: BTreeSet<MetaId>,
    frame_object_meta_ids: BTreeSet<MetaId>,
    frame_essence_ids: BTreeSet<AudioDataId>,
    frame_dlc_ids: BTreeSet<AudioDataId>,
    frame_pcm_ids: BTreeSet<AudioDataId>,
    frame_referred_ids: BTreeSet<AudioDataId>,
    frame_beds_persistence: BTreeMap<MetaId, PersistenceParams>,
    frame_objects_persistence: BTreeMap<MetaId, PersistenceParams>,
    frame_seq_ids: Vec<u32>,
    frame_seq_kinds: Vec<ElementId>,

    frame_bed_count: u32,
    frame_object_count: u32,
    frame_authoring_tool_info_count: u32,
    frame_undefined_count: u32,
    frame_rendered_channel_count: u32,
    last_bed_channel_count: usize,

    // Snapshot of the previous frame; `None` before the first frame.
    globals: Option<FrameSnapshot>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates one frame against all constraint sets, accumulating issues.
    ///
    /// Frames must be presented in order; `frame_index` stamps the issues
    /// raised for this frame.
    pub fn validate_frame(
        &mut self,
        frame: &Frame,
        frame_index: u32,
    ) -> Result<(), StopRequested> {
        self.frame_index = frame_index;

        // Per-element validation first; it knows nothing about siblings.
        let mut ctx = ValidationCtx {
            handler: &mut self.handler,
            frame_index,
            frame_rate: None,
            frame_sample_rate: None,
        };

        if !frame.validate(&mut ctx) {
            return Err(StopRequested);
        }

        self.reset_frame_stats();

        if !self.collect_frame_stats(frame)
            || !self.check_frame_rules(frame)
            || !self.check_continuous_audio_sequence(frame)
            || !self.check_persistence(frame)
        {
            return Err(StopRequested);
        }

        // Overwrite the snapshot with this frame's values; the next frame is
        // compared against this one, so alternating parameters report
        // transitions rather than every divergence from frame zero.
        self.globals = Some(self.snapshot(frame));

        Ok(())
    }

    /// Rolled-up validation result for `set`.
    pub fn result(&self, set: ConstraintSet) -> ValidationResult {
        self.handler.result(set)
    }

    /// Issues along the dependency chain ending at `set`, base first.
    pub fn issues(&mut self, set: ConstraintSet) -> &[Issue] {
        self.handler.issues(set)
    }

    /// Issues reported under `set` alone.
    pub fn issues_single_set(&self, set: ConstraintSet) -> &[Issue] {
        self.handler.issues_single_set(set)
    }

    fn report(&mut self, id: IssueId, set: ConstraintSet, code: ErrorCode) -> bool {
        let issue = Issue {
            frame_index: self.frame_index,
            id,
            set,
            severity: code.severity(),
            code,
        };

        self.handler.handle(&issue)
    }

    fn report_both_bases(&mut self, id: IssueId, code: ErrorCode) -> bool {
        self.report(id, ConstraintSet::CinemaSt2098_2_2018, code)
            && self.report(id, ConstraintSet::ImfSt2098_2_2019, code)
    }

    fn reset_frame_stats(&mut self) {
        self.frame_bed_meta_ids.clear();
        self.frame_bed_remap_meta_ids.clear();
        self.frame_object_meta_ids.clear();
        self.frame_essence_ids.clear();
        self.frame_dlc_ids.clear();
        self.frame_pcm_ids.clear();
        self.frame_referred_ids.clear();
        self.frame_beds_persistence.clear();
        self.frame_objects_persistence.clear();
        self.frame_seq_ids.clear();
        self.frame_seq_kinds.clear();

        self.frame_bed_count = 0;
        self.frame_object_count = 0;
        self.frame_authoring_tool_info_count = 0;
        self.frame_undefined_count = 0;
        self.frame_rendered_channel_count = 0;
        self.last_bed_channel_count = 0;
    }

    /// Collection pass over the frame sub-element list. Duplicate-identifier
    /// detection happens during insertion.
    fn collect_frame_stats(&mut self, frame: &Frame) -> bool {
        self.frame_undefined_count = frame.num_undefined_sub_elements;

        for element in frame.sub_elements() {
            let keep_going = match element {
                Element::BedDefinition(bed) => self.collect_bed_stats(bed, 0),
                Element::ObjectDefinition(object) => self.collect_object_stats(object, 0),
                Element::AudioDataDlc(dlc) => {
                    self.collect_essence_id(dlc.audio_data_id, true, Some(dlc.dlc_sample_rate), frame)
                }
                Element::AudioDataPcm(pcm) => {
                    self.collect_essence_id(pcm.audio_data_id, false, None, frame)
                }
                Element::AuthoringToolInfo(_) => {
                    self.frame_authoring_tool_info_count += 1;
                    true
                }
                Element::UserData(_) => true,
                _ => {
                    self.frame_undefined_count += 1;
                    true
                }
            };

            if !keep_going {
                return false;
            }
        }

        true
    }

    fn collect_bed_stats(&mut self, bed: &BedDefinition, level: u32) -> bool {
        let id = IssueId::MetaId(bed.meta_id);

        if self.frame_bed_meta_ids.contains(&bed.meta_id)
            && !self.report_both_bases(id, ErrorCode::BedDefinitionDuplicateMetaId)
        {
            return false;
        }
        self.frame_bed_meta_ids.insert(bed.meta_id);

        let mut channel_ids = BTreeSet::new();
        for channel in &bed.channels {
            if channel_ids.contains(&channel.channel_id.code())
                && !self.report_both_bases(id, ErrorCode::BedDefinitionDuplicateChannelId)
            {
                return false;
            }
            channel_ids.insert(channel.channel_id.code());
            self.frame_referred_ids.insert(channel.audio_data_id);
        }

        if level > 0 {
            // A bed nested below another bed: any further bed below it
            // exceeds the one-level hierarchy bound.
            for element in bed.sub_elements() {
                if matches!(element, Element::BedDefinition(_))
                    && !self
                        .report_both_bases(id, ErrorCode::BedDefinitionHierarchyLevelExceeded)
                {
                    return false;
                }
            }

            return true;
        }

        self.frame_beds_persistence.insert(
            bed.meta_id,
            PersistenceParams {
                conditional: bed.conditional,
                use_case: bed.use_case.filter(|_| bed.conditional),
                channel_ids,
            },
        );

        self.frame_bed_count += 1;
        self.frame_rendered_channel_count += bed.channels.len() as u32;
        self.last_bed_channel_count = bed.channels.len();

        let mut sub_element_use_cases = BTreeSet::new();

        for element in bed.sub_elements() {
            match element {
                Element::BedDefinition(sub_bed) => {
                    if sub_bed.conditional {
                        let use_case = sub_bed.use_case.unwrap_or(UseCase::Always).code();
                        if sub_element_use_cases.contains(&use_case) {
                            if !self
                                .report_both_bases(id, ErrorCode::BedDefinitionMultiActiveSubElements)
                            {
                                return false;
                            }
                        } else {
                            sub_element_use_cases.insert(use_case);
                        }
                    } else if !self
                        .report_both_bases(id, ErrorCode::BedDefinitionAlwaysActiveSubElement)
                    {
                        return false;
                    }

                    if !self.collect_bed_stats(sub_bed, 1) {
                        return false;
                    }
                }
                Element::BedRemap(remap) => {
                    let use_case = remap.use_case.code();
                    if sub_element_use_cases.contains(&use_case) {
                        if !self
                            .report_both_bases(id, ErrorCode::BedDefinitionMultiActiveSubElements)
                        {
                            return false;
                        }
                    } else {
                        sub_element_use_cases.insert(use_case);
                    }

                    if self.frame_bed_remap_meta_ids.contains(&remap.meta_id)
                        && !self.report_both_bases(
                            IssueId::MetaId(remap.meta_id),
                            ErrorCode::BedRemapDuplicateMetaId,
                        )
                    {
                        return false;
                    }
                    self.frame_bed_remap_meta_ids.insert(remap.meta_id);
                }
                _ => {}
            }
        }

        true
    }

    fn collect_object_stats(&mut self, object: &ObjectDefinition, level: u32) -> bool {
        let id = IssueId::MetaId(object.meta_id);

        if self.frame_object_meta_ids.contains(&object.meta_id)
            && !self.report_both_bases(id, ErrorCode::ObjectDefinitionDuplicateMetaId)
        {
            return false;
        }
        self.frame_object_meta_ids.insert(object.meta_id);

        self.frame_referred_ids.insert(object.audio_data_id);

        if level > 0 {
            let mut zone19_count = 0u32;
            for element in object.sub_elements() {
                match element {
                    Element::ObjectDefinition(_) => {
                        if !self.report_both_bases(
                            id,
                            ErrorCode::ObjectDefinitionHierarchyLevelExceeded,
                        ) {
                            return false;
                        }
                    }
                    Element::ObjectZoneDefinition19(_) => {
                        zone19_count += 1;
                        if zone19_count > 1
                            && !self.report_both_bases(
                                id,
                                ErrorCode::ObjectDefinitionMultipleZone19SubElements,
                            )
                        {
                            return false;
                        }
                    }
                    _ => {}
                }
            }

            return true;
        }

        self.frame_objects_persistence.insert(
            object.meta_id,
            PersistenceParams {
                conditional: object.conditional,
                use_case: object.use_case.filter(|_| object.conditional),
                channel_ids: BTreeSet::new(),
            },
        );

        self.frame_object_count += 1;

        let mut sub_element_use_cases = BTreeSet::new();
        let mut zone19_count = 0u32;

        for element in object.sub_elements() {
            match element {
                Element::ObjectDefinition(sub_object) => {
                    if sub_object.conditional {
                        let use_case = sub_object.use_case.unwrap_or(UseCase::Always).code();
                        if sub_element_use_cases.contains(&use_case) {
                            if !self.report_both_bases(
                                id,
                                ErrorCode::ObjectDefinitionMultiActiveSubElements,
                            ) {
                                return false;
                            }
                        } else {
                            sub_element_use_cases.insert(use_case);
                        }
                    } else if !self
                        .report_both_bases(id, ErrorCode::ObjectDefinitionAlwaysActiveSubElement)
                    {
                        return false;
                    }

                    if !self.collect_object_stats(sub_object, 1) {
                        return false;
                    }
                }
                Element::ObjectZoneDefinition19(_) => {
                    zone19_count += 1;
                    if zone19_count > 1
                        && !self.report_both_bases(
                            id,
                            ErrorCode::ObjectDefinitionMultipleZone19SubElements,
                        )
                    {
                        return false;
                    }
                }
                _ => {}
            }
        }

        true
    }

    fn collect_essence_id(
        &mut self,
        audio_data_id: AudioDataId,
        is_dlc: bool,
        dlc_sample_rate: Option<SampleRate>,
        frame: &Frame,
    ) -> bool {
        let id = IssueId::AudioDataId(audio_data_id);

        if self.frame_essence_ids.contains(&audio_data_id) {
            let code = if is_dlc {
                ErrorCode::AudioDataDlcDuplicateAudioDataId
            } else {
                ErrorCode::AudioDataPcmDuplicateAudioDataId
            };
            if !self.report_both_bases(id, code) {
                return false;
            }
        }

        self.frame_essence_ids.insert(audio_data_id);
        if is_dlc {
            self.frame_dlc_ids.insert(audio_data_id);
        } else {
            self.frame_pcm_ids.insert(audio_data_id);
        }

        if let Some(dlc_rate) = dlc_sample_rate
            && dlc_rate != frame.sample_rate
            && !self.report_both_bases(id, ErrorCode::AudioDataDlcSampleRateConflict)
        {
            return false;
        }

        true
    }

    /// Frame-level rules over the collected stats: referential integrity,
    /// unused essence, undefined elements, MaxRendered agreement and the
    /// DbyCinema frame shape rules.
    fn check_frame_rules(&mut self, frame: &Frame) -> bool {
        if self.frame_authoring_tool_info_count > 1
            && !self.report_both_bases(
                IssueId::Frame,
                ErrorCode::AuthoringToolInfoMultipleElements,
            )
        {
            return false;
        }

        // Referential integrity: every non-zero referred AudioDataID must
        // resolve to an essence element in this frame. Zero is silence.
        let missing: Vec<_> = self
            .frame_referred_ids
            .iter()
            .copied()
            .filter(|&id| id != 0 && !self.frame_essence_ids.contains(&id))
            .collect();
        for audio_id in missing {
            if !self.report_both_bases(
                IssueId::AudioDataId(audio_id),
                ErrorCode::MissingAudioDataEssenceElement,
            ) {
                return false;
            }
        }

        let unused_dlc: Vec<_> = self
            .frame_dlc_ids
            .iter()
            .copied()
            .filter(|id| !self.frame_referred_ids.contains(id))
            .collect();
        for audio_id in unused_dlc {
            if !self.report_both_bases(
                IssueId::AudioDataId(audio_id),
                ErrorCode::UnreferencedAudioDataDlcElement,
            ) {
                return false;
            }
        }

        let unused_pcm: Vec<_> = self
            .frame_pcm_ids
            .iter()
            .copied()
            .filter(|id| !self.frame_referred_ids.contains(id))
            .collect();
        for audio_id in unused_pcm {
            if !self.report_both_bases(
                IssueId::AudioDataId(audio_id),
                ErrorCode::UnreferencedAudioDataPcmElement,
            ) {
                return false;
            }
        }

        if self.frame_undefined_count > 0 {
            if !self.report_both_bases(
                IssueId::Frame,
                ErrorCode::FrameContainUndefinedSubElement,
            ) {
                return false;
            }

            // Stricter sets refuse undefined elements outright; flag once
            // per chain at the first set that does.
            for set in ConstraintSet::ALL {
                let errors_here = registry::params(set).undefined_elements_are_errors;
                let base_tolerates = set
                    .base()
                    .is_none_or(|base| !registry::params(base).undefined_elements_are_errors);

                if errors_here
                    && base_tolerates
                    && !self.report(IssueId::Frame, set, ErrorCode::FrameUndefinedElementType)
                {
                    return false;
                }
            }
        }

        let rendered = self.frame_rendered_channel_count + self.frame_object_count;
        if frame.max_rendered != rendered
            && !self.report_both_bases(
                IssueId::Frame,
                ErrorCode::FrameMaxRenderedNotMatchObjectNumbers,
            )
        {
            return false;
        }

        // DbyCinema frame shape rules.
        let dby_cinema = registry::params(ConstraintSet::DbyCinema);

        if dby_cinema.single_bed_only && self.frame_bed_count > 1 {
            if !self.report(
                IssueId::Frame,
                ConstraintSet::DbyCinema,
                ErrorCode::DbyCinemaBedDefinitionMultipleBedsNotAllowed,
            ) {
                return false;
            }
        } else if self.frame_bed_count == 1
            && let Some(max_channels) = dby_cinema.max_bed_channels
            && self.last_bed_channel_count > max_channels
            && !self.report(
                IssueId::Frame,
                ConstraintSet::DbyCinema,
                ErrorCode::DbyCinemaBedDefinitionMaxChannelCountExceeded,
            )
        {
            return false;
        }

        if let Some(max_objects) = dby_cinema.max_object_count
            && self.frame_object_count as usize > max_objects
            && !self.report(
                IssueId::Frame,
                ConstraintSet::DbyCinema,
                ErrorCode::DbyCinemaObjectDefinitionMaxObjectCountExceeded,
            )
        {
            return false;
        }

        if dby_cinema.require_sequential_object_meta_ids {
            let meta_ids: Vec<MetaId> = self.frame_object_meta_ids.iter().copied().collect();
            let mut next_meta_id: MetaId = 1;
            for meta_id in meta_ids {
                if meta_id != next_meta_id {
                    if !self.report(
                        IssueId::Frame,
                        ConstraintSet::DbyCinema,
                        ErrorCode::DbyCinemaObjectDefinitionNonSequentialMetaId,
                    ) {
                        return false;
                    }
                    break;
                }
                next_meta_id += 1;
            }
        }

        true
    }

    /// DbyIMF continuous-audio sequence check over the frame sub-element
    /// order, building the packing sequence used for persistence.
    ///
    /// One violation is reported per frame; the walk stops there so one
    /// mis-ordered element does not cascade.
    fn check_continuous_audio_sequence(&mut self, frame: &Frame) -> bool {
        let mut has_object_appeared = false;

        for element in frame.sub_elements() {
            match element {
                Element::BedDefinition(bed) => {
                    if has_object_appeared {
                        return self.report_sequence_error();
                    }

                    // Silent channels (AudioDataID zero) reference no
                    // essence and demand no preceding PCM element.
                    let linked_ids: Vec<AudioDataId> = bed
                        .channels
                        .iter()
                        .map(|channel| channel.audio_data_id)
                        .filter(|&audio_data_id| audio_data_id != 0)
                        .collect();
                    let channel_count = linked_ids.len();
                    let len = self.frame_seq_kinds.len();

                    if len < channel_count {
                        return self.report_sequence_error();
                    }

                    let preceding_all_pcm = self.frame_seq_kinds[len - channel_count..]
                        .iter()
                        .all(|&kind| kind == ElementId::AudioDataPcm);
                    if !preceding_all_pcm {
                        return self.report_sequence_error();
                    }

                    let window = &self.frame_seq_ids[len - channel_count..];
                    let all_linked = linked_ids
                        .iter()
                        .all(|audio_data_id| window.contains(audio_data_id));
                    if !all_linked {
                        return self.report_sequence_error();
                    }

                    self.frame_seq_ids.push(bed.meta_id);
                    self.frame_seq_kinds.push(ElementId::BedDefinition);
                }
                Element::ObjectDefinition(object) => {
                    has_object_appeared = true;

                    let last_is_linked_pcm = self
                        .frame_seq_kinds
                        .last()
                        .zip(self.frame_seq_ids.last())
                        .is_some_and(|(&kind, &id)| {
                            kind == ElementId::AudioDataPcm && id == object.audio_data_id
                        });

                    if !last_is_linked_pcm {
                        return self.report_sequence_error();
                    }

                    self.frame_seq_ids.push(object.meta_id);
                    self.frame_seq_kinds.push(ElementId::ObjectDefinition);
                }
                Element::AudioDataPcm(pcm) => {
                    self.frame_seq_ids.push(pcm.audio_data_id);
                    self.frame_seq_kinds.push(ElementId::AudioDataPcm);
                }
                _ => {}
            }
        }

        true
    }

    fn report_sequence_error(&mut self) -> bool {
        self.report(
            IssueId::Frame,
            ConstraintSet::DbyImf,
            ErrorCode::DbyImfNotMeetingContinuousAudioSequence,
        )
    }

    /// Compares this frame against the previous frame's snapshot.
    fn check_persistence(&mut self, frame: &Frame) -> bool {
        let Some(globals) = self.globals.take() else {
            return true;
        };

        let keep_going = self.check_frame_parameter_persistence(frame, &globals)
            && self.check_sub_element_persistence(&globals)
            && self.check_sequence_persistence(&globals);

        self.globals = Some(globals);
        keep_going
    }

    fn check_frame_parameter_persistence(
        &mut self,
        frame: &Frame,
        globals: &FrameSnapshot,
    ) -> bool {
        let id = IssueId::Frame;

        if frame.version != globals.version
            && !self.report_both_bases(id, ErrorCode::FrameVersionNotPersistent)
        {
            return false;
        }

        if frame.sample_rate != globals.sample_rate
            && !self.report_both_bases(id, ErrorCode::FrameSampleRateNotPersistent)
        {
            return false;
        }

        if frame.bit_depth != globals.bit_depth
            && !self.report_both_bases(id, ErrorCode::FrameBitDepthNotPersistent)
        {
            return false;
        }

        if frame.frame_rate != globals.frame_rate
            && !self.report_both_bases(id, ErrorCode::FrameRateNotPersistent)
        {
            return false;
        }

        true
    }

    fn check_sub_element_persistence(&mut self, globals: &FrameSnapshot) -> bool {
        // DbyCinema: a single constant bed with a constant channel list.
        if globals.beds.len() == self.frame_beds_persistence.len()
            && self.frame_beds_persistence.len() <= 1
        {
            let frame_first = self
                .frame_beds_persistence
                .iter()
                .next()
                .map(|(k, v)| (*k, v.clone()));

            if let (Some((frame_id, frame_bed)), Some((global_id, global_bed))) =
                (frame_first, globals.beds.iter().next())
            {
                if frame_id != *global_id {
                    if !self.report(
                        IssueId::MetaId(frame_id),
                        ConstraintSet::DbyCinema,
                        ErrorCode::DbyCinemaBedDefinitionMetaIdNotPersistent,
                    ) {
                        return false;
                    }
                } else if frame_bed.channel_ids != global_bed.channel_ids
                    && !self.report(
                        IssueId::MetaId(frame_id),
                        ConstraintSet::DbyCinema,
                        ErrorCode::DbyCinemaBedDefinitionChannelListNotPersistent,
                    )
                {
                    return false;
                }
            }
        } else {
            let id = self
                .frame_beds_persistence
                .keys()
                .next()
                .map_or(IssueId::Frame, |&meta_id| IssueId::MetaId(meta_id));
            if !self.report(
                id,
                ConstraintSet::DbyCinema,
                ErrorCode::DbyCinemaBedDefinitionCountNotPersistent,
            ) {
                return false;
            }
        }

        // IMF application profile: bed composition is constant over frames.
        if globals.bed_count != self.frame_bed_count {
            if !self.report(
                IssueId::Frame,
                ConstraintSet::ImfSt2067_201_2019,
                ErrorCode::BedDefinitionCountNotPersistent,
            ) {
                return false;
            }
        } else if globals.bed_meta_ids != self.frame_bed_meta_ids {
            // Sub-element bed MetaIDs are included in this comparison on
            // purpose; replacing a nested alternative bed also breaks
            // persistence.
            if !self.report(
                IssueId::Frame,
                ConstraintSet::ImfSt2067_201_2019,
                ErrorCode::BedDefinitionMetaIdNotPersistent,
            ) {
                return false;
            }
        } else {
            let frame_beds: Vec<_> = self
                .frame_beds_persistence
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect();

            for (meta_id, frame_bed) in frame_beds {
                let Some(global_bed) = globals.beds.get(&meta_id) else {
                    continue;
                };
                let id = IssueId::MetaId(meta_id);

                if (frame_bed.conditional != global_bed.conditional
                    || frame_bed.use_case != global_bed.use_case)
                    && !self.report(
                        id,
                        ConstraintSet::ImfSt2067_201_2019,
                        ErrorCode::BedDefinitionConditionalStateNotPersistent,
                    )
                {
                    return false;
                }

                if frame_bed.channel_ids.len() != global_bed.channel_ids.len() {
                    if !self.report(
                        id,
                        ConstraintSet::ImfSt2067_201_2019,
                        ErrorCode::BedDefinitionChannelCountNotPersistent,
                    ) {
                        return false;
                    }
                } else if frame_bed.channel_ids != global_bed.channel_ids
                    && !self.report(
                        id,
                        ConstraintSet::ImfSt2067_201_2019,
                        ErrorCode::BedDefinitionChannelIdsNotPersistent,
                    )
                {
                    return false;
                }
            }
        }

        let frame_objects: Vec<_> = self
            .frame_objects_persistence
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect();

        for (meta_id, frame_object) in frame_objects {
            let Some(global_object) = globals.objects.get(&meta_id) else {
                continue;
            };

            if (frame_object.conditional != global_object.conditional
                || frame_object.use_case != global_object.use_case)
                && !self.report(
                    IssueId::MetaId(meta_id),
                    ConstraintSet::ImfSt2067_201_2019,
                    ErrorCode::ObjectDefinitionConditionalStateNotPersistent,
                )
            {
                return false;
            }
        }

        true
    }

    fn check_sequence_persistence(&mut self, globals: &FrameSnapshot) -> bool {
        if globals.seq_ids != self.frame_seq_ids || globals.seq_kinds != self.frame_seq_kinds {
            return self.report(
                IssueId::Frame,
                ConstraintSet::DbyImf,
                ErrorCode::DbyImfContinuousAudioSequenceNotPersistent,
            );
        }

        true
    }

    fn snapshot(&self, frame: &Frame) -> FrameSnapshot {
        FrameSnapshot {
            version: frame.version,
            sample_rate: frame.sample_rate,
            bit_depth: frame.bit_depth,
            frame_rate: frame.frame_rate,
            bed_count: self.frame_bed_count,
            bed_meta_ids: self.frame_bed_meta_ids.clone(),
            beds: self.frame_beds_persistence.clone(),
            objects: self.frame_objects_persistence.clone(),
            seq_ids: self.frame_seq_ids.clone(),
            seq_kinds: self.frame_seq_kinds.clone(),
        }
    }
}
