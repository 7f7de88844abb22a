//! Cumulative event handler: per-set issue lists and hierarchical rollups.

use crate::validate::issue::{
    ConstraintSet, EventHandler, Issue, Severity, ValidationResult,
};

#[derive(Debug, Default)]
struct SetState {
    has_error: bool,
    has_warning: bool,
    issues: Vec<Issue>,
}

impl SetState {
    fn own_result(&self) -> ValidationResult {
        if self.has_error {
            ValidationResult::Invalid
        } else if self.has_warning {
            ValidationResult::ValidWithWarning
        } else {
            ValidationResult::Valid
        }
    }

    fn reset(&mut self) {
        self.has_error = false;
        self.has_warning = false;
        self.issues.clear();
    }
}

/// Event handler that accumulates issues across frames, keyed by constraint
/// set, and rolls results up the dependency hierarchy.
///
/// A dependent set is never "better" than any set it depends on: its result
/// is the combination of its own state with every ancestor's.
#[derive(Debug, Default)]
pub struct CumulativeEventHandler {
    states: [SetState; 6],
    combined: Vec<Issue>,
}

impl CumulativeEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rolled-up validation result for `set`, dependency chain included.
    pub fn result(&self, set: ConstraintSet) -> ValidationResult {
        set.chain()
            .iter()
            .map(|s| self.states[s.index()].own_result())
            .fold(ValidationResult::Valid, ValidationResult::combine)
    }

    /// All issues along the dependency chain ending at `set`, ordered
    /// [base, middle, leaf] with arrival order preserved within each set.
    pub fn issues(&mut self, set: ConstraintSet) -> &[Issue] {
        let chain = set.chain();

        if chain.len() == 1 {
            return &self.states[set.index()].issues;
        }

        self.combined.clear();
        for s in chain {
            self.combined.extend_from_slice(&self.states[s.index()].issues);
        }

        &self.combined
    }

    /// Issues reported under `set` alone, without its dependency chain.
    pub fn issues_single_set(&self, set: ConstraintSet) -> &[Issue] {
        &self.states[set.index()].issues
    }

    /// Drops all issues recorded under `set` alone.
    pub fn clear_issues(&mut self, set: ConstraintSet) {
        self.states[set.index()].issues.clear();
    }

    /// Resets handler state and empties all issue lists, for all sets.
    pub fn reset(&mut self) {
        for state in &mut self.states {
            state.reset();
        }
        self.combined.clear();
    }
}

impl EventHandler for CumulativeEventHandler {
    fn handle(&mut self, issue: &Issue) -> bool {
        let state = &mut self.states[issue.set.index()];

        match issue.severity {
            Severity::Error => state.has_error = true,
            Severity::Warning => state.has_warning = true,
        }

        state.issues.push(issue.clone());

        // Termination hook: no issue currently requests a stop, but the
        // return value is plumbed through the whole validator so a future
        // fatal event can.
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::issue::{ErrorCode, IssueId};

    fn issue(set: ConstraintSet, code: ErrorCode) -> Issue {
        Issue {
            frame_index: 0,
            id: IssueId::Frame,
            set,
            severity: code.severity(),
            code,
        }
    }

    #[test]
    fn base_error_downgrades_dependents() {
        let mut handler = CumulativeEventHandler::new();
        handler.handle(&issue(
            ConstraintSet::CinemaSt2098_2_2018,
            ErrorCode::MissingAudioDataEssenceElement,
        ));

        assert_eq!(
            handler.result(ConstraintSet::CinemaSt2098_2_2018),
            ValidationResult::Invalid
        );
        assert_eq!(
            handler.result(ConstraintSet::DbyCinema),
            ValidationResult::Invalid
        );
        // The other chain is untouched.
        assert_eq!(
            handler.result(ConstraintSet::DbyImf),
            ValidationResult::Valid
        );
    }

    #[test]
    fn dependent_issue_does_not_affect_base() {
        let mut handler = CumulativeEventHandler::new();
        handler.handle(&issue(
            ConstraintSet::DbyCinema,
            ErrorCode::DbyCinemaObjectDefinitionNonSequentialMetaId,
        ));

        assert_eq!(
            handler.result(ConstraintSet::CinemaSt2098_2_2018),
            ValidationResult::Valid
        );
        assert_eq!(
            handler.result(ConstraintSet::DbyCinema),
            ValidationResult::Invalid
        );
    }

    #[test]
    fn warning_rolls_up_as_valid_with_warning() {
        let mut handler = CumulativeEventHandler::new();
        handler.handle(&issue(
            ConstraintSet::ImfSt2098_2_2019,
            ErrorCode::UnreferencedAudioDataPcmElement,
        ));

        assert_eq!(
            handler.result(ConstraintSet::ImfSt2098_2_2019),
            ValidationResult::ValidWithWarning
        );
        assert_eq!(
            handler.result(ConstraintSet::DbyImf),
            ValidationResult::ValidWithWarning
        );
    }

    #[test]
    fn issue_union_is_base_first() {
        let mut handler = CumulativeEventHandler::new();
        handler.handle(&issue(
            ConstraintSet::DbyCinema,
            ErrorCode::DbyCinemaObjectDefinitionMaxObjectCountExceeded,
        ));
        handler.handle(&issue(
            ConstraintSet::CinemaSt2098_2_2018,
            ErrorCode::BedDefinitionDuplicateMetaId,
        ));

        let combined: Vec<_> = handler
            .issues(ConstraintSet::DbyCinema)
            .iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(
            combined,
            vec![
                ErrorCode::BedDefinitionDuplicateMetaId,
                ErrorCode::DbyCinemaObjectDefinitionMaxObjectCountExceeded
            ]
        );

        assert_eq!(handler.issues_single_set(ConstraintSet::DbyCinema).len(), 1);
        assert_eq!(
            handler
                .issues(ConstraintSet::CinemaSt2098_2_2018)
                .len(),
            1
        );
    }
}
