//! Schedule of dated transitions.

use chrono::NaiveDate;
use serde::Serialize;

use super::location_key;
use crate::marker::{MarkerKind, MarkerStatus};
use crate::model::Law;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    BecomesActive,
    Expires,
}

impl From<MarkerKind> for TransitionAction {
    fn from(kind: MarkerKind) -> Self {
        match kind {
            MarkerKind::Enters => TransitionAction::BecomesActive,
            MarkerKind::Ceases => TransitionAction::Expires,
        }
    }
}

/// One paragraph variant changing state on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub location: String,
    /// Marker as written.
    pub marker: String,
    pub kind: MarkerKind,
    pub date: NaiveDate,
    pub action: TransitionAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleReport {
    pub reference_date: NaiveDate,
    pub next_transition_date: Option<NaiveDate>,
    pub total_dated_transitions: usize,
    /// Transitions on or after the reference date.
    pub upcoming_transitions: usize,
    pub transitions: Vec<Transition>,
}

/// List every variant with a dated marker, ordered by date, then location,
/// then kind.
///
/// Relative and invalid markers have no place on a timeline and are left
/// out.
#[must_use]
pub fn build_schedule(law: &Law, reference_date: NaiveDate) -> ScheduleReport {
    let mut transitions: Vec<Transition> = law
        .chapters()
        .flat_map(|chapter| {
            chapter.paragraphs.iter().filter_map(move |paragraph| {
                let MarkerStatus::ValidDated { kind, date } = paragraph.marker_status() else {
                    return None;
                };
                Some(Transition {
                    location: location_key(&chapter.id, &paragraph.id),
                    marker: paragraph.marker.clone().unwrap_or_default(),
                    kind,
                    date,
                    action: kind.into(),
                })
            })
        })
        .collect();

    transitions.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.location.cmp(&b.location))
            .then_with(|| a.kind.cmp(&b.kind))
    });

    let upcoming: Vec<&Transition> = transitions
        .iter()
        .filter(|t| t.date >= reference_date)
        .collect();

    ScheduleReport {
        reference_date,
        next_transition_date: upcoming.first().map(|t| t.date),
        total_dated_transitions: transitions.len(),
        upcoming_transitions: upcoming.len(),
        transitions,
    }
}
