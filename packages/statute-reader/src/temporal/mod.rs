//! Tools that read the effective-date markers of an extracted statute.
//!
//! - [`apply_effective_date`] keeps the variants that apply on a given day.
//! - [`validate_markers`] lists malformed and unresolved markers.
//! - [`build_schedule`] lists every dated transition.
//!
//! Reports refer to paragraphs by location key, e.g. `K12 P13` for
//! paragraph 13 of chapter 12.

mod effective_date;
mod schedule;
mod validator;

pub use effective_date::{apply_effective_date, EffectiveDateReport};
pub use schedule::{build_schedule, ScheduleReport, Transition, TransitionAction};
pub use validator::{validate_markers, MarkerFinding, MarkerFindingType, ValidationReport};

/// Location key of a paragraph.
#[must_use]
pub fn location_key(chapter_id: &str, paragraph_id: &str) -> String {
    format!("K{chapter_id} P{paragraph_id}")
}
