use crate::tags::tag_series_matches;
use crate::types::{ArchMatch, RowStatus, Service};

/// Classify a service's update opportunity.
///
/// Ordered decision table, first match wins: ignore and arch-mismatch are
/// hard gates evaluated before any tag-series reasoning, and a confirmed
/// cross-series candidate outranks the "unproven" catch-all. Total over any
/// service, however incomplete the data.
pub fn classify(service: &Service) -> RowStatus {
    if service.ignore.as_ref().is_some_and(|m| m.matched) {
        return RowStatus::Blocked;
    }

    let Some(candidate) = service.candidate.as_ref() else {
        return RowStatus::Ok;
    };

    if candidate.arch_match == ArchMatch::Mismatch {
        return RowStatus::ArchMismatch;
    }

    let effective_current = service
        .image
        .resolved_tag
        .as_deref()
        .unwrap_or(&service.image.tag);

    match tag_series_matches(effective_current, &candidate.tag) {
        Some(false) => RowStatus::CrossTag,
        None => RowStatus::Hint,
        Some(true) if candidate.arch_match == ArchMatch::Unknown => RowStatus::Hint,
        Some(true) => RowStatus::Updatable,
    }
}
