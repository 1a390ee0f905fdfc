//! Merge algorithm for scan updates.
//!
//! A candidate update applies when its lifecycle state is strictly greater
//! than the cached one, or equal while contributing fields the cached entry
//! lacks. Application is a full replace built from the candidate with its
//! null fields layered from the existing entry, so an applied update can
//! only ever add information.

use crate::models::Scan;

/// Decide whether `candidate` supersedes `current` and, if so, build the
/// replacement entry. Returns `None` when the candidate must be discarded.
pub(crate) fn reconcile(current: &Scan, candidate: Scan) -> Option<Scan> {
    let applies = if candidate.lifecycle_state.supersedes(current.lifecycle_state) {
        true
    } else if candidate.lifecycle_state == current.lifecycle_state {
        fills_missing(current, &candidate)
    } else {
        false
    };

    applies.then(|| layer(candidate, current))
}

/// True when the candidate carries information the current entry lacks.
fn fills_missing(current: &Scan, candidate: &Scan) -> bool {
    (current.product_info.is_none() && candidate.product_info.is_some())
        || (current.analysis_result.is_none() && candidate.analysis_result.is_some())
        || (current.error_message.is_none() && candidate.error_message.is_some())
        || (current.barcode.is_none() && candidate.barcode.is_some())
        || (current.scan_type.is_none() && candidate.scan_type.is_some())
        || (current.images.is_empty() && !candidate.images.is_empty())
        || (!current.favorited && candidate.favorited)
}

/// Candidate fields win; fields the candidate left empty are carried over
/// from the current entry.
fn layer(mut candidate: Scan, current: &Scan) -> Scan {
    if candidate.scan_type.is_none() {
        candidate.scan_type = current.scan_type;
    }
    if candidate.barcode.is_none() {
        candidate.barcode = current.barcode.clone();
    }
    if candidate.product_info.is_none() {
        candidate.product_info = current.product_info.clone();
    }
    if candidate.analysis_result.is_none() {
        candidate.analysis_result = current.analysis_result.clone();
    }
    if candidate.images.is_empty() {
        candidate.images = current.images.clone();
    }
    if candidate.error_message.is_none() {
        candidate.error_message = current.error_message.clone();
    }
    // First observation wins for creation time
    candidate.created_at = current.created_at.or(candidate.created_at);
    if candidate.last_activity_at.is_none() {
        candidate.last_activity_at = current.last_activity_at;
    }
    candidate.favorited = candidate.favorited || current.favorited;
    candidate
}
