//! Patient normalization pipeline: unwrap → resolve → filter → truncate.
//!
//! Filtering runs *after* resolution so the name filter always means
//! "canonical name", whatever key the upstream used for it. Order is
//! stable throughout — records come out in the order the upstream sent
//! them.

use serde_json::Value;

use crate::envelope::{self, EnvelopeError};
use crate::fields::{AliasTable, CanonicalPatient};

/// Normalize one upstream reply into canonical patient records.
///
/// `name_filter` is a case-insensitive substring match on the canonical
/// name; `None` keeps everything. `limit` truncates the filtered set;
/// `None` keeps everything, `Some(0)` yields no results.
pub fn normalize(
    envelope: &Value,
    aliases: &AliasTable,
    name_filter: Option<&str>,
    limit: Option<u32>,
) -> Result<Vec<CanonicalPatient>, EnvelopeError> {
    if limit == Some(0) {
        // Still validate the envelope shape — a malformed reply is an
        // error even when the caller asked for zero rows.
        envelope::unwrap(envelope)?;
        return Ok(Vec::new());
    }

    let mut patients: Vec<CanonicalPatient> = envelope::unwrap(envelope)?
        .iter()
        .map(|record| aliases.resolve(record))
        .collect();

    if let Some(filter) = name_filter {
        let needle = filter.to_lowercase();
        patients.retain(|p| p.name.to_lowercase().contains(&needle));
    }

    if let Some(limit) = limit {
        patients.truncate(limit as usize);
    }

    Ok(patients)
}
