//! Canonical flight-set digest engine.
//!
//! A batch's on-chain commitment anchors a digest of the *set* of flight
//! keys it covers. The digest must be a pure function of that set:
//! independent callers building the same logical selection from different
//! raw orders have to arrive at the identical value, and any added,
//! removed, or altered key has to change it. Canonicalization is therefore
//! fixed here and nowhere else: deduplicate, sort with a deterministic
//! total order, join with a separator no key may contain, SHA-256.

use sha2::{Digest, Sha256};

use crate::domain::FlightSelectionEntry;

/// Separator between flight keys in the digest preimage. Keys containing it
/// are rejected rather than escaped.
pub const FLIGHT_KEY_SEPARATOR: char = '\n';

/// Errors from the digest engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    /// A digest over zero flights is meaningless; callers must not commit one.
    #[error("empty flight set")]
    EmptyInput,

    /// A key contained the preimage separator.
    #[error("flight key contains separator: {0:?}")]
    SeparatorInKey(String),
}

/// Digest an unordered collection of bare flight keys.
///
/// Duplicates are removed by exact string equality; the deduplicated keys
/// are sorted lexicographically by UTF-8 bytes. Returns the digest as a
/// `0x`-prefixed lowercase hex string.
pub fn flight_set_digest<S: AsRef<str>>(keys: &[S]) -> Result<String, DigestError> {
    if keys.is_empty() {
        return Err(DigestError::EmptyInput);
    }

    let mut canonical: Vec<&str> = Vec::with_capacity(keys.len());
    for key in keys {
        let key = key.as_ref();
        if key.contains(FLIGHT_KEY_SEPARATOR) {
            return Err(DigestError::SeparatorInKey(key.to_string()));
        }
        canonical.push(key);
    }
    canonical.sort_unstable();
    canonical.dedup();

    Ok(digest_sorted(&canonical))
}

/// Digest a flight selection using its natural canonical ordering.
///
/// Entries are deduplicated by `flight_key`, then ordered by
/// `(scheduled_departure, carrier, flight_number, flight_key)` before the
/// keys are joined and hashed. The extra sort keys keep the ordering stable
/// for callers that construct selections from schedule data rather than
/// from bare keys; the trailing key comparison makes the order total.
pub fn flight_selection_digest(entries: &[FlightSelectionEntry]) -> Result<String, DigestError> {
    let ordered = canonical_flight_keys(entries)?;
    let refs: Vec<&str> = ordered.iter().map(String::as_str).collect();
    Ok(digest_sorted(&refs))
}

/// Canonically ordered, deduplicated flight keys of a selection.
pub fn canonical_flight_keys(
    entries: &[FlightSelectionEntry],
) -> Result<Vec<String>, DigestError> {
    if entries.is_empty() {
        return Err(DigestError::EmptyInput);
    }

    let mut sorted: Vec<&FlightSelectionEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        a.scheduled_departure
            .cmp(&b.scheduled_departure)
            .then_with(|| a.carrier.cmp(&b.carrier))
            .then_with(|| a.flight_number.cmp(&b.flight_number))
            .then_with(|| a.flight_key.cmp(&b.flight_key))
    });

    let mut keys: Vec<String> = Vec::with_capacity(sorted.len());
    for entry in sorted {
        if entry.flight_key.contains(FLIGHT_KEY_SEPARATOR) {
            return Err(DigestError::SeparatorInKey(entry.flight_key.clone()));
        }
        if !keys.iter().any(|k| k == &entry.flight_key) {
            keys.push(entry.flight_key.clone());
        }
    }
    Ok(keys)
}

fn digest_sorted(keys: &[&str]) -> String {
    let joined = keys.join(&FLIGHT_KEY_SEPARATOR.to_string());
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(key: &str, dep_hour: u32) -> FlightSelectionEntry {
        FlightSelectionEntry {
            flight_key: key.to_string(),
            carrier: key[..2].to_string(),
            flight_number: "1".to_string(),
            origin: "JFK".to_string(),
            destination: "LAX".to_string(),
            scheduled_departure: Utc.with_ymd_and_hms(2030, 1, 1, dep_hour, 0, 0).unwrap(),
            scheduled_arrival: None,
            terminal: None,
            gate: None,
        }
    }

    #[test]
    fn test_digest_order_independent() {
        let a = flight_set_digest(&["AA1|JFK", "BB2|LAX"]).unwrap();
        let b = flight_set_digest(&["BB2|LAX", "AA1|JFK"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_sensitive_to_membership() {
        let base = flight_set_digest(&["AA1|JFK", "BB2|LAX"]).unwrap();
        let extended = flight_set_digest(&["AA1|JFK", "BB2|LAX", "CC3|ORD"]).unwrap();
        let altered = flight_set_digest(&["AA1|JFK", "BB2|LAX_"]).unwrap();
        assert_ne!(base, extended);
        assert_ne!(base, altered);
    }

    #[test]
    fn test_digest_duplicates_collapse() {
        let with_dupes = flight_set_digest(&["X", "X", "Y"]).unwrap();
        let without = flight_set_digest(&["X", "Y"]).unwrap();
        assert_eq!(with_dupes, without);
    }

    #[test]
    fn test_digest_rejects_empty_input() {
        let empty: [&str; 0] = [];
        assert_eq!(flight_set_digest(&empty), Err(DigestError::EmptyInput));
    }

    #[test]
    fn test_digest_rejects_separator_in_key() {
        let err = flight_set_digest(&["AA1", "bad\nkey"]).unwrap_err();
        assert_eq!(err, DigestError::SeparatorInKey("bad\nkey".to_string()));
    }

    #[test]
    fn test_digest_shape() {
        let digest = flight_set_digest(&["AA1"]).unwrap();
        assert!(digest.starts_with("0x"));
        assert_eq!(digest.len(), 2 + 64);
        assert!(digest[2..].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_selection_digest_permutation_invariant() {
        let e1 = entry("AA1|JFK", 8);
        let e2 = entry("BB2|LAX", 9);
        let e3 = entry("CC3|ORD", 7);

        let a = flight_selection_digest(&[e1.clone(), e2.clone(), e3.clone()]).unwrap();
        let b = flight_selection_digest(&[e3, e1, e2]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_selection_digest_dedups_by_key() {
        let e1 = entry("AA1|JFK", 8);
        let dupe = entry("AA1|JFK", 8);
        let e2 = entry("BB2|LAX", 9);

        let with_dupe = flight_selection_digest(&[e1.clone(), dupe, e2.clone()]).unwrap();
        let without = flight_selection_digest(&[e1, e2]).unwrap();
        assert_eq!(with_dupe, without);
    }

    #[test]
    fn test_canonical_keys_ordered_by_departure() {
        let late = entry("AA1|JFK", 12);
        let early = entry("BB2|LAX", 6);
        let keys = canonical_flight_keys(&[late, early]).unwrap();
        assert_eq!(keys, vec!["BB2|LAX".to_string(), "AA1|JFK".to_string()]);
    }
}
