//! Anchoring an attestation chain to a set of trusted roots.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{AttestationRejected, Certificate};


/// Anchor `chain` (leaf first) against `roots` at the current time.
///
/// See [`anchor_chain_at`].
pub fn anchor_chain(
    chain: &[Certificate],
    roots: &[Certificate],
) -> Result<(), AttestationRejected> {
    anchor_chain_at(chain, roots, unix_now())
}

/// Anchor `chain` (leaf first) against `roots` at `unix_time`.
///
/// Every certificate of the chain must be within its validity period. The first certificate that
/// either is one of the roots, or is issued by one of them (same issuer name and a signature that
/// verifies under the root's key), is the anchor point. Every certificate before it must be issued
/// by the certificate that follows it. The chain is only followed in the order it was supplied;
/// no path building takes place.
pub fn anchor_chain_at(
    chain: &[Certificate],
    roots: &[Certificate],
    unix_time: i64,
) -> Result<(), AttestationRejected> {
    if chain.is_empty() {
        return Err(AttestationRejected::NotAnchored("empty chain".into()));
    }

    if let Some(expired) = chain.iter().find(|cert| !cert.is_valid_at(unix_time)) {
        return Err(AttestationRejected::NotAnchored(format!(
            "`{}` is outside its validity period",
            expired.subject_name()
        )));
    }

    let anchor = chain.iter().position(|cert| {
        roots
            .iter()
            .any(|root| root.der() == cert.der() || cert.is_issued_by(root))
    });
    let Some(anchor) = anchor else {
        return Err(AttestationRejected::NotAnchored(
            "no certificate of the chain is issued by a trust root".into(),
        ));
    };

    match chain[..=anchor]
        .windows(2)
        .find(|pair| !pair[0].is_issued_by(&pair[1]))
    {
        Some(pair) => Err(AttestationRejected::NotAnchored(format!(
            "`{}` is not issued by `{}`",
            pair[0].subject_name(),
            pair[1].subject_name()
        ))),
        None => Ok(()),
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| i64::try_from(elapsed.as_secs()).ok())
        .unwrap_or(i64::MAX)
}
