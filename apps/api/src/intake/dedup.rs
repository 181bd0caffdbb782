//! Duplicate rule shared by both resume views.
//!
//! A submission is a duplicate when its phone already appears on the same
//! job in either the canonical table or the embedded snapshots; the same
//! phone on a different job never collides.
//!
//! Enforcement lives inside [`crate::store::PortalStore::insert_resume`],
//! under the job lock, so a concurrent pair of identical submissions cannot
//! both pass the check. The standalone probe
//! [`crate::store::PortalStore::phone_exists_for_job`] serves the pipeline's
//! early exit; this helper is the embedded half both backends share.

use crate::models::EmbeddedResume;

/// True when any snapshot on the job carries this phone.
pub fn embedded_collision(snapshots: &[EmbeddedResume], phone: &str) -> bool {
    snapshots.iter().any(|snap| snap.candidate_phone == phone)
}
