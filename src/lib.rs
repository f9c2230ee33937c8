//! Touch-driven world interaction for augmented reality sessions.
//!
//! A screen touch becomes a world-space ray ([`interaction::caster::cast`]), the
//! ray is matched against the tracked feature points
//! ([`interaction::features::intersect`]) and the detected planes
//! ([`interaction::anchors::hit_test`]), and the resulting position drives the
//! placement and movement of virtual objects ([`interaction::placement`]).

pub mod interaction;
