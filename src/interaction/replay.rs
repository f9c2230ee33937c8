use std::fmt;

use tracing::{info, warn};

use super::anchors::{hit_test, preferred, HitKind, WorldHit};
use super::camera::ScreenPoint;
use super::caster::cast;
use super::error::{InteractionError, Unavailable};
use super::features::HitOptions;
use super::parser::{Event, Session};
use super::placement::{Placement, Selection};
use super::Vec3;

/// What a replayed event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Placed { index: usize, hit: WorldHit },
    /// the grabbed object slid under the tapped point, keeping its depth
    Moved {
        index: usize,
        position: Vec3,
        hit: WorldHit,
    },
    Toggled { index: usize, state: Selection },
    ToggledAll(Selection),
    Pinched { count: usize },
    Dragged { index: usize, position: Vec3 },
    /// the tap produced no hit or the object could not be moved
    Skipped(InteractionError),
    /// the event refers to an object that does not exist
    NoSuchObject(usize),
}

fn kind_label(kind: &HitKind) -> String {
    match kind {
        HitKind::Plane { anchor } => format!("plane #{}", anchor),
        HitKind::FeaturePoint(feature) => format!(
            "feature ({:.3}, {:.3}, {:.3}) off by {:.4}",
            feature.feature.x, feature.feature.y, feature.feature.z, feature.feature_distance
        ),
    }
}

fn fmt_vec(v: &Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Placed { index, hit } => write!(
                f,
                "placed #{} at {} on {}",
                index,
                fmt_vec(&hit.position),
                kind_label(&hit.kind)
            ),
            Outcome::Moved {
                index,
                position,
                hit,
            } => write!(
                f,
                "moved #{} to {} towards {}",
                index,
                fmt_vec(position),
                kind_label(&hit.kind)
            ),
            Outcome::Toggled { index, state } => write!(f, "#{} is now {:?}", index, state),
            Outcome::ToggledAll(state) => write!(f, "every object is now {:?}", state),
            Outcome::Pinched { count } => write!(f, "scaled {} selected object(s)", count),
            Outcome::Dragged { index, position } => {
                write!(f, "dragged #{} to {}", index, fmt_vec(position))
            }
            Outcome::Skipped(err) => write!(f, "skipped: {}", err),
            Outcome::NoSuchObject(index) => write!(f, "no object #{}", index),
        }
    }
}

/// Applies session events to the placed objects, one at a time.
pub struct Replay {
    placement: Placement,
    options: HitOptions,
    /// object picked by the last toggle, moved by every tap on a feature point
    /// until a toggle releases it or grabs another one
    grabbed: Option<usize>,
    hits: Vec<WorldHit>,
}

impl Replay {
    pub fn new(options: HitOptions) -> Self {
        Self {
            placement: Placement::default(),
            options,
            grabbed: None,
            hits: Vec::new(),
        }
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Every hit used by a tap, in replay order.
    pub fn hits(&self) -> &[WorldHit] {
        &self.hits
    }

    pub fn step(&mut self, session: &Session, event: &Event) -> Outcome {
        let outcome = match *event {
            Event::Tap(point) => self.tap(session, point),
            Event::Toggle(index) => match self.placement.toggle(index) {
                Some(state) => {
                    self.grabbed = if self.grabbed == Some(index) {
                        None
                    } else {
                        Some(index)
                    };
                    Outcome::Toggled { index, state }
                }
                None => Outcome::NoSuchObject(index),
            },
            Event::ToggleAll => Outcome::ToggledAll(self.placement.toggle_all()),
            Event::Pinch(factor) => Outcome::Pinched {
                count: self.placement.pinch(factor),
            },
            Event::Drag(index, translation) => {
                match self.placement.drag(index, &session.camera, translation) {
                    Some(Ok(position)) => Outcome::Dragged { index, position },
                    Some(Err(err)) => Outcome::Skipped(err),
                    None => Outcome::NoSuchObject(index),
                }
            }
        };
        match &outcome {
            Outcome::Skipped(err) => warn!(?event, %err, "interaction skipped"),
            _ => info!(?event, %outcome, "interaction"),
        }
        outcome
    }

    pub fn run(&mut self, session: &Session) -> Vec<Outcome> {
        session
            .events
            .iter()
            .map(|event| self.step(session, event))
            .collect()
    }

    fn tap(&mut self, session: &Session, point: ScreenPoint) -> Outcome {
        let ray = match cast(point, Some(&session.camera)) {
            Ok(ray) => ray,
            Err(err) => return Outcome::Skipped(err),
        };
        let hits = hit_test(&ray, &session.anchors, &session.cloud, self.options);
        let Some(hit) = preferred(&hits).copied() else {
            let reason = if session.cloud.is_empty() {
                Unavailable::EmptyCloud
            } else {
                Unavailable::NothingInFront
            };
            return Outcome::Skipped(reason.into());
        };
        self.hits.push(hit);

        match self.grabbed {
            Some(index) if hit.is_feature_point() => {
                match self.placement.move_to_screen(index, &session.camera, point) {
                    Some(Ok(position)) => Outcome::Moved {
                        index,
                        position,
                        hit,
                    },
                    Some(Err(err)) => Outcome::Skipped(err),
                    None => Outcome::NoSuchObject(index),
                }
            }
            _ => {
                let model = &session.model;
                let index = self.placement.place(&model.name, model.bounds, &hit);
                Outcome::Placed { index, hit }
            }
        }
    }
}
