use tracing::{debug, info};

use super::anchors::WorldHit;
use super::camera::{ScreenPoint, ScreenProjection};
use super::error::{InteractionError, Unavailable};
use super::math::{Box3, Vec3};

/// Size, in meters, of the smallest non-flat dimension of a freshly placed object.
pub const DEFAULT_TARGET_SIZE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Unselected,
    Selected,
}

impl Selection {
    /// Flips the state and returns the new value.
    pub fn toggle(&mut self) -> Selection {
        *self = match self {
            Selection::Unselected => Selection::Selected,
            Selection::Selected => Selection::Unselected,
        };
        *self
    }

    pub fn is_selected(self) -> bool {
        self == Selection::Selected
    }
}

/// Uniform scale for a model with the given bounds, the largest per-axis ratio
/// `target / size`. Flat axes are skipped; a point-sized model keeps scale 1.
pub fn fit_scale(bounds: &Box3, target: f64) -> f64 {
    let size = bounds.size();
    (0..3)
        .map(|axis| size.component(axis))
        .filter(|extent| *extent > 0.0 && extent.is_finite())
        .map(|extent| target / extent)
        .reduce(f64::max)
        .unwrap_or(1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub name: String,
    pub position: Vec3,
    pub scale: f64,
    pub bounds: Box3,
    pub selection: Selection,
}

/// Virtual objects placed in the world and their selection state.
#[derive(Debug, Clone)]
pub struct Placement {
    objects: Vec<PlacedObject>,
    target_size: f64,
    group: Selection,
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_SIZE)
    }
}

impl Placement {
    pub fn new(target_size: f64) -> Self {
        Self {
            objects: Vec::new(),
            target_size,
            group: Selection::Unselected,
        }
    }

    pub fn objects(&self) -> &[PlacedObject] {
        &self.objects
    }

    pub fn get(&self, index: usize) -> Option<&PlacedObject> {
        self.objects.get(index)
    }

    pub fn selected(&self) -> impl Iterator<Item = &PlacedObject> {
        self.objects.iter().filter(|o| o.selection.is_selected())
    }

    /// Adds a model at the hit position, scaled to the target size.
    pub fn place(&mut self, name: &str, bounds: Box3, hit: &WorldHit) -> usize {
        let scale = fit_scale(&bounds, self.target_size);
        self.objects.push(PlacedObject {
            name: name.to_string(),
            position: hit.position,
            scale,
            bounds,
            selection: Selection::Unselected,
        });
        let index = self.objects.len() - 1;
        info!(index, name, position = ?hit.position, scale, "placed object");
        index
    }

    pub fn toggle(&mut self, index: usize) -> Option<Selection> {
        let object = self.objects.get_mut(index)?;
        let state = object.selection.toggle();
        debug!(index, ?state, "toggled selection");
        Some(state)
    }

    /// Group toggle: selects every object, or on the next call clears the
    /// selected ones.
    pub fn toggle_all(&mut self) -> Selection {
        let state = self.group.toggle();
        for object in self.objects.iter_mut() {
            object.selection = state;
        }
        debug!(?state, count = self.objects.len(), "toggled every object");
        state
    }

    /// Scales the selected objects, returns how many were affected.
    pub fn pinch(&mut self, factor: f64) -> usize {
        if !factor.is_finite() || factor <= 0.0 {
            return 0;
        }
        let mut count = 0;
        for object in self.objects.iter_mut().filter(|o| o.selection.is_selected()) {
            object.scale *= factor;
            count += 1;
        }
        count
    }

    // moves an object to another screen position at its current depth
    fn reproject<P>(
        &mut self,
        index: usize,
        pose: &P,
        target: impl FnOnce(ScreenPoint) -> ScreenPoint,
    ) -> Option<Result<Vec3, InteractionError>>
    where
        P: ScreenProjection + ?Sized,
    {
        let object = self.objects.get_mut(index)?;
        let moved = (|| -> Result<Vec3, InteractionError> {
            if !pose.is_visible(object.position) {
                return Err(Unavailable::OutOfView.into());
            }
            let projected = pose
                .project(object.position)
                .ok_or(Unavailable::OutOfView)?;
            let target = target(ScreenPoint::new(projected.x, projected.y));
            pose.unproject(target, projected.z)
                .ok_or(InteractionError::DegenerateRay)
        })();
        if let Ok(position) = moved {
            debug!(index, from = ?object.position, to = ?position, "moved object on screen");
            object.position = position;
        }
        Some(moved)
    }

    /// Moves an object following a screen-space drag, keeping its depth.
    /// `None` when there is no object at `index`.
    pub fn drag<P>(
        &mut self,
        index: usize,
        pose: &P,
        translation: ScreenPoint,
    ) -> Option<Result<Vec3, InteractionError>>
    where
        P: ScreenProjection + ?Sized,
    {
        self.reproject(index, pose, |from| {
            ScreenPoint::new(from.x + translation.x, from.y + translation.y)
        })
    }

    /// Moves an object under the screen point `point`, keeping its depth.
    /// `None` when there is no object at `index`.
    pub fn move_to_screen<P>(
        &mut self,
        index: usize,
        pose: &P,
        point: ScreenPoint,
    ) -> Option<Result<Vec3, InteractionError>>
    where
        P: ScreenProjection + ?Sized,
    {
        let moved = self.reproject(index, pose, |_| point);
        if let Some(Ok(position)) = &moved {
            info!(index, position = ?position, "moved object");
        }
        moved
    }
}
