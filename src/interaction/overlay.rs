use image::{ImageBuffer, Rgb, RgbImage};

use super::camera::ScreenProjection;
use super::features::FeatureCloud;
use super::math::Vec3;

const BACKGROUND: Rgb<u8> = Rgb([16, 16, 24]);
const FEATURE: Rgb<u8> = Rgb([220, 220, 220]);
const HIT: Rgb<u8> = Rgb([255, 64, 32]);
const OBJECT: Rgb<u8> = Rgb([64, 220, 96]);

/// Debug view of a session: feature points, hit positions and placed objects
/// projected onto a downscaled copy of the viewport.
pub struct Overlay {
    buffer: RgbImage,
    scale: f64,
}

impl Overlay {
    /// `scale` is the number of view points per image pixel.
    pub fn new(projection: &impl ScreenProjection, scale: u32) -> Self {
        let scale = scale.max(1);
        let viewport = projection.viewport();
        let width = ((viewport.width / scale as f64).ceil() as u32).max(1);
        let height = ((viewport.height / scale as f64).ceil() as u32).max(1);
        Self {
            buffer: ImageBuffer::from_pixel(width, height, BACKGROUND),
            scale: scale as f64,
        }
    }

    fn plot(
        &mut self,
        projection: &impl ScreenProjection,
        world: Vec3,
        color: Rgb<u8>,
        radius: i64,
    ) {
        if !projection.is_visible(world) {
            return;
        }
        let Some(screen) = projection.project(world) else {
            return;
        };
        let cx = (screen.x / self.scale) as i64;
        let cy = (screen.y / self.scale) as i64;
        for y in cy - radius..=cy + radius {
            for x in cx - radius..=cx + radius {
                if x >= 0
                    && y >= 0
                    && (x as u32) < self.buffer.width()
                    && (y as u32) < self.buffer.height()
                {
                    self.buffer.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    pub fn draw_cloud(&mut self, projection: &impl ScreenProjection, cloud: &FeatureCloud) {
        for point in cloud.iter() {
            self.plot(projection, *point, FEATURE, 0);
        }
    }

    pub fn draw_hit(&mut self, projection: &impl ScreenProjection, position: Vec3) {
        self.plot(projection, position, HIT, 2);
    }

    pub fn draw_object(&mut self, projection: &impl ScreenProjection, position: Vec3) {
        self.plot(projection, position, OBJECT, 3);
    }

    pub fn image(&self) -> &RgbImage {
        &self.buffer
    }

    pub fn save(&self, path: &str) -> image::ImageResult<()> {
        self.buffer.save(path)
    }
}
