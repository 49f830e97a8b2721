//! Transform and guard-band clipping.
//!
//! The rasterizer addresses a region much larger than the viewport, so
//! instead of clipping polygons against the view frustum the pipeline only
//! tests whether each vertex lands inside that larger *guard band*. Triangles
//! with any vertex outside it are dropped whole; nothing is re-triangulated.
//!
//! This means a very large triangle that is mostly on screen can vanish when
//! one of its corners leaves the guard band. That is a known limitation of
//! the approach and is kept as is.

use crate::graphics::math::{Matrix, Vec3, Vec4};

/// Viewport in the form the finish stage consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Half extents, from integer halves of the size.
    pub hwidth: f32,
    pub hheight: f32,
}

impl Viewport {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            hwidth: (width / 2) as f32,
            hheight: (height / 2) as f32,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0, 0, 640, 448)
    }
}

/// Screen-relative position after perspective divide, before any
/// hardware-specific fixed-point conversion. `x`/`y` are in pixels from the
/// viewport centre (y up), `z` is normalised depth in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub inv_w: f32,
}

#[inline]
pub fn transform(mvp: &Matrix, position: Vec3) -> Vec4 {
    mvp.transform_point(position)
}

/// Guard-band acceptance region for one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardBand {
    x_scale: f32,
    y_scale: f32,
}

impl GuardBand {
    /// `extent` is the half size of the addressable region in pixels.
    pub fn new(viewport: &Viewport, extent: f32) -> Self {
        Self {
            x_scale: viewport.hwidth / extent,
            y_scale: viewport.hheight / extent,
        }
    }

    /// `X/W * hwidth <= extent` rearranges to `X * (hwidth / extent) <= W`,
    /// so X/Y are rescaled and compared against `w` directly. X/Y must be
    /// strictly inside; Z may touch the planes.
    #[inline]
    pub fn contains(&self, c: Vec4) -> bool {
        let x = c.x * self.x_scale;
        let y = c.y * self.y_scale;
        x > -c.w && x < c.w && y > -c.w && y < c.w && c.z >= -c.w && c.z <= c.w
    }

    #[inline]
    pub fn contains_all(&self, coords: [Vec4; 3]) -> bool {
        coords.iter().all(|c| self.contains(*c))
    }
}

/// Perspective divide and scale to viewport half extents.
#[inline]
pub fn project(viewport: &Viewport, c: Vec4) -> Projected {
    let inv_w = 1.0 / c.w;
    Projected {
        x: viewport.hwidth * (c.x * inv_w),
        y: viewport.hheight * (c.y * inv_w),
        z: c.z * inv_w,
        inv_w,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_band_is_wider_than_viewport() {
        let vp = Viewport::new(0, 0, 640, 448);
        let band = GuardBand::new(&vp, 2048.0);
        // Just off screen in NDC terms, still inside the guard band.
        assert!(band.contains(Vec4::new(1.5, -1.5, 0.0, 1.0)));
        // 2048 / 320 = 6.4 NDC units is the edge.
        assert!(band.contains(Vec4::new(6.3, 0.0, 0.0, 1.0)));
        assert!(!band.contains(Vec4::new(6.5, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn depth_is_inclusive_xy_exclusive() {
        let vp = Viewport::new(0, 0, 4096, 4096);
        let band = GuardBand::new(&vp, 2048.0);
        assert!(band.contains(Vec4::new(0.0, 0.0, 1.0, 1.0)));
        assert!(band.contains(Vec4::new(0.0, 0.0, -1.0, 1.0)));
        assert!(!band.contains(Vec4::new(0.0, 0.0, 1.01, 1.0)));
        assert!(!band.contains(Vec4::new(1.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn behind_camera_is_rejected() {
        let vp = Viewport::default();
        let band = GuardBand::new(&vp, 2048.0);
        assert!(!band.contains(Vec4::new(0.0, 0.0, 0.0, -1.0)));
    }

    #[test]
    fn one_failing_vertex_rejects_triangle() {
        let vp = Viewport::default();
        let band = GuardBand::new(&vp, 2048.0);
        let inside = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let outside = Vec4::new(100.0, 0.0, 0.0, 1.0);
        assert!(band.contains_all([inside, inside, inside]));
        assert!(!band.contains_all([inside, outside, inside]));
    }

    #[test]
    fn project_scales_to_half_extents() {
        let vp = Viewport::new(0, 0, 800, 600);
        let p = project(&vp, Vec4::new(1.0, -0.5, 0.25, 2.0));
        assert_eq!(p.x, 200.0);
        assert_eq!(p.y, -75.0);
        assert_eq!(p.z, 0.125);
        assert_eq!(p.inv_w, 0.5);
    }
}
