//! Render state snapshot and deferred register-group tracking
//!
//! Setters only record the new value and mark their register group dirty.
//! The draw path calls `take_dirty` right before emitting geometry and writes
//! at most one packet per group, however many times the flags flipped.

use crate::graphics::vertex::VertexFormat;

/// Scissor rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorMask {
    pub const ALL: ColorMask = ColorMask {
        r: true,
        g: true,
        b: true,
        a: true,
    };
    pub const NONE: ColorMask = ColorMask {
        r: false,
        g: false,
        b: false,
        a: false,
    };
}

impl Default for ColorMask {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub alpha_test: bool,
    pub blend: bool,
    pub face_culling: bool,
    pub color_mask: ColorMask,
    pub scissor: Rect,
    pub format: VertexFormat,
    /// A texture is bound (anything other than the default white one counts).
    pub texturing: bool,
    pub clear_color: u32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: false,
            alpha_test: false,
            blend: false,
            face_culling: false,
            color_mask: ColorMask::ALL,
            scissor: Rect::new(0, 0, 640, 448),
            format: VertexFormat::Coloured,
            texturing: false,
            clear_color: 0,
        }
    }
}

/// Register groups that still need to be written before the next draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirtyGroups {
    /// Test/compare group: depth test, alpha test.
    pub state: bool,
    /// Primitive format group: vertex format, blending.
    pub format: bool,
}

impl DirtyGroups {
    pub fn any(&self) -> bool {
        self.state || self.format
    }
}

#[derive(Debug, Clone)]
pub struct StateTracker {
    current: RenderState,
    dirty: DirtyGroups,
}

impl StateTracker {
    /// Both groups start dirty so the first draw establishes them.
    pub fn new() -> Self {
        Self {
            current: RenderState::default(),
            dirty: DirtyGroups {
                state: true,
                format: true,
            },
        }
    }

    pub fn current(&self) -> &RenderState {
        &self.current
    }

    pub fn dirty(&self) -> DirtyGroups {
        self.dirty
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.current.depth_test = enabled;
        self.dirty.state = true;
    }

    pub fn set_alpha_test(&mut self, enabled: bool) {
        self.current.alpha_test = enabled;
        self.dirty.state = true;
    }

    pub fn set_blend(&mut self, enabled: bool) {
        self.current.blend = enabled;
        self.dirty.format = true;
    }

    pub fn set_vertex_format(&mut self, format: VertexFormat) {
        self.current.format = format;
        self.dirty.format = true;
    }

    /// Texture enable is part of the primitive word.
    pub fn set_texturing(&mut self, enabled: bool) {
        if self.current.texturing != enabled {
            self.current.texturing = enabled;
            self.dirty.format = true;
        }
    }

    /// Culling is folded into the format group on targets that encode it in
    /// the polygon header.
    pub fn set_face_culling(&mut self, enabled: bool) {
        self.current.face_culling = enabled;
        self.dirty.format = true;
    }

    // Written straight into the command stream by the caller; recorded here
    // so later packets (clears, headers) see them.

    pub fn record_depth_write(&mut self, enabled: bool) {
        self.current.depth_write = enabled;
    }

    pub fn record_color_mask(&mut self, mask: ColorMask) {
        self.current.color_mask = mask;
    }

    pub fn record_scissor(&mut self, rect: Rect) {
        self.current.scissor = rect;
    }

    pub fn record_clear_color(&mut self, col: u32) {
        self.current.clear_color = col;
    }

    /// Mark a group dirty because something else clobbered its registers.
    pub fn invalidate(&mut self, groups: DirtyGroups) {
        self.dirty.state |= groups.state;
        self.dirty.format |= groups.format;
    }

    /// Return the dirty groups and mark both clean.
    pub fn take_dirty(&mut self) -> DirtyGroups {
        std::mem::take(&mut self.dirty)
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_fully_dirty() {
        let mut t = StateTracker::new();
        assert_eq!(
            t.take_dirty(),
            DirtyGroups {
                state: true,
                format: true
            }
        );
        assert!(!t.dirty().any());
    }

    #[test]
    fn toggles_coalesce_per_group() {
        let mut t = StateTracker::new();
        t.take_dirty();
        t.set_depth_test(true);
        t.set_depth_test(false);
        t.set_alpha_test(true);
        t.set_depth_test(true);
        let dirty = t.take_dirty();
        assert!(dirty.state);
        assert!(!dirty.format);
        assert!(t.current().depth_test);
        assert!(t.current().alpha_test);
    }

    #[test]
    fn format_group_is_independent() {
        let mut t = StateTracker::new();
        t.take_dirty();
        t.set_blend(true);
        t.set_vertex_format(VertexFormat::Textured);
        let dirty = t.take_dirty();
        assert!(dirty.format);
        assert!(!dirty.state);
    }

    #[test]
    fn texturing_only_dirties_on_change() {
        let mut t = StateTracker::new();
        t.take_dirty();
        t.set_texturing(false);
        assert!(!t.dirty().any());
        t.set_texturing(true);
        assert!(t.dirty().format);
    }

    #[test]
    fn recorded_writes_do_not_dirty() {
        let mut t = StateTracker::new();
        t.take_dirty();
        t.record_depth_write(true);
        t.record_color_mask(ColorMask::NONE);
        t.record_scissor(Rect::new(1, 2, 3, 4));
        assert!(!t.dirty().any());
        assert_eq!(t.current().scissor, Rect::new(1, 2, 3, 4));
    }
}
