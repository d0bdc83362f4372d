use eframe::egui::Vec2;

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;

/// Per-second exponential approach rate for focus animations.
const ANIMATION_RATE: f32 = 8.0;
const SCALE_SNAP: f32 = 0.001;
const OFFSET_SNAP: f32 = 0.5;

#[derive(Clone, Copy, Debug)]
struct ViewTarget {
    scale: f32,
    offset: Vec2,
}

/// Render-time scale/offset, driven by gestures and the focus/reset actions.
/// Composed with raw node positions at draw time only; the physics never
/// reads or writes it.
#[derive(Debug)]
pub struct ViewTransform {
    scale: f32,
    offset: Vec2,
    target: Option<ViewTarget>,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            target: None,
        }
    }
}

impl ViewTransform {
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Pinch/scroll zoom; clamped on every update. A gesture takes over from
    /// any running animation.
    pub fn zoom_by(&mut self, factor: f32) {
        self.target = None;
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Drag deltas accumulate additively.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.target = None;
        self.offset += delta;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn animate_to(&mut self, scale: f32, offset: Vec2) {
        self.target = Some(ViewTarget {
            scale: scale.clamp(MIN_SCALE, MAX_SCALE),
            offset,
        });
    }

    pub fn is_animating(&self) -> bool {
        self.target.is_some()
    }

    /// Advances the focus animation; returns whether it is still in flight.
    pub fn advance(&mut self, dt: f32) -> bool {
        let Some(target) = self.target else {
            return false;
        };

        let blend = 1.0 - (-ANIMATION_RATE * dt.max(0.0)).exp();
        self.scale += (target.scale - self.scale) * blend;
        self.offset += (target.offset - self.offset) * blend;

        if (target.scale - self.scale).abs() < SCALE_SNAP
            && (target.offset - self.offset).length() < OFFSET_SNAP
        {
            self.scale = target.scale;
            self.offset = target.offset;
            self.target = None;
        }
        self.target.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::vec2;

    #[test]
    fn zoom_is_clamped_both_ways() {
        let mut view = ViewTransform::default();
        view.zoom_by(10.0);
        assert_eq!(view.scale(), MAX_SCALE);

        view.reset();
        view.zoom_by(0.01);
        assert_eq!(view.scale(), MIN_SCALE);
    }

    #[test]
    fn pan_accumulates_additively() {
        let mut view = ViewTransform::default();
        view.pan_by(vec2(10.0, -4.0));
        view.pan_by(vec2(-3.0, 1.0));
        assert_eq!(view.offset(), vec2(7.0, -3.0));
    }

    #[test]
    fn reset_restores_identity() {
        let mut view = ViewTransform::default();
        view.zoom_by(2.0);
        view.pan_by(vec2(50.0, 50.0));
        view.animate_to(1.5, vec2(9.0, 9.0));

        view.reset();
        assert_eq!(view.scale(), 1.0);
        assert_eq!(view.offset(), Vec2::ZERO);
        assert!(!view.is_animating());
    }

    #[test]
    fn animation_reaches_its_target_and_stops() {
        let mut view = ViewTransform::default();
        view.animate_to(1.5, vec2(-80.0, 40.0));

        let mut frames = 0;
        while view.advance(1.0 / 60.0) {
            frames += 1;
            assert!(frames < 600, "animation failed to settle");
        }

        assert_eq!(view.scale(), 1.5);
        assert_eq!(view.offset(), vec2(-80.0, 40.0));
        assert!(!view.is_animating());
    }

    #[test]
    fn gestures_cancel_a_running_animation() {
        let mut view = ViewTransform::default();
        view.animate_to(3.0, vec2(100.0, 0.0));
        view.advance(1.0 / 60.0);

        view.pan_by(vec2(1.0, 0.0));
        assert!(!view.is_animating());
        assert!(!view.advance(1.0 / 60.0));
    }

    #[test]
    fn animation_target_scale_is_clamped() {
        let mut view = ViewTransform::default();
        view.animate_to(12.0, Vec2::ZERO);
        while view.advance(0.1) {}
        assert_eq!(view.scale(), MAX_SCALE);
    }
}
