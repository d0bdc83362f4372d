use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::graph::NodeKind;
use crate::layout::ViewTransform;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, view: &ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * view.scale().clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + view.offset();

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn world_to_screen(rect: Rect, view: &ViewTransform, world: Vec2) -> Pos2 {
    rect.center() + view.offset() + world * view.scale()
}

pub(super) fn screen_to_world(rect: Rect, view: &ViewTransform, screen: Pos2) -> Vec2 {
    (screen - rect.center() - view.offset()) / view.scale()
}

pub(super) fn node_fill(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Concept => Color32::from_rgb(92, 156, 230),
        NodeKind::Note => Color32::from_rgb(222, 178, 96),
    }
}

pub(super) fn node_radius(kind: NodeKind, scale: f32) -> f32 {
    let base = match kind {
        NodeKind::Concept => 12.0,
        NodeKind::Note => 8.0,
    };
    (base * scale.powf(0.40)).clamp(3.0, 30.0)
}

/// Two short strokes forming an arrowhead at `tip`, pointing along
/// `direction` (unit vector from source toward target).
pub(super) fn draw_arrow_head(
    painter: &Painter,
    tip: Pos2,
    direction: Vec2,
    size: f32,
    stroke: Stroke,
) {
    let left = Vec2::new(
        -direction.x * 0.866 + direction.y * 0.5,
        -direction.y * 0.866 - direction.x * 0.5,
    );
    let right = Vec2::new(
        -direction.x * 0.866 - direction.y * 0.5,
        -direction.y * 0.866 + direction.x * 0.5,
    );

    painter.line_segment([tip, tip + left * size], stroke);
    painter.line_segment([tip, tip + right * size], stroke);
}
