use eframe::egui::{self, Pos2, Rect, Ui};

use super::ViewModel;
use super::render_utils::{screen_to_world, world_to_screen};

impl ViewModel {
    /// Scroll-wheel zoom anchored at the pointer: the world point under the
    /// cursor stays put. The transform clamps the scale itself.
    pub(super) fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let view = self.controller.view();
        let world_before = screen_to_world(rect, view, pointer);

        let factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.controller.view_mut().zoom_by(factor);

        let view = self.controller.view();
        let drift = pointer - world_to_screen(rect, view, world_before);
        self.controller.view_mut().pan_by(drift);
    }

    pub(super) fn handle_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Primary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.controller.view_mut().pan_by(response.drag_delta());
        }
    }

    pub(super) fn hovered_index(
        ui: &Ui,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        screen_positions
            .iter()
            .zip(screen_radii)
            .enumerate()
            .filter_map(|(index, (position, radius))| {
                let distance = position.distance(pointer);
                (distance <= radius + 2.0).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}
