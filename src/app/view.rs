use std::collections::HashSet;

use eframe::egui::{self, Align2, Color32, CornerRadius, FontId, Sense, Shape, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::NodeKind;
use crate::util::trimmed_label;

use super::ViewModel;
use super::render_utils::{
    blend_color, circle_visible, dim_color, draw_arrow_head, draw_background, node_fill,
    node_radius, world_to_screen,
};

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const HOVER_COLOR: Color32 = Color32::from_rgb(255, 164, 101);
const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

impl ViewModel {
    fn search_matches(&self) -> Option<HashSet<usize>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let matcher = SkimMatcherV2::default();
        Some(
            self.controller
                .nodes()
                .iter()
                .enumerate()
                .filter_map(|(index, node)| {
                    matcher.fuzzy_match(&node.label, query).map(|_| index)
                })
                .collect(),
        )
    }

    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.controller.view());

        self.handle_zoom(ui, rect, &response);
        self.handle_pan(&response);

        let dt = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let active = self.controller.advance(dt);
        if active || response.dragged() {
            ui.ctx().request_repaint();
        }

        let matches = self.search_matches();
        let selected_index = self.controller.selected_index();
        let view = self.controller.view();
        let scale = view.scale();
        let nodes = self.controller.nodes();

        if nodes.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes in the current graph.",
                FontId::proportional(14.0),
                Color32::from_gray(180),
            );
            return;
        }

        let mut screen_positions = Vec::with_capacity(nodes.len());
        let mut screen_radii = Vec::with_capacity(nodes.len());
        for node in nodes {
            screen_positions.push(world_to_screen(rect, view, node.position));
            screen_radii.push(node_radius(node.kind, scale));
        }

        let hovered = Self::hovered_index(ui, &screen_positions, &screen_radii);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        // Interactions are resolved before drawing and applied after, so the
        // frame renders the state it was hit-tested against.
        let mut pending_focus = None;
        let mut pending_select = None;
        if response.double_clicked() {
            if let Some(index) = hovered {
                pending_focus = Some(nodes[index].id.clone());
            }
        } else if response.clicked() {
            pending_select = Some(hovered.map(|index| nodes[index].id.clone()));
        }

        let selection_active = selected_index.is_some();
        let edges = self.controller.edges();
        for edge in edges {
            let start = screen_positions[edge.source];
            let end = screen_positions[edge.target];
            let span = end - start;
            let length = span.length();
            if length <= f32::EPSILON {
                continue;
            }
            let direction = span / length;

            let incident = selected_index
                .is_some_and(|selected| edge.source == selected || edge.target == selected);
            let (width, color) = if incident {
                ((2.2 * scale.sqrt()).clamp(1.2, 4.0), SELECTED_COLOR)
            } else if selection_active {
                (
                    (1.1 * scale.sqrt()).clamp(0.5, 2.2),
                    Color32::from_rgba_unmultiplied(80, 90, 104, 140),
                )
            } else {
                (
                    (1.4 * scale.sqrt()).clamp(0.7, 3.0),
                    Color32::from_rgba_unmultiplied(118, 128, 140, 200),
                )
            };
            let stroke = Stroke::new(width, color);

            if edge.relation.is_directed() {
                // Stop at the target's rim so the arrowhead stays readable.
                let tip = end - direction * (screen_radii[edge.target] + 2.0);
                painter.line_segment([start, tip], stroke);
                draw_arrow_head(&painter, tip, direction, (7.0 * scale.sqrt()).clamp(4.0, 11.0), stroke);
            } else {
                painter.extend(Shape::dashed_line(&[start, end], stroke, 6.0, 5.0));
            }
        }

        let match_active = matches.as_ref().is_some_and(|set| !set.is_empty());
        for (index, node) in nodes.iter().enumerate() {
            let position = screen_positions[index];
            let radius = screen_radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let is_selected = selected_index == Some(index);
            let is_hovered = hovered == Some(index);
            let is_match = matches.as_ref().is_some_and(|set| set.contains(&index));

            let base = node_fill(node.kind);
            let color = if is_selected {
                blend_color(base, SELECTED_COLOR, 0.75)
            } else if is_hovered {
                blend_color(base, HOVER_COLOR, 0.55)
            } else if is_match {
                blend_color(base, MATCH_COLOR, 0.60)
            } else if selection_active || match_active {
                dim_color(base, 0.50)
            } else {
                base
            };

            let outline = Stroke::new(
                if is_selected { 2.0 } else { 1.0 },
                Color32::from_rgba_unmultiplied(15, 15, 15, 190),
            );

            match node.kind {
                NodeKind::Concept => {
                    painter.circle_filled(position, radius, color);
                    painter.circle_stroke(position, radius, outline);
                }
                NodeKind::Note => {
                    let square =
                        egui::Rect::from_center_size(position, vec2(radius * 1.8, radius * 1.8));
                    painter.rect_filled(square, CornerRadius::same(3), color);
                    painter.rect_stroke(square, CornerRadius::same(3), outline, egui::StrokeKind::Outside);
                }
            }

            if is_selected {
                painter.circle_stroke(
                    position,
                    radius + 5.0,
                    Stroke::new(1.6, Color32::from_rgba_unmultiplied(245, 206, 93, 160)),
                );
            }

            let show_label = is_selected || is_hovered || is_match || scale > 1.1;
            if show_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    trimmed_label(&node.label, 28),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if let Some(index) = hovered {
            let node = &nodes[index];
            let neighbor_count = self.controller.graph().neighbors(index).count();
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!(
                    "{}  |  {}  |  {} linked",
                    trimmed_label(&node.label, 48),
                    node.kind.label(),
                    neighbor_count
                ),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if let Some(id) = pending_focus {
            self.controller.focus(&id);
            ui.ctx().request_repaint();
        } else if let Some(selection) = pending_select {
            self.controller.select(selection.as_deref());
        }
    }
}
