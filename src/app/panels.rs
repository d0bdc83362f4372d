use std::sync::Arc;

use eframe::egui::{self, Align, Context, Layout, Slider, Ui};

use crate::graph::{GraphSnapshot, GraphSource, NodeKind};
use crate::layout::{LayoutController, SimState};
use crate::util::trimmed_label;

use super::ViewModel;

impl ViewModel {
    pub(super) fn new(source: Arc<dyn GraphSource>, snapshot: GraphSnapshot) -> Self {
        let mut controller = LayoutController::new(source);
        controller.load(snapshot);
        controller.start_simulation();

        Self {
            controller,
            search: String::new(),
        }
    }

    pub(super) fn show(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("notegraph");
                    ui.separator();
                    ui.label(format!("source: {}", self.controller.source_description()));
                    ui.label(format!("nodes: {}", self.controller.nodes().len()));
                    ui.label(format!("edges: {}", self.controller.edges().len()));

                    let refresh_button = ui.add_enabled(
                        !self.controller.is_fetching(),
                        egui::Button::new("Refresh"),
                    );
                    if refresh_button.clicked() {
                        self.controller.refresh();
                    }
                    if self.controller.is_fetching() {
                        ui.spinner();
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        match self.controller.sim_state() {
                            SimState::Running => ui.label(format!(
                                "layout: running ({:.2})",
                                self.controller.simulation().last_movement()
                            )),
                            SimState::Idle => ui.label("layout: settled"),
                        };
                    });
                });

                if let Some(error) = self.controller.fetch_error().map(str::to_owned) {
                    ui.horizontal(|ui| {
                        ui.colored_label(
                            egui::Color32::from_rgb(235, 110, 100),
                            format!("refresh failed, showing last-good graph: {error}"),
                        );
                        if ui.small_button("Dismiss").clicked() {
                            self.controller.clear_fetch_error();
                        }
                    });
                }
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search notes and concepts");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Fuzzy-highlight matching nodes on the canvas.");

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui.button("Reset view").clicked() {
                self.controller.reset();
            }
            if ui.button("Re-run layout").clicked() {
                self.controller.reseed();
                self.controller.start_simulation();
            }
            match self.controller.sim_state() {
                SimState::Running => {
                    if ui.button("Pause").clicked() {
                        self.controller.stop_simulation();
                    }
                }
                SimState::Idle => {
                    if ui.button("Resume").clicked() {
                        self.controller.start_simulation();
                    }
                }
            }
        });

        ui.separator();
        ui.collapsing("Layout tuning", |ui| {
            let mut nudged = false;
            let params = self.controller.simulation_mut().params_mut();

            nudged |= ui
                .add(
                    Slider::new(&mut params.repulsion_strength, 500.0..=20_000.0)
                        .logarithmic(true)
                        .text("Repulsion"),
                )
                .on_hover_text("How strongly nodes push away from each other.")
                .changed();
            nudged |= ui
                .add(
                    Slider::new(&mut params.attraction_strength, 0.001..=0.1)
                        .logarithmic(true)
                        .text("Edge spring"),
                )
                .on_hover_text("How strongly related nodes pull toward their rest distance.")
                .changed();
            nudged |= ui
                .add(Slider::new(&mut params.min_distance, 40.0..=300.0).text("Spacing"))
                .on_hover_text("Base spacing; edges rest at 1.5x this distance.")
                .changed();
            nudged |= ui
                .add(Slider::new(&mut params.center_strength, 0.0..=0.02).text("Center pull"))
                .on_hover_text("Weak gravity keeping disconnected clusters on canvas.")
                .changed();

            // A settled layout needs a kick to react to new parameters.
            if nudged {
                self.controller.start_simulation();
            }
        });

        ui.separator();
        self.draw_selection_details(ui);
    }

    fn draw_selection_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection");
        ui.add_space(4.0);

        let Some(index) = self.controller.selected_index() else {
            ui.label("Click a node to select it; double-click to focus.");
            return;
        };

        let graph = self.controller.graph();
        let node = &graph.nodes()[index];
        let id = node.id.clone();
        let kind = node.kind;

        ui.label(trimmed_label(&node.label, 60));
        ui.label(format!("kind: {}", kind.label()));

        let neighbors = graph
            .neighbors(index)
            .map(|(other, relation)| {
                (
                    graph.nodes()[other].id.clone(),
                    graph.nodes()[other].label.clone(),
                    relation,
                )
            })
            .collect::<Vec<_>>();

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if kind == NodeKind::Concept && ui.button("Focus").clicked() {
                self.controller.focus(&id);
            }
            if ui.button("Clear").clicked() {
                self.controller.select(None);
            }
        });

        ui.add_space(6.0);
        ui.label(format!("linked ({}):", neighbors.len()));
        egui::ScrollArea::vertical()
            .max_height(240.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (other_id, other_label, relation) in neighbors {
                    ui.horizontal(|ui| {
                        if ui
                            .selectable_label(false, trimmed_label(&other_label, 30))
                            .clicked()
                        {
                            self.controller.select(Some(&other_id));
                        }
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            ui.weak(relation.label());
                        });
                    });
                }
            });
    }
}
