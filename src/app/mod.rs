use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

use eframe::egui::{self, Context};

use crate::graph::{FetchResult, GraphSource, spawn_fetch};
use crate::layout::LayoutController;

mod interaction;
mod panels;
mod render_utils;
mod view;

pub struct NoteGraphApp {
    source: Arc<dyn GraphSource>,
    state: AppState,
}

enum AppState {
    Loading { rx: Receiver<FetchResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    controller: LayoutController,
    search: String,
}

impl NoteGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, source: Arc<dyn GraphSource>) -> Self {
        let state = Self::start_load(&source);
        Self { source, state }
    }

    fn start_load(source: &Arc<dyn GraphSource>) -> AppState {
        let source = Arc::clone(source);
        AppState::Loading {
            rx: spawn_fetch(move || source.fetch_graph()),
        }
    }
}

impl eframe::App for NoteGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(snapshot)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            Arc::clone(&self.source),
                            snapshot,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("graph fetch worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading knowledge graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint();
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the knowledge graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(&self.source));
                    }
                });
            }
            AppState::Ready(model) => {
                model.show(ctx);
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
