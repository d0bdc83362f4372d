mod controller;
mod forces;
mod simulation;
mod view;

pub use controller::LayoutController;
pub use forces::ForceParams;
pub use simulation::{SimState, Simulation};
pub use view::ViewTransform;
