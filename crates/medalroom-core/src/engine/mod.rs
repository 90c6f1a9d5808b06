mod points;
mod state;

pub use points::PointsEngine;
pub use state::EngineState;
