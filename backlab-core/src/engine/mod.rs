//! Portfolio simulation: prices + signals + cost assumptions → trajectory.

pub mod simulator;
pub mod trajectory;

pub use simulator::{simulate, BacktestParams, SimulationError, SimulationResult};
pub use trajectory::{PortfolioTrajectory, TrajectoryPoint};
