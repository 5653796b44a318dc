//! Per-bar portfolio trajectory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PositionState;

/// Portfolio state at the close of one bar, after that bar's transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub position: PositionState,
    pub cash: f64,
    pub shares: f64,
    pub holdings_value: f64,
    /// cash + holdings_value
    pub equity: f64,
    /// equity / running peak - 1, always <= 0
    pub drawdown: f64,
}

/// One point per price bar, in date order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortfolioTrajectory {
    pub points: Vec<TrajectoryPoint>,
}

impl PortfolioTrajectory {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            points: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, point: TrajectoryPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    pub fn equity_curve(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    pub fn drawdown_curve(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.drawdown).collect()
    }

    /// Number of bars that closed with a long position.
    pub fn bars_long(&self) -> usize {
        self.points.iter().filter(|p| p.position.is_long()).count()
    }
}
