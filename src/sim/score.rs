//! Trick scoring

use serde::{Deserialize, Serialize};

use super::events::GameMessage;
use crate::config::ScoringConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    config: ScoringConfig,
    pub score: u64,
    pub total_flips: u32,
    pub clean_landings: u32,
}

impl Scoreboard {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Points for a flip finished mid-air; returns the new score
    pub fn award_flip(&mut self) -> u64 {
        self.total_flips += 1;
        self.score = self.score.saturating_add(self.config.flip_points);
        self.score
    }

    /// Apply a landing. Only validated landings after at least one flip pay
    /// out; returns the new score if it changed.
    pub fn award_landing(&mut self, alignment: Option<f32>, flips: u32) -> Option<u64> {
        if alignment.is_none() || flips == 0 {
            return None;
        }
        self.clean_landings += 1;
        let bonus = self.config.clean_landing_points.saturating_mul(u64::from(flips));
        self.score = self.score.saturating_add(bonus);
        Some(self.score)
    }

    /// Feed a published message; returns the new score if it changed
    pub fn observe(&mut self, message: &GameMessage) -> Option<u64> {
        match *message {
            GameMessage::PlayerLanded { alignment, flips } => self.award_landing(alignment, flips),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.total_flips = 0;
        self.clean_landings = 0;
    }
}
