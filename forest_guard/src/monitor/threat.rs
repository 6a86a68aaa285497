use serde::Deserialize;

pub const DEFAULT_INTRUSION_BONUS: f64 = 30.0;
pub const DEFAULT_ALERT_THRESHOLD: f64 = 50.0;

/// How a change percentage and an intrusion flag combine into a threat score.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThreatPolicy {
    /// Points added to the score while an intrusion is active.
    pub intrusion_bonus: f64,
    /// Scores at or above this raise an alert.
    pub alert_threshold: f64,
}

impl Default for ThreatPolicy {
    fn default() -> Self {
        Self {
            intrusion_bonus: DEFAULT_INTRUSION_BONUS,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreatAssessment {
    pub change_percent: f64,
    pub intrusion: bool,
    /// `change_percent` plus the intrusion bonus when applicable. Not capped at 100.
    pub score: f64,
    pub alert: bool,
}

impl ThreatPolicy {
    pub fn score(&self, change_percent: f64, intrusion: bool) -> f64 {
        change_percent + if intrusion { self.intrusion_bonus } else { 0.0 }
    }

    pub fn assess(&self, change_percent: f64, intrusion: bool) -> ThreatAssessment {
        let score = self.score(change_percent, intrusion);
        ThreatAssessment {
            change_percent,
            intrusion,
            score,
            alert: score >= self.alert_threshold,
        }
    }
}
