//! Aggregate statistics over a user's prediction history.

use crate::models::{RiskFactor, RiskVector};
use serde::{Deserialize, Serialize};

/// Number of predictions in each trend window.
const TREND_WINDOW: usize = 7;

/// Difference in mean overall score that counts as a trend.
const TREND_MARGIN: f64 = 5.0;

/// Factor scores above this count towards `top_risks`.
const TOP_RISK_THRESHOLD: u8 = 60;

/// Direction of recent risk relative to the preceding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Recent predictions are riskier.
    Increasing,
    /// Recent predictions are safer.
    Decreasing,
    /// No meaningful change, or not enough history.
    #[default]
    Stable,
}

/// Summary of a prediction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionStats {
    /// Rounded mean overall score.
    pub average_risk: u8,
    /// Recent direction.
    pub trend: Trend,
    /// Up to three factors most often above 60, most frequent first.
    pub top_risks: Vec<RiskFactor>,
    /// Number of predictions summarized.
    pub total_predictions: usize,
}

fn mean_overall(window: &[RiskVector]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let sum: f64 = window.iter().map(|r| f64::from(r.overall)).sum();
    #[allow(clippy::cast_precision_loss)]
    let len = window.len() as f64;
    sum / len
}

impl PredictionStats {
    /// Summarizes a history ordered newest first.
    ///
    /// The trend compares the newest seven predictions with the seven before
    /// them. Without any older predictions the trend is stable: seven or
    /// fewer entries never count as increasing against an empty (zero) window.
    #[must_use]
    pub fn from_history(history: &[RiskVector]) -> Self {
        if history.is_empty() {
            return Self {
                average_risk: 0,
                trend: Trend::Stable,
                top_risks: Vec::new(),
                total_predictions: 0,
            };
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let average_risk = mean_overall(history).round().clamp(0.0, 100.0) as u8;

        let recent = &history[..history.len().min(TREND_WINDOW)];
        let older = history
            .get(TREND_WINDOW..history.len().min(TREND_WINDOW * 2))
            .unwrap_or_default();
        let trend = if older.is_empty() {
            Trend::Stable
        } else {
            let (recent_avg, older_avg) = (mean_overall(recent), mean_overall(older));
            if recent_avg > older_avg + TREND_MARGIN {
                Trend::Increasing
            } else if recent_avg < older_avg - TREND_MARGIN {
                Trend::Decreasing
            } else {
                Trend::Stable
            }
        };

        let mut counts: Vec<(RiskFactor, usize)> = RiskFactor::ALL
            .iter()
            .map(|&factor| {
                let count = history
                    .iter()
                    .filter(|r| r.get(factor) > TOP_RISK_THRESHOLD)
                    .count();
                (factor, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();
        // Stable sort keeps display order between equal counts.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        let top_risks = counts.into_iter().take(3).map(|(factor, _)| factor).collect();

        Self {
            average_risk,
            trend,
            top_risks,
            total_predictions: history.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overall_only(overall: u8) -> RiskVector {
        RiskVector {
            overall,
            heatwave: 0,
            air_quality: 0,
            uv_exposure: 0,
            disease: 0,
        }
    }

    #[test]
    fn test_empty_history() {
        let stats = PredictionStats::from_history(&[]);
        assert_eq!(stats.average_risk, 0);
        assert_eq!(stats.trend, Trend::Stable);
        assert!(stats.top_risks.is_empty());
        assert_eq!(stats.total_predictions, 0);
    }

    #[test]
    fn test_increasing_trend() {
        let mut history = vec![overall_only(70); 7];
        history.extend(vec![overall_only(50); 7]);
        let stats = PredictionStats::from_history(&history);
        assert_eq!(stats.trend, Trend::Increasing);
        assert_eq!(stats.average_risk, 60);
    }

    #[test]
    fn test_decreasing_trend() {
        let mut history = vec![overall_only(40); 7];
        history.extend(vec![overall_only(46); 3]);
        assert_eq!(PredictionStats::from_history(&history).trend, Trend::Decreasing);
    }

    #[test]
    fn test_margin_is_exclusive() {
        let mut history = vec![overall_only(55); 7];
        history.extend(vec![overall_only(50); 7]);
        assert_eq!(PredictionStats::from_history(&history).trend, Trend::Stable);
    }

    #[test]
    fn test_short_history_is_stable() {
        let history = vec![overall_only(90); 5];
        assert_eq!(PredictionStats::from_history(&history).trend, Trend::Stable);
    }

    #[test]
    fn test_top_risks_ranked_by_count() {
        let history = vec![
            RiskVector::from_factors(80, 90, 10, 61),
            RiskVector::from_factors(10, 90, 10, 61),
            RiskVector::from_factors(10, 90, 65, 61),
            RiskVector::from_factors(10, 10, 60, 10),
        ];
        let stats = PredictionStats::from_history(&history);
        assert_eq!(
            stats.top_risks,
            vec![RiskFactor::AirQuality, RiskFactor::Disease, RiskFactor::Heatwave]
        );
        assert_eq!(stats.total_predictions, 4);
    }

    #[test]
    fn test_wire_format() {
        let stats = PredictionStats::from_history(&[RiskVector::from_factors(70, 10, 10, 10)]);
        let json = serde_json::to_value(&stats).expect("serializes");
        assert_eq!(json["trend"], "stable");
        assert_eq!(json["topRisks"][0], "heatwave");
        assert_eq!(json["totalPredictions"], 1);
    }
}
