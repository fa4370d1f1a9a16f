use itertools::Itertools;

use crate::policy::Condition;
use crate::record::TrialRecord;

/// Aggregate view of one block, for the diagnostic log.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSummary {
    pub trials: usize,
    pub control: usize,
    pub errors_inserted: usize,
    pub errors_rectified: usize,
    /// Percentage of keypresses that matched the expected key.
    pub accuracy: f64,
    pub mean_response_ms: f64,
    pub std_dev_response_ms: f64,
}

impl BlockSummary {
    pub fn from_records(records: &[TrialRecord]) -> Self {
        let counts = records.iter().map(|r| r.condition).counts();
        let count = |c: Condition| counts.get(&c).copied().unwrap_or(0);

        let correct = records.iter().filter(|r| r.was_correct()).count();
        let accuracy = if records.is_empty() {
            0.0
        } else {
            (correct as f64 / records.len() as f64 * 100.0).round()
        };

        let times: Vec<f64> = records
            .iter()
            .map(|r| r.response_time.as_secs_f64() * 1000.0)
            .collect();

        Self {
            trials: records.len(),
            control: count(Condition::Control),
            errors_inserted: count(Condition::ErrorInserted),
            errors_rectified: count(Condition::ErrorRectified),
            accuracy,
            mean_response_ms: mean(&times).unwrap_or(0.0),
            std_dev_response_ms: std_dev(&times).unwrap_or(0.0),
        }
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let variance = data.iter().map(|v| (v - m).powi(2)).sum::<f64>() / data.len() as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Key;
    use crate::policy::Feedback;
    use chrono::Local;
    use std::time::Duration;

    fn record(ms: u64, response: char, condition: Condition) -> TrialRecord {
        TrialRecord {
            session: 1,
            block: 1,
            trial: 1,
            cursor_position: 0,
            timestamp: Local::now(),
            response_time: Duration::from_millis(ms),
            target_response: Key::Letter('a'),
            response: Key::Letter(response),
            feedback: Feedback::Positive,
            condition,
        }
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), Some(0.0));
        assert_eq!(std_dev(&[]), None);
        let sd = std_dev(&[-10.0, -5.0, -15.0]).unwrap();
        assert!((sd - 4.08248290463863).abs() < 1e-10);
    }

    #[test]
    fn summarizes_conditions_and_latency() {
        let records = vec![
            record(100, 'a', Condition::Control),
            record(200, 'a', Condition::ErrorInserted),
            record(300, 'b', Condition::ErrorRectified),
            record(400, 'b', Condition::Control),
        ];
        let summary = BlockSummary::from_records(&records);
        assert_eq!(summary.trials, 4);
        assert_eq!(summary.control, 2);
        assert_eq!(summary.errors_inserted, 1);
        assert_eq!(summary.errors_rectified, 1);
        assert_eq!(summary.accuracy, 50.0);
        assert!((summary.mean_response_ms - 250.0).abs() < 1e-9);
        assert!(summary.std_dev_response_ms > 0.0);
    }

    #[test]
    fn empty_block_summary() {
        let summary = BlockSummary::from_records(&[]);
        assert_eq!(summary.trials, 0);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.mean_response_ms, 0.0);
    }
}
