use std::fmt;

use ndarray::Array1;
use serde::Serialize;

use crate::config::ValidationSettings;
use crate::errors::EngineError;

/// One equal-width probability bucket of the reliability diagram
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub mean_prediction: f64,
    pub mean_outcome: f64,
}

impl CalibrationBin {
    pub fn gap(&self) -> f64 {
        (self.mean_prediction - self.mean_outcome).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationMetrics {
    pub samples: usize,
    pub brier_score: f64,
    pub log_loss: f64,
    pub calibration_error: f64,
    pub accuracy: f64,
}

impl fmt::Display for CalibrationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} predictions: brier {:.4}, log loss {:.4}, calibration error {:.4}, accuracy {:.1}%",
            self.samples,
            self.brier_score,
            self.log_loss,
            self.calibration_error,
            self.accuracy * 100.0
        )
    }
}

/// Scores batches of player1-win probabilities against observed outcomes
#[derive(Debug, Clone, Default)]
pub struct CalibrationValidator {
    settings: ValidationSettings,
}

impl CalibrationValidator {
    pub fn new(settings: ValidationSettings) -> Self {
        Self { settings }
    }

    /// Mean squared error; 0.25 for a batch of coin flips
    pub fn brier_score(&self, predictions: &[f64], outcomes: &[bool]) -> Result<f64, EngineError> {
        let (p, y) = to_arrays(predictions, outcomes)?;
        Ok((&p - &y).mapv(|d| d * d).mean().unwrap_or(0.0))
    }

    pub fn log_loss(&self, predictions: &[f64], outcomes: &[bool]) -> Result<f64, EngineError> {
        let (p, y) = to_arrays(predictions, outcomes)?;
        let eps = self.settings.log_loss_epsilon;
        let p = p.mapv(|v| v.max(eps).min(1.0 - eps));

        let hits = &y * &p.mapv(f64::ln);
        let misses = &y.mapv(|v| 1.0 - v) * &p.mapv(|v| (1.0 - v).ln());
        Ok(-(hits + misses).mean().unwrap_or(0.0))
    }

    /// Sample-weighted mean gap between predicted and observed rates over
    /// the non-empty bins
    pub fn calibration_error(
        &self,
        predictions: &[f64],
        outcomes: &[bool],
    ) -> Result<f64, EngineError> {
        let table = self.reliability_table(predictions, outcomes)?;
        let weighted_gap: f64 = table.iter().map(|bin| bin.gap() * bin.count as f64).sum();
        Ok(weighted_gap / predictions.len() as f64)
    }

    /// Non-empty bins only, lowest first
    pub fn reliability_table(
        &self,
        predictions: &[f64],
        outcomes: &[bool],
    ) -> Result<Vec<CalibrationBin>, EngineError> {
        let (p, y) = to_arrays(predictions, outcomes)?;
        let bins = self.settings.bins.max(1);

        let mut counts = Array1::<f64>::zeros(bins);
        let mut prediction_sums = Array1::<f64>::zeros(bins);
        let mut outcome_sums = Array1::<f64>::zeros(bins);

        for (prediction, outcome) in p.iter().zip(y.iter()) {
            let idx = bin_index(*prediction, bins);
            counts[idx] += 1.0;
            prediction_sums[idx] += prediction;
            outcome_sums[idx] += outcome;
        }

        let width = 1.0 / bins as f64;
        let table = (0..bins)
            .filter(|&idx| counts[idx] > 0.0)
            .map(|idx| CalibrationBin {
                lower: idx as f64 * width,
                upper: (idx + 1) as f64 * width,
                count: counts[idx] as usize,
                mean_prediction: prediction_sums[idx] / counts[idx],
                mean_outcome: outcome_sums[idx] / counts[idx],
            })
            .collect();
        Ok(table)
    }

    /// Share of contests where the favoured side won; 0.5 counts as backing player1
    pub fn accuracy(&self, predictions: &[f64], outcomes: &[bool]) -> Result<f64, EngineError> {
        let (p, y) = to_arrays(predictions, outcomes)?;
        let correct = p
            .iter()
            .zip(y.iter())
            .filter(|&(prediction, outcome)| (*prediction >= 0.5) == (*outcome > 0.5))
            .count();
        Ok(correct as f64 / p.len() as f64)
    }

    pub fn evaluate(
        &self,
        predictions: &[f64],
        outcomes: &[bool],
    ) -> Result<CalibrationMetrics, EngineError> {
        Ok(CalibrationMetrics {
            samples: predictions.len(),
            brier_score: self.brier_score(predictions, outcomes)?,
            log_loss: self.log_loss(predictions, outcomes)?,
            calibration_error: self.calibration_error(predictions, outcomes)?,
            accuracy: self.accuracy(predictions, outcomes)?,
        })
    }

    /// How far P(A beats B) and P(B beats A) are from summing to one
    pub fn consistency_check(p_ab: f64, p_ba: f64) -> f64 {
        (p_ab - (1.0 - p_ba)).abs()
    }
}

fn to_arrays(
    predictions: &[f64],
    outcomes: &[bool],
) -> Result<(Array1<f64>, Array1<f64>), EngineError> {
    if predictions.len() != outcomes.len() {
        return Err(EngineError::LengthMismatch {
            predictions: predictions.len(),
            outcomes: outcomes.len(),
        });
    }
    if predictions.is_empty() {
        return Err(EngineError::EmptyBatch);
    }
    if let Some((index, value)) = predictions
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite() || !(0.0..=1.0).contains(*p))
    {
        return Err(EngineError::InvalidProbability {
            index,
            value: *value,
        });
    }

    let p = Array1::from(predictions.to_vec());
    let y = outcomes
        .iter()
        .map(|won| if *won { 1.0 } else { 0.0 })
        .collect::<Array1<f64>>();
    Ok((p, y))
}

/// A prediction of exactly 1.0 lands in the top bin
fn bin_index(prediction: f64, bins: usize) -> usize {
    ((prediction * bins as f64).floor() as usize).min(bins - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> CalibrationValidator {
        CalibrationValidator::default()
    }

    #[test]
    fn test_brier_of_coin_flips() {
        let brier = validator()
            .brier_score(&[0.5, 0.5, 0.5, 0.5], &[true, false, false, true])
            .unwrap();
        assert!((brier - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_log_loss_confident_and_correct() {
        let v = validator();
        let loss = v.log_loss(&[1.0 - 1e-12, 1e-12], &[true, false]).unwrap();
        assert!(loss < 1e-9);

        // Fully confident and wrong stays finite thanks to clipping
        let wrong = v.log_loss(&[1.0, 0.0], &[false, true]).unwrap();
        assert!(wrong.is_finite());
        assert!(wrong > 30.0);

        let coin = v.log_loss(&[0.5], &[true]).unwrap();
        assert!((coin - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn test_batch_errors() {
        let v = validator();
        assert_eq!(
            v.brier_score(&[0.5, 0.6], &[true]),
            Err(EngineError::LengthMismatch {
                predictions: 2,
                outcomes: 1
            })
        );
        assert_eq!(v.evaluate(&[], &[]), Err(EngineError::EmptyBatch));
        assert_eq!(
            v.accuracy(&[0.3, 1.2], &[true, false]),
            Err(EngineError::InvalidProbability {
                index: 1,
                value: 1.2
            })
        );
        assert!(v.log_loss(&[f64::NAN], &[true]).is_err());
    }

    #[test]
    fn test_reliability_table_bins() {
        let v = validator();
        let table = v
            .reliability_table(&[0.05, 0.15, 0.19, 1.0], &[false, true, false, true])
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table[0].count, 1);
        assert_eq!(table[1].count, 2);
        assert!((table[1].mean_prediction - 0.17).abs() < 1e-12);
        assert!((table[1].mean_outcome - 0.5).abs() < 1e-12);
        // 1.0 falls into the top bin
        assert!((table[2].lower - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_error_weighted_by_count() {
        let v = validator();
        let error = v
            .calibration_error(&[0.05, 0.15, 0.15], &[false, true, false])
            .unwrap();

        // Bin 0: |0.05 - 0| * 1, bin 1: |0.15 - 0.5| * 2
        let expected = (0.05 + 0.35 * 2.0) / 3.0;
        assert!((error - expected).abs() < 1e-12);

        let perfect = v.calibration_error(&[0.0, 1.0], &[false, true]).unwrap();
        assert_eq!(perfect, 0.0);
    }

    #[test]
    fn test_accuracy_and_evaluate() {
        let v = validator();
        let predictions = [0.8, 0.5, 0.3, 0.6];
        let outcomes = [true, true, true, false];

        assert_eq!(v.accuracy(&predictions, &outcomes).unwrap(), 0.5);

        let metrics = v.evaluate(&predictions, &outcomes).unwrap();
        assert_eq!(metrics.samples, 4);
        assert!(metrics.to_string().starts_with("4 predictions"));
    }

    #[test]
    fn test_consistency_check() {
        assert!(CalibrationValidator::consistency_check(0.7, 0.3).abs() < 1e-12);
        assert!((CalibrationValidator::consistency_check(0.7, 0.4) - 0.1).abs() < 1e-12);
    }
}
