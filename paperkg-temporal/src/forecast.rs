//! `TrendForecaster`: SMA/EMA/WMA/linear point forecasts, holdout-based
//! accuracy scoring, and a weighted ensemble across all four methods.

use paperkg_core::{ForecastMethod, TrendDirection};
use std::collections::HashMap;

/// Scales how strongly a method's own trend estimate is projected forward;
/// see `method_scale`.
fn method_scale(method: ForecastMethod) -> f64 {
    match method {
        ForecastMethod::Sma => 0.5,
        ForecastMethod::Ema => 0.8,
        ForecastMethod::Wma => 0.9,
        ForecastMethod::Linear => 1.0,
    }
}

#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub window_size: usize,
    pub ema_smoothing_factor: f64,
    pub forecast_horizon: usize,
    pub confidence_level: f64,
    pub min_data_points: usize,
    /// Trend-direction thresholds. Defaults match the source's magic
    /// constants of +0.5 / -0.5.
    pub trend_up_slope: f64,
    pub trend_down_slope: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window_size: 7,
            ema_smoothing_factor: 0.3,
            forecast_horizon: 7,
            confidence_level: 0.95,
            min_data_points: 5,
            trend_up_slope: 0.5,
            trend_down_slope: -0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub step: usize,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub method: ForecastMethod,
    pub points: Vec<ForecastPoint>,
    pub direction: TrendDirection,
    pub confidence: f64,
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
}

impl Forecast {
    fn empty(method: ForecastMethod) -> Self {
        Self { method, points: Vec::new(), direction: TrendDirection::Stable, confidence: 0.0, mae: None, rmse: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleForecast {
    pub weights: HashMap<ForecastMethod, f64>,
    pub points: Vec<ForecastPoint>,
    pub direction: TrendDirection,
    pub confidence: f64,
}

fn linear_regression(ys: &[f64]) -> (f64, f64) {
    let n = ys.len();
    if n < 2 {
        return (0.0, ys.first().copied().unwrap_or(0.0));
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n_f;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let x = i as f64;
        num += (x - x_mean) * (y - y_mean);
        den += (x - x_mean).powi(2);
    }
    let slope = if den == 0.0 { 0.0 } else { num / den };
    let intercept = y_mean - slope * x_mean;
    (slope, intercept)
}

fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

fn sma_base(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

fn ema_base(window: &[f64], alpha: f64) -> f64 {
    let mut e = window[0];
    for &x in &window[1..] {
        e = alpha * x + (1.0 - alpha) * e;
    }
    e
}

fn wma_base(window: &[f64]) -> f64 {
    let n = window.len();
    let weight_sum: f64 = (1..=n).map(|w| w as f64).sum();
    window.iter().enumerate().map(|(i, v)| v * (i as f64 + 1.0)).sum::<f64>() / weight_sum
}

/// `(base, trend)` for `method` over `window`. `trend` is always the
/// window's linear-regression slope; what differs per method is the base
/// value the trend is projected forward from.
fn base_and_trend(method: ForecastMethod, window: &[f64], ema_alpha: f64) -> (f64, f64) {
    let (slope, _) = linear_regression(window);
    let base = match method {
        ForecastMethod::Sma => sma_base(window),
        ForecastMethod::Ema => ema_base(window, ema_alpha),
        ForecastMethod::Wma => wma_base(window),
        ForecastMethod::Linear => {
            let (slope, intercept) = linear_regression(window);
            intercept + slope * (window.len() as f64 - 1.0)
        }
    };
    (base, slope)
}

fn direction_from_trend(trend: f64, config: &ForecastConfig) -> TrendDirection {
    if trend > config.trend_up_slope {
        TrendDirection::Up
    } else if trend < config.trend_down_slope {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    }
}

/// Predict the last 5 points of `series` from sliding windows over the
/// samples preceding each, returning `(mae, rmse)` over those errors.
fn holdout_validate(config: &ForecastConfig, series: &[f64], method: ForecastMethod) -> (Option<f64>, Option<f64>) {
    if series.len() <= config.window_size {
        return (None, None);
    }
    let holdout_n = 5.min(series.len() - config.window_size);
    let start = series.len() - holdout_n;
    let mut errors = Vec::with_capacity(holdout_n);

    for idx in start..series.len() {
        let window = &series[idx - config.window_size..idx];
        let (base, trend) = base_and_trend(method, window, config.ema_smoothing_factor);
        let k = method_scale(method);
        let predicted = (base + trend * k).max(0.0);
        errors.push((predicted - series[idx]).abs());
    }

    if errors.is_empty() {
        return (None, None);
    }
    let mae = errors.iter().sum::<f64>() / errors.len() as f64;
    let rmse = (errors.iter().map(|e| e.powi(2)).sum::<f64>() / errors.len() as f64).sqrt();
    (Some(mae), Some(rmse))
}

fn confidence_score(config: &ForecastConfig, sample_count: usize, rmse: Option<f64>) -> f64 {
    let sufficiency = (sample_count as f64 / (3.0 * config.min_data_points as f64)).min(1.0);
    let accuracy = 1.0 / (1.0 + rmse.unwrap_or(0.0) / 100.0);
    ((sufficiency + accuracy) / 2.0).clamp(0.1, 1.0)
}

pub struct TrendForecaster {
    config: ForecastConfig,
}

impl TrendForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Forecast `method` over `series` (chronologically ascending daily
    /// values). Only the trailing `2 * window_size` samples are used; fewer
    /// than `min_data_points` samples yields an empty, zero-confidence
    /// forecast.
    pub fn forecast(&self, series: &[f64], method: ForecastMethod) -> Forecast {
        let config = &self.config;
        let lookback = (2 * config.window_size).min(series.len());
        let recent = &series[series.len() - lookback..];

        if recent.len() < config.min_data_points {
            return Forecast::empty(method);
        }

        let window_len = config.window_size.min(recent.len());
        let window = &recent[recent.len() - window_len..];
        let (base, trend) = base_and_trend(method, window, config.ema_smoothing_factor);
        let k = method_scale(method);
        let sigma = stddev(recent);

        let points: Vec<ForecastPoint> = (1..=config.forecast_horizon)
            .map(|step| {
                let step_f = step as f64;
                let predicted = (base + trend * step_f * k).max(0.0);
                let uncertainty = sigma * (step_f / 7.0).sqrt() * 1.96;
                ForecastPoint {
                    step,
                    predicted,
                    lower_bound: (predicted - uncertainty).max(0.0),
                    upper_bound: predicted + uncertainty,
                }
            })
            .collect();

        let (mae, rmse) = holdout_validate(config, recent, method);
        let confidence = confidence_score(config, recent.len(), rmse);
        let direction = direction_from_trend(trend, config);

        Forecast { method, points, direction, confidence, mae, rmse }
    }

    /// Run every method, weight each by `1 / (rmse + 0.01)`, and combine
    /// their per-step predictions and bounds. Direction is the majority
    /// vote across the four methods' own directions.
    pub fn ensemble_forecast(&self, series: &[f64]) -> EnsembleForecast {
        let methods = [ForecastMethod::Sma, ForecastMethod::Ema, ForecastMethod::Wma, ForecastMethod::Linear];
        let forecasts: Vec<Forecast> = methods.iter().map(|m| self.forecast(series, *m)).collect();

        if forecasts.iter().all(|f| f.points.is_empty()) {
            return EnsembleForecast {
                weights: HashMap::new(),
                points: Vec::new(),
                direction: TrendDirection::Stable,
                confidence: 0.0,
            };
        }

        let raw_weights: Vec<f64> = forecasts.iter().map(|f| 1.0 / (f.rmse.unwrap_or(0.0) + 0.01)).collect();
        let weight_sum: f64 = raw_weights.iter().sum();
        let normalized: Vec<f64> = raw_weights.iter().map(|w| w / weight_sum).collect();

        let horizon = forecasts.iter().map(|f| f.points.len()).max().unwrap_or(0);
        let mut points = Vec::with_capacity(horizon);
        for step_idx in 0..horizon {
            let mut predicted = 0.0;
            let mut lower = 0.0;
            let mut upper = 0.0;
            for (forecast, weight) in forecasts.iter().zip(normalized.iter()) {
                if let Some(p) = forecast.points.get(step_idx) {
                    predicted += p.predicted * weight;
                    lower += p.lower_bound * weight;
                    upper += p.upper_bound * weight;
                }
            }
            points.push(ForecastPoint { step: step_idx + 1, predicted, lower_bound: lower, upper_bound: upper });
        }

        let up = forecasts.iter().filter(|f| f.direction == TrendDirection::Up).count();
        let down = forecasts.iter().filter(|f| f.direction == TrendDirection::Down).count();
        let stable = forecasts.len() - up - down;
        let direction = if up > down && up > stable {
            TrendDirection::Up
        } else if down > up && down > stable {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };

        let confidence = forecasts.iter().zip(normalized.iter()).map(|(f, w)| f.confidence * w).sum();
        let weights = methods.iter().copied().zip(normalized.iter().copied()).collect();

        EnsembleForecast { weights, points, direction, confidence }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising_series(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 + i as f64 * 2.0).collect()
    }

    #[test]
    fn below_min_data_points_returns_an_empty_zero_confidence_forecast() {
        let forecaster = TrendForecaster::new(ForecastConfig { min_data_points: 10, ..Default::default() });
        let forecast = forecaster.forecast(&[1.0, 2.0, 3.0], ForecastMethod::Sma);
        assert!(forecast.points.is_empty());
        assert_eq!(forecast.confidence, 0.0);
    }

    #[test]
    fn rising_series_is_classified_up_for_every_method() {
        let forecaster = TrendForecaster::new(ForecastConfig::default());
        let series = rising_series(20);
        for method in [ForecastMethod::Sma, ForecastMethod::Ema, ForecastMethod::Wma, ForecastMethod::Linear] {
            let forecast = forecaster.forecast(&series, method);
            assert_eq!(forecast.direction, TrendDirection::Up, "{method:?} should detect an upward trend");
            assert_eq!(forecast.points.len(), forecaster.config.forecast_horizon);
        }
    }

    #[test]
    fn flat_series_is_classified_stable() {
        let forecaster = TrendForecaster::new(ForecastConfig::default());
        let series = vec![50.0; 20];
        let forecast = forecaster.forecast(&series, ForecastMethod::Linear);
        assert_eq!(forecast.direction, TrendDirection::Stable);
    }

    #[test]
    fn projected_values_never_go_negative() {
        let forecaster = TrendForecaster::new(ForecastConfig::default());
        let declining: Vec<f64> = (0..20).map(|i| (50.0 - i as f64 * 10.0).max(-1000.0)).collect();
        let forecast = forecaster.forecast(&declining, ForecastMethod::Linear);
        assert!(forecast.points.iter().all(|p| p.predicted >= 0.0));
        assert!(forecast.points.iter().all(|p| p.lower_bound >= 0.0));
    }

    #[test]
    fn confidence_is_bounded_between_point_one_and_one() {
        let forecaster = TrendForecaster::new(ForecastConfig::default());
        let forecast = forecaster.forecast(&rising_series(20), ForecastMethod::Ema);
        assert!(forecast.confidence >= 0.1 && forecast.confidence <= 1.0);
    }

    #[test]
    fn ensemble_weights_sum_to_one_when_any_method_produces_points() {
        let forecaster = TrendForecaster::new(ForecastConfig::default());
        let ensemble = forecaster.ensemble_forecast(&rising_series(20));
        let total: f64 = ensemble.weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(ensemble.points.len(), forecaster.config.forecast_horizon);
    }

    #[test]
    fn ensemble_on_insufficient_data_is_empty() {
        let forecaster = TrendForecaster::new(ForecastConfig { min_data_points: 50, ..Default::default() });
        let ensemble = forecaster.ensemble_forecast(&rising_series(5));
        assert!(ensemble.points.is_empty());
        assert_eq!(ensemble.confidence, 0.0);
    }
}
