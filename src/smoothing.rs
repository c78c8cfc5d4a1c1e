use std::ops::Deref;

use crate::Reading;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedReading {
    pub reading: Reading,
    /// Trailing mean over the last `window` readings of the whole series,
    /// `None` until `window` readings have arrived.
    pub moving_average: Option<f64>,
}

impl Deref for SmoothedReading {
    type Target = Reading;

    fn deref(&self) -> &Self::Target {
        &self.reading
    }
}

/// Trailing moving average of `values`, aligned with the input.
///
/// Each full window is summed on its own, so no drift accumulates over long
/// series. A zero window never fills and yields `None` everywhere.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let warmup = values.len().min(window - 1);
    let mut out = vec![None; warmup];
    out.extend(
        values
            .windows(window)
            .map(|w| Some(w.iter().sum::<f64>() / window as f64)),
    );
    out
}

/// Attaches the moving average to every reading, in arrival order.
///
/// The window runs over the full series, across city and season boundaries;
/// it is not restarted per group.
pub fn smooth(readings: &[Reading], window: usize) -> Vec<SmoothedReading> {
    let temperatures: Vec<f64> = readings.iter().map(|r| r.temperature).collect();
    readings
        .iter()
        .zip(rolling_mean(&temperatures, window))
        .map(|(reading, moving_average)| SmoothedReading {
            reading: *reading,
            moving_average,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    use super::*;
    use crate::Season;

    fn reading(city: &str, season: Season, day: u32, temperature: f64) -> Reading {
        let ts = NaiveDate::from_ymd_opt(2020, 1, day).unwrap().and_hms_opt(0, 0, 0).unwrap();
        Reading::new(ts, city, season, temperature)
    }

    #[test]
    fn test_rolling_mean_warmup_is_none() {
        let values: Vec<f64> = (1..=5).map(f64::from).collect();
        let out = rolling_mean(&values, 3);
        assert_eq!(out.len(), 5);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_abs_diff_eq!(out[2].unwrap(), 2.0);
        assert_abs_diff_eq!(out[3].unwrap(), 3.0);
        assert_abs_diff_eq!(out[4].unwrap(), 4.0);
    }

    #[test]
    fn test_rolling_mean_shorter_than_window() {
        let out = rolling_mean(&[1.0, 2.0], 30);
        assert_eq!(out, vec![None, None]);
        assert!(rolling_mean(&[], 30).is_empty());
    }

    #[test]
    fn test_rolling_mean_window_of_one_is_identity() {
        let values = [3.5, -1.0, 7.25];
        let out: Vec<f64> = rolling_mean(&values, 1).into_iter().flatten().collect();
        assert_eq!(out, values);
    }

    #[test]
    fn test_zero_window_does_not_panic() {
        assert_eq!(rolling_mean(&[1.0, 2.0, 3.0], 0), vec![None, None, None]);

        let readings = vec![reading("A", Season::Winter, 1, 10.0)];
        let smoothed = smooth(&readings, 0);
        assert_eq!(smoothed.len(), 1);
        assert_eq!(smoothed[0].moving_average, None);
    }

    #[test]
    fn test_window_thirty_first_value_at_position_29() {
        let values: Vec<f64> = (0..40).map(f64::from).collect();
        let out = rolling_mean(&values, 30);
        assert!(out[..29].iter().all(Option::is_none));
        // mean of 0..=29
        assert_abs_diff_eq!(out[29].unwrap(), 14.5);
        // mean of 10..=39
        assert_abs_diff_eq!(out[39].unwrap(), 24.5);
    }

    #[test]
    fn test_smooth_spans_group_boundaries() {
        // alternating cities: a per-group window would see only one value each
        let readings = vec![
            reading("A", Season::Winter, 1, 10.0),
            reading("B", Season::Winter, 2, 20.0),
            reading("A", Season::Winter, 3, 30.0),
        ];
        let smoothed = smooth(&readings, 2);
        assert_eq!(smoothed[0].moving_average, None);
        assert_abs_diff_eq!(smoothed[1].moving_average.unwrap(), 15.0);
        assert_abs_diff_eq!(smoothed[2].moving_average.unwrap(), 25.0);
        assert_eq!(smoothed[2].city.as_str(), "A");
    }

    #[test]
    fn test_smooth_does_not_reorder_by_timestamp() {
        let readings = vec![
            reading("A", Season::Winter, 9, 1.0),
            reading("A", Season::Winter, 1, 2.0),
        ];
        let smoothed = smooth(&readings, 1);
        assert_eq!(smoothed[0].reading, readings[0]);
        assert_eq!(smoothed[1].reading, readings[1]);
    }
}
