pub mod cache;

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use utoipa::ToSchema;

/// The columns the statistics engine reads from a leave record. Fields
/// are optional so historical rows with gaps degrade to being skipped
/// per view instead of failing the whole dashboard.
#[derive(Debug, Clone, FromRow)]
pub struct LeaveSample {
    pub class_name: Option<String>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NameValue {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendData {
    pub dates: Vec<String>,
    pub real_values: Vec<i64>,
    /// Causal 3-window moving average of `real_values`, the dashboard's
    /// "prediction" overlay.
    pub predict_values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HeatmapCell {
    pub month: u32,
    /// 1 = Sunday .. 7 = Saturday.
    pub weekday: u32,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveStatistics {
    pub class_stats: Vec<NameValue>,
    pub trend_data: TrendData,
    pub duration_stats: Vec<NameValue>,
    pub heatmap_data: Vec<HeatmapCell>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Causal moving average with a window of three: each point averages the
/// current sample and up to two preceding ones. No look-ahead, so the
/// first two points average 1 and 2 samples.
fn smooth(counts: &[i64]) -> Vec<f64> {
    const WINDOW: usize = 3;
    let mut smoothed = Vec::with_capacity(counts.len());
    for i in 0..counts.len() {
        let start = i.saturating_sub(WINDOW - 1);
        let window = &counts[start..=i];
        let avg = window.iter().sum::<i64>() as f64 / window.len() as f64;
        smoothed.push(round2(avg));
    }
    smoothed
}

/// Deterministic aggregation over the full leave set. Pure: no store
/// access, no clock, no caching here.
pub fn compute(samples: &[LeaveSample]) -> LeaveStatistics {
    // Dimension 1: leaves per class, descending by count.
    let mut per_class: HashMap<&str, i64> = HashMap::new();
    for sample in samples {
        if let Some(class_name) = sample.class_name.as_deref() {
            *per_class.entry(class_name).or_default() += 1;
        }
    }
    let mut class_stats: Vec<NameValue> = per_class
        .into_iter()
        .map(|(name, value)| NameValue {
            name: name.to_string(),
            value,
        })
        .collect();
    class_stats.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));

    // Dimension 2: leaves starting per calendar date, ascending. Days
    // with no leaves are simply absent.
    let mut per_day = BTreeMap::new();
    for sample in samples {
        if let Some(start) = sample.start_date {
            *per_day.entry(start.date()).or_insert(0i64) += 1;
        }
    }
    let dates: Vec<String> = per_day
        .keys()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    let real_values: Vec<i64> = per_day.values().copied().collect();

    // Dimension 3: smoothed "prediction" overlay.
    let predict_values = smooth(&real_values);

    // Dimension 4: duration buckets by whole-day difference.
    let mut short = 0i64;
    let mut medium = 0i64;
    let mut long = 0i64;
    for sample in samples {
        let (Some(start), Some(end)) = (sample.start_date, sample.end_date) else {
            continue;
        };
        let days = (end - start).num_days();
        if days < 1 {
            short += 1;
        } else if days < 3 {
            medium += 1;
        } else {
            long += 1;
        }
    }
    let duration_stats = vec![
        NameValue {
            name: "short".into(),
            value: short,
        },
        NameValue {
            name: "medium".into(),
            value: medium,
        },
        NameValue {
            name: "long".into(),
            value: long,
        },
    ];

    // Dimension 5: month x weekday heatmap of start dates.
    let mut cells: BTreeMap<(u32, u32), i64> = BTreeMap::new();
    for sample in samples {
        if let Some(start) = sample.start_date {
            let key = (start.month(), start.weekday().number_from_sunday());
            *cells.entry(key).or_default() += 1;
        }
    }
    let heatmap_data = cells
        .into_iter()
        .map(|((month, weekday), count)| HeatmapCell {
            month,
            weekday,
            count,
        })
        .collect();

    LeaveStatistics {
        class_stats,
        trend_data: TrendData {
            dates,
            real_values,
            predict_values,
        },
        duration_stats,
        heatmap_data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(date: &str, hour: u32) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample(class: &str, start: NaiveDateTime, end: NaiveDateTime) -> LeaveSample {
        LeaveSample {
            class_name: Some(class.into()),
            start_date: Some(start),
            end_date: Some(end),
        }
    }

    #[test]
    fn smoothing_caps_the_window_at_three() {
        assert_eq!(smooth(&[2, 4, 6, 8]), vec![2.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn smoothing_rounds_to_two_decimals() {
        // window [1, 1, 2] averages to 1.333...
        assert_eq!(smooth(&[1, 1, 2]), vec![1.0, 1.0, 1.33]);
        assert_eq!(smooth(&[]), Vec::<f64>::new());
    }

    #[test]
    fn duration_bucket_edges() {
        let stats = compute(&[
            // 10 hours -> short
            sample("a", dt("2024-03-01", 8), dt("2024-03-01", 18)),
            // exactly 1 day -> medium
            sample("a", dt("2024-03-01", 8), dt("2024-03-02", 8)),
            // exactly 3 days -> long
            sample("a", dt("2024-03-01", 8), dt("2024-03-04", 8)),
            // 2 days and change -> medium
            sample("a", dt("2024-03-01", 8), dt("2024-03-03", 20)),
        ]);
        assert_eq!(
            stats.duration_stats,
            vec![
                NameValue { name: "short".into(), value: 1 },
                NameValue { name: "medium".into(), value: 2 },
                NameValue { name: "long".into(), value: 1 },
            ]
        );
    }

    #[test]
    fn class_distribution_sorts_descending() {
        let a = sample("CS-2401", dt("2024-03-01", 8), dt("2024-03-01", 9));
        let b = sample("CS-2402", dt("2024-03-01", 8), dt("2024-03-01", 9));
        let stats = compute(&[a.clone(), a.clone(), b, a]);
        assert_eq!(stats.class_stats.len(), 2);
        assert_eq!(stats.class_stats[0].name, "CS-2401");
        assert_eq!(stats.class_stats[0].value, 3);
        assert_eq!(stats.class_stats[1].value, 1);
    }

    #[test]
    fn trend_dates_ascend_and_gaps_stay_absent() {
        let stats = compute(&[
            sample("a", dt("2024-03-05", 8), dt("2024-03-05", 9)),
            sample("a", dt("2024-03-01", 8), dt("2024-03-01", 9)),
            sample("a", dt("2024-03-01", 14), dt("2024-03-01", 16)),
        ]);
        assert_eq!(stats.trend_data.dates, vec!["2024-03-01", "2024-03-05"]);
        assert_eq!(stats.trend_data.real_values, vec![2, 1]);
        assert_eq!(stats.trend_data.predict_values, vec![2.0, 1.5]);
    }

    #[test]
    fn heatmap_weekday_counts_from_sunday() {
        // 2024-03-03 was a Sunday, 2024-03-04 a Monday.
        let stats = compute(&[
            sample("a", dt("2024-03-03", 8), dt("2024-03-03", 9)),
            sample("a", dt("2024-03-04", 8), dt("2024-03-04", 9)),
            sample("a", dt("2024-03-04", 10), dt("2024-03-04", 11)),
        ]);
        assert_eq!(
            stats.heatmap_data,
            vec![
                HeatmapCell { month: 3, weekday: 1, count: 1 },
                HeatmapCell { month: 3, weekday: 2, count: 2 },
            ]
        );
    }

    #[test]
    fn incomplete_records_are_skipped_not_errors() {
        let stats = compute(&[
            LeaveSample {
                class_name: None,
                start_date: Some(dt("2024-03-01", 8)),
                end_date: None,
            },
            LeaveSample {
                class_name: Some("CS-2401".into()),
                start_date: None,
                end_date: None,
            },
        ]);
        // no class -> absent from class stats; no end -> absent from buckets
        assert_eq!(stats.class_stats.len(), 1);
        assert_eq!(stats.trend_data.dates.len(), 1);
        let bucket_total: i64 = stats.duration_stats.iter().map(|b| b.value).sum();
        assert_eq!(bucket_total, 0);
    }

    #[test]
    fn compute_is_deterministic() {
        let samples = vec![
            sample("a", dt("2024-03-01", 8), dt("2024-03-02", 8)),
            sample("b", dt("2024-03-02", 8), dt("2024-03-02", 9)),
        ];
        assert_eq!(compute(&samples), compute(&samples));
    }
}
