use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDateTime, Timelike};

use crate::weather::{ForecastTable, HourlyPoint};

// Telegram caps messages at 4096 chars; leave headroom for the code fence.
const MAX_MESSAGE_CHARS: usize = 3800;
const SNIPPET_LINES: usize = 20;

pub fn exceeds_message_limit(text: &str) -> bool {
    text.chars().count() > MAX_MESSAGE_CHARS
}

/// Plain-text comparison table, one block per model.
pub fn render_table(table: &ForecastTable) -> String {
    let mut out = String::new();
    for series in &table.series {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("=== {} ===\n", series.model));
        out.push_str("hour    temp °C  precip mm  wind km/h\n");
        for point in &series.points {
            out.push_str(&format!(
                "{:02}:00  {:>9}  {:>9}  {:>9}\n",
                point.time.hour(),
                fmt_value(point.temp),
                fmt_value(point.precip),
                fmt_value(point.wind),
            ));
        }
        if series.points.is_empty() {
            out.push_str("(no data in the requested window)\n");
        }
    }
    out
}

fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "n/a".to_string(),
    }
}

/// First lines of the table, sent alongside the CSV when the full table
/// does not fit in one message.
pub fn snippet(text: &str) -> String {
    text.lines()
        .take(SNIPPET_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wide CSV with one row per timestamp and per-model value columns,
/// rows joined on time across models.
pub fn to_csv(table: &ForecastTable) -> String {
    let mut times: BTreeSet<NaiveDateTime> = BTreeSet::new();
    let mut by_model: Vec<(&str, HashMap<NaiveDateTime, &HourlyPoint>)> = Vec::new();

    for series in &table.series {
        let mut index = HashMap::new();
        for point in &series.points {
            times.insert(point.time);
            index.insert(point.time, point);
        }
        by_model.push((series.model.as_str(), index));
    }

    let mut out = String::from("time");
    for (name, _) in &by_model {
        out.push_str(&format!(",temp_{name},precip_{name},wind_{name}"));
    }
    out.push('\n');

    for time in &times {
        out.push_str(&time.format("%Y-%m-%d %H:%M").to_string());
        for (_, index) in &by_model {
            match index.get(time) {
                Some(point) => out.push_str(&format!(
                    ",{},{},{}",
                    fmt_csv(point.temp),
                    fmt_csv(point.precip),
                    fmt_csv(point.wind),
                )),
                // This model has no row at this timestamp.
                None => out.push_str(",,,"),
            }
        }
        out.push('\n');
    }
    out
}

fn fmt_csv(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelId;
    use crate::weather::ModelSeries;
    use chrono::NaiveDate;

    fn point(hour: u32, temp: f64) -> HourlyPoint {
        HourlyPoint {
            time: NaiveDate::from_ymd_opt(2025, 8, 19)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            temp: Some(temp),
            precip: Some(0.0),
            wind: Some(14.8),
        }
    }

    fn two_model_table() -> ForecastTable {
        ForecastTable {
            series: vec![
                ModelSeries {
                    model: ModelId::Gfs,
                    points: vec![point(12, 31.2), point(13, 31.8)],
                },
                ModelSeries {
                    model: ModelId::Icon,
                    points: vec![point(13, 30.4)],
                },
            ],
        }
    }

    #[test]
    fn table_has_one_block_per_model() {
        let text = render_table(&two_model_table());
        assert!(text.contains("=== GFS ==="));
        assert!(text.contains("=== ICON ==="));
        assert!(text.contains("12:00"));
        assert!(text.contains("31.2"));
        assert!(text.contains("30.4"));
    }

    #[test]
    fn missing_values_render_as_na() {
        let mut table = two_model_table();
        table.series[0].points[0].temp = None;
        assert!(render_table(&table).contains("n/a"));
    }

    #[test]
    fn csv_joins_rows_on_time() {
        let csv = to_csv(&two_model_table());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "time,temp_GFS,precip_GFS,wind_GFS,temp_ICON,precip_ICON,wind_ICON"
        );
        // 12:00 exists only in GFS, so the ICON cells are empty.
        assert_eq!(lines[1], "2025-08-19 12:00,31.2,0,14.8,,,");
        assert_eq!(lines[2], "2025-08-19 13:00,31.8,0,14.8,30.4,0,14.8");
    }

    #[test]
    fn snippet_truncates_long_tables() {
        let text = (0..100).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        assert_eq!(snippet(&text).lines().count(), 20);
    }

    #[test]
    fn message_limit_threshold() {
        assert!(!exceeds_message_limit("short"));
        assert!(exceeds_message_limit(&"x".repeat(4000)));
    }
}
