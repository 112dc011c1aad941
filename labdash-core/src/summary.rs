//! Per-treatment card: when each limited parameter first crossed its limit
//! while the treatment was running.

use serde::{Deserialize, Serialize};

use crate::crossing::{CrossingDirection, CrossingEvent};
use crate::date_scale::to_iso_date;
use crate::treatment::TreatmentInterval;
use crate::Timestamp;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentCrossing {
    pub param_key: String,
    pub limit: f64,
    pub direction: CrossingDirection,
    pub date_iso: String,
    pub day: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentSummary {
    pub name: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub start_date: String,
    pub end_date: String,
    /// Treatment day of the end date.
    pub end_day: i64,
    pub crossings: Vec<TreatmentCrossing>,
}

impl TreatmentSummary {
    pub fn subtitle(&self) -> String {
        format!(
            "Inicio D+1: {} · Fin: {} (D+{})",
            self.start_date, self.end_date, self.end_day
        )
    }
}

/// One summary per interval, oldest first. `limited` yields
/// `(param_key, limit, crossings)` for every parameter with a limit.
pub fn summarize_treatments<'a, I>(
    intervals: &[TreatmentInterval],
    limited: I,
) -> Vec<TreatmentSummary>
where
    I: IntoIterator<Item = (&'a str, f64, &'a [CrossingEvent])>,
{
    let limited: Vec<(&str, f64, &[CrossingEvent])> = limited.into_iter().collect();

    let mut ordered: Vec<&TreatmentInterval> = intervals.iter().collect();
    ordered.sort_by_key(|interval| interval.start);

    ordered
        .into_iter()
        .map(|interval| {
            let crossings = limited
                .iter()
                .filter_map(|(key, limit, crossings)| {
                    first_within(interval, crossings).map(|(crossing, day)| TreatmentCrossing {
                        param_key: key.to_string(),
                        limit: *limit,
                        direction: crossing.direction,
                        date_iso: crossing.date_iso.clone(),
                        day,
                    })
                })
                .collect();

            TreatmentSummary {
                name: interval.name.clone(),
                start: interval.start,
                end: interval.end,
                start_date: to_iso_date(interval.start),
                end_date: to_iso_date(interval.end),
                end_day: interval.day_span(),
                crossings,
            }
        })
        .collect()
}

fn first_within<'c>(
    interval: &TreatmentInterval,
    crossings: &'c [CrossingEvent],
) -> Option<(&'c CrossingEvent, i64)> {
    crossings
        .iter()
        .filter_map(|crossing| {
            crossing
                .treatment(&interval.name, interval.start)
                .map(|hit| (crossing, hit.day))
        })
        .min_by_key(|(crossing, _)| crossing.ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossing::detect_with_treatments;
    use crate::date_scale::parse_iso_date;
    use crate::SeriesPoint;

    fn ts(date: &str) -> Timestamp {
        parse_iso_date(date).unwrap()
    }

    #[test]
    fn first_crossing_per_parameter_inside_each_treatment() {
        let intervals = vec![
            TreatmentInterval {
                name: "Late".to_string(),
                start: ts("2024-02-01"),
                end: ts("2024-02-10"),
            },
            TreatmentInterval {
                name: "Early".to_string(),
                start: ts("2024-01-01"),
                end: ts("2024-01-10"),
            },
        ];
        let series = vec![
            SeriesPoint::new("2024-01-02", 1.0),
            SeriesPoint::new("2024-01-04", 5.0),
            SeriesPoint::new("2024-01-06", 1.0),
            SeriesPoint::new("2024-01-08", 5.0),
        ];
        let crossings = detect_with_treatments(&series, 3.0, &intervals);
        assert_eq!(crossings.len(), 3);

        let summaries = summarize_treatments(
            &intervals,
            [("neutrofilos_abs", 3.0, crossings.as_slice())],
        );
        assert_eq!(summaries[0].name, "Early");
        assert_eq!(summaries[0].end_day, 10);
        assert_eq!(summaries[0].crossings.len(), 1);
        let first = &summaries[0].crossings[0];
        assert_eq!(first.direction, CrossingDirection::Up);
        assert_eq!(first.date_iso, "2024-01-03");
        assert_eq!(first.day, 3);
        assert!(summaries[1].crossings.is_empty());
        assert_eq!(
            summaries[0].subtitle(),
            "Inicio D+1: 2024-01-01 · Fin: 2024-01-10 (D+10)"
        );
    }
}
