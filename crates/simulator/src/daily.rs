//! Per-day statistics and their NDJSON export.
//!
//! Each departed entity is bucketed by the date it arrived. The file holds
//! one `metadata` line, one `daily_summary` line per date in date order and
//! a closing `completion` line.

use crate::config::DateRange;
use chrono::NaiveDate;
use indexmap::IndexMap;
use queuesim_core::Station;
use queuesim_simulation::RunObserver;
use queuesim_stations::AnyStation;
use queuesim_types::{day_index, secs_f64, Entity, PriorityClass, VisitRecord, SECONDS_PER_DAY};
use queuesim_validation::theory::{QUEUE_TIME, RESPONSE_TIME, SERVICE_TIME};
use queuesim_validation::ObservationSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Every `SAMPLE_EVERY`-th visit of a day goes into the raw sample bucket.
const SAMPLE_EVERY: u64 = 6;
/// Raw sample cap per day for a FIFO station.
const SAMPLE_CAP: usize = 1250;
/// Raw sample cap per day for the priority station.
const PRIORITY_SAMPLE_CAP: usize = 2500;

/// One line of the NDJSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DailyRecord {
    Metadata(RunMetadata),
    DailySummary(DaySummary),
    Completion(CompletionRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub replica_id: Option<u32>,
    pub seed: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub warm_up_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub summary: DayCounts,
    pub stats: IndexMap<String, StationDayStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayCounts {
    pub arrived: u64,
    pub departed: u64,
    pub found_queue_full: u64,
}

/// Means over one station's visits by entities that arrived on one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationDayStats {
    pub visits: u64,
    pub queue_time: f64,
    pub execution_time: f64,
    pub queue_length: f64,
    /// Per priority class, keyed by class label.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub classes: IndexMap<String, ClassDayStats>,
    /// Thinned raw values, for plotting only.
    pub samples: RawSamples,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDayStats {
    pub visits: u64,
    pub queue_time: f64,
    pub execution_time: f64,
    pub queue_length: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSamples {
    pub queue_time: Vec<f64>,
    pub execution_time: Vec<f64>,
    pub queue_length: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub total_departed: u64,
    pub total_overflowed: u64,
    pub ignored_warm_up: u64,
    pub simulated_seconds: f64,
}

/// Running sums for one station or class on one day.
#[derive(Debug, Clone, Default)]
struct Sums {
    visits: u64,
    queue_time: f64,
    execution_time: f64,
    queue_length: f64,
}

impl Sums {
    fn add(&mut self, queue: f64, execution: f64, length: f64) {
        self.visits += 1;
        self.queue_time += queue;
        self.execution_time += execution;
        self.queue_length += length;
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            sum / self.visits as f64
        }
    }

    fn class_stats(&self) -> ClassDayStats {
        ClassDayStats {
            visits: self.visits,
            queue_time: self.mean(self.queue_time),
            execution_time: self.mean(self.execution_time),
            queue_length: self.mean(self.queue_length),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct StationDay {
    totals: Sums,
    classes: BTreeMap<PriorityClass, Sums>,
    samples: RawSamples,
    sample_cap: usize,
}

impl StationDay {
    fn record(&mut self, visit: &VisitRecord) {
        let queue = visit.queue_time().map(secs_f64).unwrap_or(0.0);
        let execution = visit.service_time().map(secs_f64).unwrap_or(0.0);
        let length = visit.queue_length_at_entry as f64;
        self.totals.add(queue, execution, length);
        if let Some(class) = visit.priority_class {
            self.classes.entry(class).or_default().add(queue, execution, length);
        }
        if self.totals.visits % SAMPLE_EVERY == 0 && self.samples.queue_time.len() < self.sample_cap {
            self.samples.queue_time.push(queue);
            self.samples.execution_time.push(execution);
            self.samples.queue_length.push(length);
        }
    }

    fn to_stats(&self) -> StationDayStats {
        let base = self.totals.class_stats();
        StationDayStats {
            visits: base.visits,
            queue_time: base.queue_time,
            execution_time: base.execution_time,
            queue_length: base.queue_length,
            classes: self
                .classes
                .iter()
                .map(|(class, sums)| (class.label().to_string(), sums.class_stats()))
                .collect(),
            samples: self.samples.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Day {
    counts: DayCounts,
    stations: IndexMap<String, StationDay>,
}

/// Observer that aggregates departures per arrival day.
#[derive(Debug, Clone)]
pub struct DailyStatsCollector {
    dates: DateRange,
    replica: Option<u32>,
    seed: u64,
    warm_up: Duration,
    days: BTreeMap<u64, Day>,
    departed: u64,
    overflowed: u64,
    ignored: u64,
    finished_at: Duration,
}

impl DailyStatsCollector {
    pub fn new(dates: DateRange, seed: u64) -> Self {
        Self {
            dates,
            replica: None,
            seed,
            warm_up: Duration::ZERO,
            days: BTreeMap::new(),
            departed: 0,
            overflowed: 0,
            ignored: 0,
            finished_at: Duration::ZERO,
        }
    }

    /// Tag output with a replica number.
    pub fn with_replica(mut self, replica: u32) -> Self {
        self.replica = Some(replica);
        self
    }

    /// Ignore entities that arrived before `warm_up`.
    pub fn with_warm_up(mut self, warm_up: Duration) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Departures recorded, excluding the warm-up.
    pub fn departed(&self) -> u64 {
        self.departed
    }

    /// Departures skipped because they arrived during the warm-up.
    pub fn ignored(&self) -> u64 {
        self.ignored
    }

    /// All records in file order.
    pub fn records(&self) -> Vec<DailyRecord> {
        let mut records = Vec::with_capacity(self.days.len() + 2);
        records.push(DailyRecord::Metadata(RunMetadata {
            replica_id: self.replica,
            seed: self.seed,
            start_date: self.dates.start,
            end_date: self.dates.end,
            warm_up_days: secs_f64(self.warm_up) / SECONDS_PER_DAY as f64,
        }));
        for (&day, data) in &self.days {
            records.push(DailyRecord::DailySummary(DaySummary {
                date: self.dates.date_of(day),
                summary: data.counts.clone(),
                stats: data
                    .stations
                    .iter()
                    .map(|(name, station)| (name.clone(), station.to_stats()))
                    .collect(),
            }));
        }
        records.push(DailyRecord::Completion(CompletionRecord {
            total_departed: self.departed,
            total_overflowed: self.overflowed,
            ignored_warm_up: self.ignored,
            simulated_seconds: secs_f64(self.finished_at),
        }));
        records
    }

    /// Write all records as NDJSON.
    pub fn write_to(&self, writer: impl Write) -> io::Result<()> {
        let mut writer = BufWriter::new(writer);
        for record in self.records() {
            serde_json::to_writer(&mut writer, &record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    /// Write all records to `path`, creating parent directories.
    pub fn write_file(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.write_to(File::create(path)?)?;
        debug!(path = %path.display(), days = self.days.len(), "Wrote daily statistics");
        Ok(())
    }
}

impl RunObserver for DailyStatsCollector {
    fn on_departure(&mut self, entity: &Entity, stations: &[AnyStation]) {
        if entity.arrived_at < self.warm_up {
            self.ignored += 1;
            return;
        }
        self.departed += 1;
        let departed_at = entity.departed_at.unwrap_or_else(|| entity.last_service_end());
        let exit_day = self.days.entry(day_index(departed_at)).or_default();
        exit_day.counts.departed += 1;
        if entity.overflowed() {
            exit_day.counts.found_queue_full += 1;
            self.overflowed += 1;
        }

        let day = self.days.entry(day_index(entity.arrived_at)).or_default();
        for visit in &entity.visits {
            let Some(station) = stations.get(visit.station.index()) else {
                continue;
            };
            let bucket = day
                .stations
                .entry(station.name().to_string())
                .or_insert_with(|| StationDay {
                    sample_cap: if station.as_priority().is_some() {
                        PRIORITY_SAMPLE_CAP
                    } else {
                        SAMPLE_CAP
                    },
                    ..Default::default()
                });
            bucket.record(visit);
        }
    }

    fn on_finish(&mut self, now: Duration, stations: &[AnyStation]) {
        self.finished_at = now;
        // First day that starts at or after the warm-up cutoff.
        let first_day = self.warm_up.as_secs().div_ceil(SECONDS_PER_DAY);
        for source in stations.iter().filter_map(AnyStation::as_source) {
            for (&day, &count) in source.arrivals_by_day().range(first_day..) {
                self.days.entry(day).or_default().counts.arrived += count;
            }
        }
    }
}

/// Read day-level means back from an NDJSON file.
///
/// Every `daily_summary` contributes one value per station to the
/// `queue_time`, `service_time` and `response_time` sequences, keyed by
/// station name and by `"<station>/<class>"` for priority classes. Days
/// with no visits are skipped. Unreadable lines are logged and skipped.
pub fn read_daily_observations(path: &Path) -> io::Result<ObservationSet> {
    let reader = BufReader::new(File::open(path)?);
    let mut observations = ObservationSet::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DailyRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(error) => {
                warn!(line = number + 1, %error, "Skipping unreadable NDJSON line");
                continue;
            }
        };
        let DailyRecord::DailySummary(day) = record else {
            continue;
        };
        for (station, stats) in &day.stats {
            push_means(
                &mut observations,
                station,
                stats.visits,
                stats.queue_time,
                stats.execution_time,
            );
            for (class, c) in &stats.classes {
                let key = format!("{station}/{class}");
                push_means(&mut observations, &key, c.visits, c.queue_time, c.execution_time);
            }
        }
    }
    Ok(observations)
}

fn push_means(set: &mut ObservationSet, key: &str, visits: u64, queue: f64, execution: f64) {
    if visits == 0 {
        return;
    }
    set.push(key, QUEUE_TIME, queue);
    set.push(key, SERVICE_TIME, execution);
    set.push(key, RESPONSE_TIME, queue + execution);
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuesim_stations::TerminalSink;
    use queuesim_types::{EntityId, StationId};
    use tracing_test::traced_test;

    fn dates() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
        )
    }

    fn sinks() -> Vec<AnyStation> {
        vec![
            TerminalSink::new(StationId(0), "Desk").into(),
            TerminalSink::new(StationId(1), "End").into(),
        ]
    }

    /// Entity with one visit at `Desk`: wait `queue`, serve `service`.
    fn served(id: u64, arrived: f64, queue: f64, service: f64) -> Entity {
        let arrived_at = Duration::from_secs_f64(arrived);
        let mut entity = Entity::new(EntityId(id), StationId(0), arrived_at);
        let mut visit = VisitRecord::new(StationId(0), arrived_at, id as usize % 3);
        let start = arrived_at + Duration::from_secs_f64(queue);
        let end = start + Duration::from_secs_f64(service);
        visit.service_start_time = Some(start);
        visit.service_end_time = Some(end);
        entity.push_visit(visit);
        entity.departed_at = Some(end);
        entity
    }

    #[test]
    fn test_buckets_by_arrival_day() {
        let stations = sinks();
        let mut collector = DailyStatsCollector::new(dates(), 5);
        collector.on_departure(&served(1, 100.0, 10.0, 20.0), &stations);
        collector.on_departure(&served(2, 200.0, 30.0, 40.0), &stations);
        // Arrives day 0, leaves day 1.
        collector.on_departure(&served(3, 86_000.0, 300.0, 500.0), &stations);
        collector.on_finish(Duration::from_secs(200_000), &stations);

        let records = collector.records();
        assert_eq!(records.len(), 4);
        let DailyRecord::DailySummary(day0) = &records[1] else {
            panic!("expected a daily summary");
        };
        assert_eq!(day0.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(day0.summary.departed, 2);
        let desk = &day0.stats["Desk"];
        assert_eq!(desk.visits, 3);
        assert!((desk.queue_time - 340.0 / 3.0).abs() < 1e-6);
        assert!((desk.execution_time - 560.0 / 3.0).abs() < 1e-6);

        let DailyRecord::DailySummary(day1) = &records[2] else {
            panic!("expected a daily summary");
        };
        assert_eq!(day1.summary.departed, 1);
        assert!(day1.stats.is_empty());
        assert!(matches!(
            records[3],
            DailyRecord::Completion(CompletionRecord { total_departed: 3, .. })
        ));
    }

    #[test]
    fn test_raw_samples_are_thinned_and_capped() {
        let stations = sinks();
        let mut collector = DailyStatsCollector::new(dates(), 5);
        for i in 0..12_000 {
            collector.on_departure(&served(i, 1.0, 1.0, 1.0), &stations);
        }
        let records = collector.records();
        let DailyRecord::DailySummary(day) = &records[1] else {
            panic!("expected a daily summary");
        };
        let desk = &day.stats["Desk"];
        assert_eq!(desk.visits, 12_000);
        assert_eq!(desk.samples.queue_time.len(), SAMPLE_CAP);
    }

    #[test]
    fn test_warm_up_departures_ignored() {
        let stations = sinks();
        let mut collector =
            DailyStatsCollector::new(dates(), 5).with_warm_up(Duration::from_secs(86_400));
        collector.on_departure(&served(1, 100.0, 1.0, 1.0), &stations);
        collector.on_departure(&served(2, 90_000.0, 1.0, 1.0), &stations);
        assert_eq!(collector.ignored(), 1);
        assert_eq!(collector.departed(), 1);
    }

    #[traced_test]
    #[test]
    fn test_ndjson_round_trip_to_observations() {
        let stations = sinks();
        let mut collector = DailyStatsCollector::new(dates(), 5).with_replica(2);
        collector.on_departure(&served(1, 100.0, 10.0, 20.0), &stations);
        collector.on_departure(&served(2, 90_000.0, 30.0, 40.0), &stations);
        collector.on_finish(Duration::from_secs(100_000), &stations);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("daily.ndjson");
        collector.write_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains(r#""type":"metadata""#));
        assert!(lines[0].contains(r#""replica_id":2"#));
        assert!(lines[1].contains(r#""type":"daily_summary""#));
        assert!(lines[3].contains(r#""type":"completion""#));

        std::fs::write(&path, format!("{text}not json\n")).unwrap();
        let observations = read_daily_observations(&path).unwrap();
        assert_eq!(observations.get("Desk", QUEUE_TIME), Some(&[10.0, 30.0][..]));
        assert_eq!(observations.get("Desk", RESPONSE_TIME), Some(&[30.0, 70.0][..]));
        assert!(logs_contain("Skipping unreadable NDJSON line"));
    }
}
