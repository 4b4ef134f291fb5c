//! # Mock Generator
//!
//! Seeded generator of report-server error logs. The same seed, count, span
//! and end instant always produce the same records, which keeps demos and
//! tests reproducible.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fl_core::LogRecord;

use crate::RecordSource;

struct Host {
    name: &'static str,
    mode: &'static str,
    path: &'static str,
    port: i64,
    version: &'static str,
}

const HOSTS: &[Host] = &[
    Host { name: "rs-prod-01", mode: "production", path: "/opt/reportserver/bin", port: 8443, version: "12.0.1" },
    Host { name: "rs-prod-02", mode: "production", path: "/opt/reportserver/bin", port: 8443, version: "12.0.1" },
    Host { name: "rs-prod-03", mode: "production", path: "/srv/rs/current/bin", port: 9443, version: "11.3.4" },
    Host { name: "rs-uat-01", mode: "uat", path: "C:\\ReportServer\\bin", port: 8080, version: "12.1.0-rc2" },
    Host { name: "rs-dev-01", mode: "development", path: "/home/build/rs/bin", port: 8080, version: "12.2.0-dev" },
];

const CONFIGS: &[&str] = &["default", "finance", "hr-secure", "batch-nightly"];

const REPORTS: &[&str] = &[
    "/Finance/Quarterly/Summary",
    "/Finance/Daily/Cash Position",
    "/HR/Headcount",
    "/Sales/Pipeline/Regional",
    "/Sales/Pipeline/Forecast",
    "/Operations/Uptime",
];

/// Error code and message. Repeated entries weight the draw.
const ERRORS: &[(i64, &str)] = &[
    (500, "Internal error while rendering report"),
    (500, "Internal error while rendering report"),
    (500, "NullReferenceException in dataset evaluation"),
    (503, "Data source unavailable: connection refused"),
    (408, "Query timed out after 300 seconds"),
    (404, "Report definition not found"),
    (401, "User is not authorized to view this report"),
    (422, "Parameter 'Region' has an invalid value"),
];

const USERS: u32 = 40;

#[derive(Debug, Clone)]
pub struct MockGenerator {
    pub seed: u64,
    pub count: usize,
    /// How far back from `end` records reach.
    pub span: Duration,
    pub end: DateTime<Utc>,
}

impl MockGenerator {
    pub fn new(seed: u64, count: usize, span: Duration, end: DateTime<Utc>) -> Self {
        Self {
            seed,
            count,
            span,
            end,
        }
    }

    /// Records in ascending timestamp order, all inside `[end - span, end]`.
    pub fn generate(&self) -> Vec<LogRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let start = self.end - self.span;
        let span_secs = self.span.num_seconds().max(1);

        // One process start per host, somewhat before the window opens.
        let starts: Vec<DateTime<Utc>> = HOSTS
            .iter()
            .map(|_| start - Duration::minutes(rng.gen_range(30..72 * 60)))
            .collect();

        let mut records: Vec<LogRecord> = (0..self.count)
            .map(|_| {
                let host_idx = rng.gen_range(0..HOSTS.len());
                let host = &HOSTS[host_idx];
                let (code, message) = *pick(&mut rng, ERRORS);
                LogRecord {
                    timestamp: Some(start + Duration::seconds(rng.gen_range(0..=span_secs))),
                    host_name: Some(host.name.to_string()),
                    path: Some(host.path.to_string()),
                    port: Some(host.port),
                    version: Some(host.version.to_string()),
                    server_mode: Some(host.mode.to_string()),
                    server_start: Some(starts[host_idx]),
                    config_name: Some(pick(&mut rng, CONFIGS).to_string()),
                    user_id: Some(format!("user-{:02}", rng.gen_range(0..USERS))),
                    report_name: Some(pick(&mut rng, REPORTS).to_string()),
                    error_number: Some(code),
                    query_id: Some(format!("q-{:08x}", rng.gen::<u32>())),
                    message: Some(message.to_string()),
                }
            })
            .collect();

        records.sort_by_key(|r| r.timestamp);
        records
    }
}

impl RecordSource for MockGenerator {
    fn describe(&self) -> String {
        format!(
            "mock generator (seed {}, {} records over {} hours)",
            self.seed,
            self.count,
            self.span.num_hours()
        )
    }

    fn load(&self) -> std::io::Result<Vec<LogRecord>> {
        let records = self.generate();
        tracing::info!("Generated {} mock records (seed {})", records.len(), self.seed);
        Ok(records)
    }
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fl_core::FieldId;

    fn generator(seed: u64) -> MockGenerator {
        MockGenerator::new(
            seed,
            500,
            Duration::days(7),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_same_seed_same_records() {
        assert_eq!(generator(7).generate(), generator(7).generate());
        assert_ne!(generator(7).generate(), generator(8).generate());
    }

    #[test]
    fn test_records_are_ordered_and_inside_span() {
        let g = generator(1);
        let records = g.generate();
        assert_eq!(records.len(), 500);
        let start = g.end - g.span;
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(records
            .iter()
            .all(|r| r.timestamp.map_or(false, |ts| ts >= start && ts <= g.end)));
    }

    #[test]
    fn test_every_field_is_filled() {
        for record in generator(3).generate().iter().take(50) {
            for field in FieldId::ALL {
                assert!(record.value(field).is_some(), "{} missing", field);
            }
            assert!(record.server_start < record.timestamp);
        }
    }

    #[test]
    fn test_load_matches_generate() {
        let g = generator(11);
        assert_eq!(g.load().unwrap(), g.generate());
    }
}
