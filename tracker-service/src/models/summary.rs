//! Dashboard aggregates over a project's usage logs.

use super::UsageLog;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Reporting window ending now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    Last7Days,
    Last30Days,
    Last90Days,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
            TimeRange::Last90Days => "90d",
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            TimeRange::Last7Days => 7,
            TimeRange::Last30Days => 30,
            TimeRange::Last90Days => 90,
        }
    }

    /// Start of the current window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }

    /// Start of the window preceding the current one.
    pub fn previous_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(2 * self.days())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(TimeRange::Last7Days),
            "30d" => Ok(TimeRange::Last30Days),
            "90d" => Ok(TimeRange::Last90Days),
            _ => Err(format!("Invalid range: {} (expected 7d, 30d or 90d)", s)),
        }
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Headline metrics for one window. Token and latency sums saturate at
/// `i64::MAX`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub requests: u64,
    pub successful_requests: u64,
    pub tokens: i64,
    pub cost: f64,
    pub avg_latency_ms: i64,
    /// Percentage of requests whose status code is not 200.
    pub error_rate: f64,
}

impl PeriodTotals {
    fn from_logs<'a>(logs: impl IntoIterator<Item = &'a UsageLog>) -> Self {
        let mut totals = PeriodTotals::default();
        let mut latency_sum: i64 = 0;

        for log in logs {
            totals.requests += 1;
            if log.is_success() {
                totals.successful_requests += 1;
            }
            totals.tokens = totals.tokens.saturating_add(log.total_tokens);
            totals.cost += log.total_cost;
            latency_sum = latency_sum.saturating_add(log.request_duration_ms);
        }

        if totals.requests > 0 {
            let n = totals.requests as f64;
            totals.avg_latency_ms = (latency_sum as f64 / n).round() as i64;
            totals.error_rate = (totals.requests - totals.successful_requests) as f64 / n * 100.0;
        }

        totals
    }
}

/// Percent change of the current window against the previous one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodChange {
    pub requests: f64,
    pub tokens: f64,
    pub cost: f64,
    pub latency: f64,
}

fn change_percent(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

impl PeriodChange {
    fn between(current: &PeriodTotals, previous: &PeriodTotals) -> Self {
        Self {
            requests: change_percent(current.requests as f64, previous.requests as f64),
            tokens: change_percent(current.tokens as f64, previous.tokens as f64),
            cost: change_percent(current.cost, previous.cost),
            latency: change_percent(
                current.avg_latency_ms as f64,
                previous.avg_latency_ms as f64,
            ),
        }
    }
}

/// One chart point per UTC day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub requests: u64,
    pub tokens: i64,
    pub cost: f64,
    pub avg_latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelUsage {
    pub model: String,
    pub requests: u64,
    pub avg_tokens: i64,
    pub avg_latency_ms: i64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderUsage {
    pub provider: String,
    pub requests: u64,
}

/// Everything the project dashboard renders for a time range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub range: TimeRange,
    pub current: PeriodTotals,
    pub previous: PeriodTotals,
    pub change: PeriodChange,
    pub daily: Vec<DailyUsage>,
    pub by_model: Vec<ModelUsage>,
    pub by_provider: Vec<ProviderUsage>,
}

#[derive(Default)]
struct Accumulator {
    requests: u64,
    tokens: i64,
    cost: f64,
    latency: i64,
}

impl Accumulator {
    fn add(&mut self, log: &UsageLog) {
        self.requests += 1;
        self.tokens = self.tokens.saturating_add(log.total_tokens);
        self.cost += log.total_cost;
        self.latency = self.latency.saturating_add(log.request_duration_ms);
    }

    fn mean(&self, sum: i64) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            sum as f64 / self.requests as f64
        }
    }
}

impl UsageSummary {
    /// Aggregate logs relative to `now`. Logs older than the previous window
    /// are ignored.
    pub fn from_logs(logs: &[UsageLog], range: TimeRange, now: DateTime<Utc>) -> Self {
        let cutoff = range.cutoff(now);
        let previous_cutoff = range.previous_cutoff(now);

        let current_logs: Vec<&UsageLog> =
            logs.iter().filter(|log| log.timestamp >= cutoff).collect();
        let previous_logs = logs
            .iter()
            .filter(|log| log.timestamp >= previous_cutoff && log.timestamp < cutoff);

        let current = PeriodTotals::from_logs(current_logs.iter().copied());
        let previous = PeriodTotals::from_logs(previous_logs);
        let change = PeriodChange::between(&current, &previous);

        let mut by_day: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();
        let mut by_model: HashMap<&str, Accumulator> = HashMap::new();
        let mut by_provider: HashMap<&str, u64> = HashMap::new();

        for log in &current_logs {
            by_day.entry(log.timestamp.date_naive()).or_default().add(log);
            by_model.entry(log.model.as_str()).or_default().add(log);
            *by_provider.entry(log.provider.as_str()).or_default() += 1;
        }

        let daily = by_day
            .into_iter()
            .map(|(date, acc)| DailyUsage {
                date,
                requests: acc.requests,
                tokens: acc.tokens,
                cost: acc.cost,
                avg_latency_ms: acc.mean(acc.latency),
            })
            .collect();

        let mut by_model: Vec<ModelUsage> = by_model
            .into_iter()
            .map(|(model, acc)| ModelUsage {
                model: model.to_string(),
                requests: acc.requests,
                avg_tokens: acc.mean(acc.tokens).round() as i64,
                avg_latency_ms: acc.mean(acc.latency).round() as i64,
                total_cost: acc.cost,
            })
            .collect();
        by_model.sort_by(|a, b| b.requests.cmp(&a.requests).then_with(|| a.model.cmp(&b.model)));

        let mut by_provider: Vec<ProviderUsage> = by_provider
            .into_iter()
            .map(|(provider, requests)| ProviderUsage {
                provider: provider.to_string(),
                requests,
            })
            .collect();
        by_provider.sort_by(|a, b| {
            b.requests
                .cmp(&a.requests)
                .then_with(|| a.provider.cmp(&b.provider))
        });

        Self {
            range,
            current,
            previous,
            change,
            daily,
            by_model,
            by_provider,
        }
    }
}
