//! Search comparison telemetry
//!
//! The shadow search exists only to produce these observations: per-backend
//! latency and the overlap between the two backends' top-k id sets. Sinks
//! are append-only aggregates shared across in-flight queries; recording
//! never fails and never affects a response.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// One query's comparison between the primary and shadow result sets
///
/// Transient: built per query, logged and folded into the sinks, never
/// persisted.
#[derive(Debug)]
pub struct ShadowComparisonResult {
    /// Ids returned by the primary search
    pub primary_ids: HashSet<String>,
    /// Ids returned by the shadow search
    pub shadow_ids: HashSet<String>,
    /// `|primary ∩ shadow| / top_k`, 0.0 when `top_k` is 0
    pub overlap_ratio: f64,
    /// Primary search wall-clock time
    pub primary_latency: Duration,
    /// Shadow search wall-clock time
    pub shadow_latency: Duration,
}

impl ShadowComparisonResult {
    fn new(
        primary_ids: HashSet<String>,
        shadow_ids: HashSet<String>,
        primary_latency: Duration,
        shadow_latency: Duration,
        top_k: usize,
    ) -> Self {
        let intersection = primary_ids.intersection(&shadow_ids).count();
        let overlap_ratio = if top_k > 0 {
            intersection as f64 / top_k as f64
        } else {
            0.0
        };
        Self {
            primary_ids,
            shadow_ids,
            overlap_ratio,
            primary_latency,
            shadow_latency,
        }
    }
}

#[derive(Default)]
struct LatencyAccumulator {
    count: u64,
    total_ms: u64,
    max_ms: u64,
}

#[derive(Default)]
struct OverlapAccumulator {
    observations: u64,
    sum: f64,
    last: Option<f64>,
}

/// Append-only comparison sinks, safe under concurrent writers
pub struct SearchMetrics {
    primary_backend: String,
    shadow_backend: String,
    latencies: DashMap<String, LatencyAccumulator>,
    overlap: RwLock<OverlapAccumulator>,
}

impl SearchMetrics {
    /// Create sinks labelled with the two backend identities
    pub fn new(primary_backend: impl Into<String>, shadow_backend: impl Into<String>) -> Self {
        Self {
            primary_backend: primary_backend.into(),
            shadow_backend: shadow_backend.into(),
            latencies: DashMap::new(),
            overlap: RwLock::new(OverlapAccumulator::default()),
        }
    }

    /// Record one query's search observations
    ///
    /// The primary latency is always observed. Shadow latency and overlap
    /// are observed only when the shadow search produced a result; a failed
    /// or timed-out shadow suppresses them and nothing else.
    pub fn record(
        &self,
        primary_ids: &HashSet<String>,
        shadow_ids: Option<&HashSet<String>>,
        primary_latency: Duration,
        shadow_latency: Option<Duration>,
        top_k: usize,
    ) {
        self.observe_latency(&self.primary_backend, primary_latency);

        let (shadow_ids, shadow_latency) = match (shadow_ids, shadow_latency) {
            (Some(ids), Some(latency)) => (ids, latency),
            _ => return,
        };

        self.observe_latency(&self.shadow_backend, shadow_latency);

        let comparison = ShadowComparisonResult::new(
            primary_ids.clone(),
            shadow_ids.clone(),
            primary_latency,
            shadow_latency,
            top_k,
        );

        {
            let mut overlap = self.overlap.write();
            overlap.observations += 1;
            overlap.sum += comparison.overlap_ratio;
            overlap.last = Some(comparison.overlap_ratio);
        }

        tracing::info!(
            "Search comparison: {}={}ms {}={}ms overlap={:.1}%",
            self.primary_backend,
            comparison.primary_latency.as_millis(),
            self.shadow_backend,
            comparison.shadow_latency.as_millis(),
            comparison.overlap_ratio * 100.0
        );
    }

    fn observe_latency(&self, backend: &str, latency: Duration) {
        let ms = latency.as_millis() as u64;
        let mut entry = self.latencies.entry(backend.to_string()).or_default();
        entry.count += 1;
        entry.total_ms += ms;
        entry.max_ms = entry.max_ms.max(ms);
    }

    /// Export the current aggregate state
    pub fn snapshot(&self) -> MetricsSnapshot {
        let search_latency = self
            .latencies
            .iter()
            .map(|entry| {
                let stats = entry.value();
                (
                    entry.key().clone(),
                    LatencyStats {
                        count: stats.count,
                        mean_ms: if stats.count > 0 {
                            stats.total_ms as f64 / stats.count as f64
                        } else {
                            0.0
                        },
                        max_ms: stats.max_ms,
                    },
                )
            })
            .collect();

        let overlap = self.overlap.read();
        MetricsSnapshot {
            search_latency,
            search_overlap: OverlapStats {
                observations: overlap.observations,
                last_ratio: overlap.last,
                mean_ratio: if overlap.observations > 0 {
                    Some(overlap.sum / overlap.observations as f64)
                } else {
                    None
                },
            },
        }
    }
}

/// Aggregated latency observations for one backend
#[derive(Debug, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_ms: f64,
    pub max_ms: u64,
}

/// Aggregated overlap observations
#[derive(Debug, Clone, Serialize)]
pub struct OverlapStats {
    pub observations: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_ratio: Option<f64>,
}

/// Exported view of the comparison sinks
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub search_latency: BTreeMap<String, LatencyStats>,
    pub search_overlap: OverlapStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_overlap_ratio_uses_top_k_denominator() {
        let metrics = SearchMetrics::new("qdrant", "pgvector");
        metrics.record(
            &ids(&["a", "b", "c"]),
            Some(&ids(&["a", "b"])),
            Duration::from_millis(5),
            Some(Duration::from_millis(9)),
            3,
        );

        let snapshot = metrics.snapshot();
        let last = snapshot.search_overlap.last_ratio.unwrap();
        assert!((last - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(snapshot.search_latency["qdrant"].count, 1);
        assert_eq!(snapshot.search_latency["pgvector"].count, 1);
    }

    #[test]
    fn test_empty_shadow_set_gives_zero_overlap() {
        let metrics = SearchMetrics::new("qdrant", "pgvector");
        metrics.record(
            &ids(&["a", "b"]),
            Some(&HashSet::new()),
            Duration::from_millis(5),
            Some(Duration::from_millis(9)),
            5,
        );

        assert_eq!(metrics.snapshot().search_overlap.last_ratio, Some(0.0));
    }

    #[test]
    fn test_zero_top_k_guard() {
        // Validation keeps top_k >= 1 upstream; the recorder still must not divide by zero
        let metrics = SearchMetrics::new("qdrant", "pgvector");
        metrics.record(
            &ids(&["a"]),
            Some(&ids(&["a"])),
            Duration::from_millis(1),
            Some(Duration::from_millis(1)),
            0,
        );

        assert_eq!(metrics.snapshot().search_overlap.last_ratio, Some(0.0));
    }

    #[test]
    fn test_absent_shadow_records_primary_only() {
        let metrics = SearchMetrics::new("qdrant", "pgvector");
        metrics.record(&ids(&["a"]), None, Duration::from_millis(7), None, 3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.search_latency["qdrant"].count, 1);
        assert!(!snapshot.search_latency.contains_key("pgvector"));
        assert_eq!(snapshot.search_overlap.observations, 0);
        assert!(snapshot.search_overlap.last_ratio.is_none());
    }

    #[test]
    fn test_overlap_ratio_bounded() {
        let metrics = SearchMetrics::new("qdrant", "pgvector");
        for top_k in 1..=20usize {
            let id_set = ids(&["a", "b", "c"]);
            metrics.record(
                &id_set,
                Some(&id_set.clone()),
                Duration::from_millis(1),
                Some(Duration::from_millis(1)),
                top_k,
            );
            let last = metrics.snapshot().search_overlap.last_ratio.unwrap();
            assert!((0.0..=1.0).contains(&last), "ratio {} out of range", last);
        }
    }

    #[test]
    fn test_concurrent_recording() {
        let metrics = std::sync::Arc::new(SearchMetrics::new("qdrant", "pgvector"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = std::sync::Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record(
                            &ids(&["a", "b"]),
                            Some(&ids(&["b"])),
                            Duration::from_millis(2),
                            Some(Duration::from_millis(3)),
                            2,
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.search_latency["qdrant"].count, 800);
        assert_eq!(snapshot.search_overlap.observations, 800);
    }
}
