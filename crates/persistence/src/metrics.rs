//! Database metrics collection.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Times a database operation and records its duration on drop-free `finish`.
///
/// ```ignore
/// let timer = QueryTimer::start("find_trip_by_id");
/// let result = sqlx::query_as(...).fetch_optional(&pool).await;
/// timer.finish();
/// ```
pub struct QueryTimer {
    query: &'static str,
    started: Instant,
}

impl QueryTimer {
    pub fn start(query: &'static str) -> Self {
        Self {
            query,
            started: Instant::now(),
        }
    }

    pub fn finish(self) {
        histogram!("db_query_duration_seconds", "query" => self.query)
            .record(self.started.elapsed().as_secs_f64());
    }
}

/// Export connection pool gauges. Called periodically by a background job.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("db_connections_total").set(size as f64);
    gauge!("db_connections_idle").set(idle as f64);
    gauge!("db_connections_active").set(size.saturating_sub(idle) as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_measures_elapsed() {
        let timer = QueryTimer::start("test_query");
        assert_eq!(timer.query, "test_query");
        assert!(timer.started.elapsed().as_secs() < 1);
        timer.finish();
    }
}
