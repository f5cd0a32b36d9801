use moka::future::Cache;
use sqlx::MySqlPool;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;
use crate::model::holiday::{Holiday, HolidayCalendar};

/// Per-year holiday calendars, loaded from the `holidays` table on first use.
#[derive(Clone)]
pub struct HolidayCache {
    calendars: Cache<i32, Arc<HolidayCalendar>>,
}

impl HolidayCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            calendars: Cache::builder()
                .max_capacity(16) // a handful of years is all payroll ever touches
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn calendar(&self, pool: &MySqlPool, year: i32) -> Result<Arc<HolidayCalendar>, AppError> {
        self.calendars
            .try_get_with(year, async move { load_year(pool, year).await.map(Arc::new) })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, year, "Failed to load holiday calendar");
                AppError::Internal
            })
    }

    /// Drop a cached year after its holidays were edited.
    pub async fn invalidate(&self, year: i32) {
        self.calendars.invalidate(&year).await;
    }
}

async fn load_year(pool: &MySqlPool, year: i32) -> Result<HolidayCalendar, sqlx::Error> {
    let holidays = sqlx::query_as::<_, Holiday>(
        r#"
        SELECT date, kind
        FROM holidays
        WHERE YEAR(date) = ?
        "#,
    )
    .bind(year)
    .fetch_all(pool)
    .await?;

    tracing::debug!(year, count = holidays.len(), "Holiday calendar loaded");
    Ok(HolidayCalendar::new(holidays))
}
