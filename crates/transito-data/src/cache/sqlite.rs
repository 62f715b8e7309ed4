//! SQLite cache for monthly accident summaries.

use crate::columns;
use crate::error::{DataError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// SQLite cache keyed by the year of the source archive.
#[derive(Debug)]
pub struct AccidentCache {
    conn: Connection,
}

/// Bookkeeping for one cached archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedYear {
    /// Year of the source archive
    pub year: i32,
    /// Where the archive came from (URL or path)
    pub source: String,
    /// Rows the parser dropped
    pub skipped_rows: usize,
    /// When the summary was stored
    pub cached_at: DateTime<Utc>,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of archives cached
    pub cached_years: usize,
    /// Number of monthly summary rows
    pub summary_rows: usize,
}

impl AccidentCache {
    /// Open (or create) a cache at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS accident_summary (
                source_year INTEGER NOT NULL,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                state TEXT NOT NULL,
                accidents REAL NOT NULL,
                fatal_accidents REAL NOT NULL,
                injured REAL NOT NULL,
                prf_deaths REAL NOT NULL,
                PRIMARY KEY (source_year, year, month, state)
            );

            CREATE TABLE IF NOT EXISTS cached_years (
                year INTEGER PRIMARY KEY,
                source TEXT NOT NULL,
                skipped_rows INTEGER NOT NULL,
                cached_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Whether the archive for `year` is cached.
    pub fn has_year(&self, year: i32) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cached_years WHERE year = ?1",
            params![year],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Bookkeeping for a cached year.
    pub fn get_year_info(&self, year: i32) -> Result<Option<CachedYear>> {
        let info = self
            .conn
            .query_row(
                "SELECT year, source, skipped_rows, cached_at FROM cached_years WHERE year = ?1",
                params![year],
                |row| {
                    Ok((
                        row.get::<_, i32>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        info.map(|(year, source, skipped, cached_at)| {
            let cached_at = DateTime::parse_from_rfc3339(&cached_at)
                .map_err(|e| DataError::Cache(format!("bad timestamp for {year}: {e}")))?
                .with_timezone(&Utc);
            Ok(CachedYear {
                year,
                source,
                skipped_rows: usize::try_from(skipped).unwrap_or(0),
                cached_at,
            })
        })
        .transpose()
    }

    /// Load the summaries of the given archive years.
    ///
    /// Returns a DataFrame with the columns produced by
    /// [`crate::prf::summarize_monthly`], sorted by year, month and state.
    pub fn get_years(&self, years: &[i32]) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(
            "SELECT year, month, state, accidents, fatal_accidents, injured, prf_deaths
             FROM accident_summary
             WHERE source_year = ?1
             ORDER BY year, month, state",
        )?;

        let mut year_col = Vec::new();
        let mut month_col = Vec::new();
        let mut state_col = Vec::new();
        let mut accidents = Vec::new();
        let mut fatal = Vec::new();
        let mut injured = Vec::new();
        let mut deaths = Vec::new();

        for source_year in years {
            let rows = stmt.query_map(params![source_year], |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                ))
            })?;

            for row in rows {
                let (y, m, s, a, f, i, d) = row?;
                year_col.push(y);
                month_col.push(m);
                state_col.push(s);
                accidents.push(a);
                fatal.push(f);
                injured.push(i);
                deaths.push(d);
            }
        }

        let df = DataFrame::new(vec![
            Column::new(columns::YEAR.into(), year_col),
            Column::new(columns::MONTH.into(), month_col),
            Column::new(columns::STATE.into(), state_col),
            Column::new(columns::ACCIDENTS.into(), accidents),
            Column::new(columns::FATAL_ACCIDENTS.into(), fatal),
            Column::new(columns::INJURED.into(), injured),
            Column::new(columns::PRF_DEATHS.into(), deaths),
        ])?;

        Ok(df)
    }

    /// Store the summary of an archive, replacing any previous copy.
    pub fn put_year(
        &self,
        year: i32,
        df: &DataFrame,
        source: &str,
        skipped_rows: usize,
    ) -> Result<()> {
        let years = df.column(columns::YEAR)?.i32()?;
        let months = df.column(columns::MONTH)?.i32()?;
        let states = df.column(columns::STATE)?.str()?;
        let accidents = df.column(columns::ACCIDENTS)?.f64()?;
        let fatal = df.column(columns::FATAL_ACCIDENTS)?.f64()?;
        let injured = df.column(columns::INJURED)?.f64()?;
        let deaths = df.column(columns::PRF_DEATHS)?.f64()?;

        let missing = |name: &str| DataError::Cache(format!("null {name} in accident summary"));

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM accident_summary WHERE source_year = ?1",
            params![year],
        )?;

        for i in 0..df.height() {
            tx.execute(
                "INSERT INTO accident_summary
                 (source_year, year, month, state, accidents, fatal_accidents, injured, prf_deaths)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    year,
                    years.get(i).ok_or_else(|| missing(columns::YEAR))?,
                    months.get(i).ok_or_else(|| missing(columns::MONTH))?,
                    states.get(i).ok_or_else(|| missing(columns::STATE))?,
                    accidents.get(i).ok_or_else(|| missing(columns::ACCIDENTS))?,
                    fatal
                        .get(i)
                        .ok_or_else(|| missing(columns::FATAL_ACCIDENTS))?,
                    injured.get(i).ok_or_else(|| missing(columns::INJURED))?,
                    deaths.get(i).ok_or_else(|| missing(columns::PRF_DEATHS))?,
                ],
            )?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO cached_years (year, source, skipped_rows, cached_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                year,
                source,
                i64::try_from(skipped_rows).unwrap_or(i64::MAX),
                Utc::now().to_rfc3339()
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Remove every cached summary.
    pub fn clear_all(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM accident_summary; DELETE FROM cached_years;")?;
        Ok(())
    }

    /// Remove the summary of one archive year.
    pub fn clear_year(&self, year: i32) -> Result<()> {
        self.conn.execute(
            "DELETE FROM accident_summary WHERE source_year = ?1",
            params![year],
        )?;
        self.conn
            .execute("DELETE FROM cached_years WHERE year = ?1", params![year])?;
        Ok(())
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let cached_years = self.count("SELECT COUNT(*) FROM cached_years")?;
        let summary_rows = self.count("SELECT COUNT(*) FROM accident_summary")?;

        Ok(CacheStats {
            cached_years: usize::try_from(cached_years).unwrap_or(0),
            summary_rows: usize::try_from(summary_rows).unwrap_or(0),
        })
    }

    fn count(&self, sql: &str) -> Result<i64> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prf::{AccidentRecord, summarize_monthly};
    use chrono::NaiveDate;
    use transito_geo::State;

    fn sample_summary() -> DataFrame {
        let records = vec![
            AccidentRecord {
                date: NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(),
                state: State::BA,
                deaths: 1,
                injured: 2,
            },
            AccidentRecord {
                date: NaiveDate::from_ymd_opt(2022, 4, 9).unwrap(),
                state: State::PE,
                deaths: 0,
                injured: 1,
            },
        ];
        summarize_monthly(&records).unwrap()
    }

    #[test]
    fn test_cache_initialization() {
        let cache = AccidentCache::in_memory().unwrap();
        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.cached_years, 0);
        assert_eq!(stats.summary_rows, 0);
    }

    #[test]
    fn test_put_and_get_year() {
        let cache = AccidentCache::in_memory().unwrap();
        let summary = sample_summary();

        assert!(!cache.has_year(2022).unwrap());
        cache
            .put_year(2022, &summary, "datatran2022.zip", 3)
            .unwrap();
        assert!(cache.has_year(2022).unwrap());

        let loaded = cache.get_years(&[2022]).unwrap();
        assert_eq!(loaded.height(), summary.height());
        assert_eq!(loaded.get_column_names(), summary.get_column_names());

        let info = cache.get_year_info(2022).unwrap().unwrap();
        assert_eq!(info.skipped_rows, 3);
        assert_eq!(info.source, "datatran2022.zip");
    }

    #[test]
    fn test_put_year_replaces() {
        let cache = AccidentCache::in_memory().unwrap();
        let summary = sample_summary();

        cache.put_year(2022, &summary, "a", 0).unwrap();
        cache.put_year(2022, &summary, "b", 0).unwrap();

        let stats = cache.get_stats().unwrap();
        assert_eq!(stats.cached_years, 1);
        assert_eq!(stats.summary_rows, summary.height());
    }

    #[test]
    fn test_clear_operations() {
        let cache = AccidentCache::in_memory().unwrap();
        let summary = sample_summary();
        cache.put_year(2021, &summary, "a", 0).unwrap();
        cache.put_year(2022, &summary, "b", 0).unwrap();

        cache.clear_year(2021).unwrap();
        assert!(!cache.has_year(2021).unwrap());
        assert!(cache.has_year(2022).unwrap());

        cache.clear_all().unwrap();
        assert_eq!(cache.get_stats().unwrap().cached_years, 0);
        assert!(cache.get_year_info(2022).unwrap().is_none());
    }
}
