use crate::db::Database;
use crate::error::Result;
use crate::models::{HistoricalRecord, QualityGrade, Season};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Row};
use tracing::warn;

// Crop History Queries

impl Database {
    pub fn insert_history_record(&self, record: &HistoricalRecord) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO crop_history
                    (crop, season, year, yield_t_ha, quality, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    record.crop,
                    record.season.as_str(),
                    record.year,
                    record.yield_t_ha,
                    record.quality.as_str(),
                    record.created_at.to_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Most recent records first, capped at `limit` season/year entries.
    pub fn get_history(&self, limit: usize) -> Result<Vec<HistoricalRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM crop_history ORDER BY year DESC, season DESC LIMIT ?1",
            )?;
            let records = stmt
                .query_map([limit as i64], row_to_history_record)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(records)
        })
    }

    pub fn get_history_for_crop(&self, crop: &str) -> Result<Vec<HistoricalRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM crop_history WHERE crop = ?1 ORDER BY year DESC, season DESC",
            )?;
            let records = stmt
                .query_map([crop], row_to_history_record)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(records)
        })
    }

    pub fn delete_history_record(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM crop_history WHERE id = ?1", [id])?;
            if removed == 0 {
                return Err(crate::error::AdvisorError::NotFound(format!(
                    "No history record with id {}",
                    id
                )));
            }
            Ok(())
        })
    }
}

fn row_to_history_record(row: &Row) -> rusqlite::Result<HistoricalRecord> {
    let season_str: String = row.get("season")?;
    let quality_str: String = row.get("quality")?;
    let created_at_str: String = row.get("created_at")?;

    let season = Season::from_str(&season_str).unwrap_or_else(|| {
        warn!(season = %season_str, "Unknown season in database, defaulting to annual");
        Season::Annual
    });
    let quality = QualityGrade::from_str(&quality_str).unwrap_or_else(|| {
        warn!(quality = %quality_str, "Unknown quality grade in database, defaulting to average");
        QualityGrade::Average
    });

    Ok(HistoricalRecord {
        id: Some(row.get("id")?),
        crop: row.get("crop")?,
        season,
        year: row.get("year")?,
        yield_t_ha: row.get("yield_t_ha")?,
        quality,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

// Result Cache Queries
//
// Expired and absent keys are an indistinguishable miss. TTL is enforced on
// read, so stale rows cost nothing until the next lookup.

impl Database {
    pub fn cache_get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let row: Option<(String, String)> = conn
                .query_row(
                    "SELECT payload, expires_at FROM api_cache WHERE cache_key = ?1",
                    [key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((payload, expires_at_str)) = row else {
                return Ok(None);
            };

            let expires_at = DateTime::parse_from_rfc3339(&expires_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());

            if expires_at > Utc::now() {
                Ok(Some(payload))
            } else {
                Ok(None)
            }
        })
    }

    pub fn cache_set(&self, key: &str, payload: &str, ttl_seconds: i64) -> Result<()> {
        let expires_at = Utc::now() + Duration::seconds(ttl_seconds);
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO api_cache (cache_key, payload, expires_at, stored_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    key,
                    payload,
                    expires_at.to_rfc3339(),
                    Utc::now().to_rfc3339()
                ],
            )?;
            Ok(())
        })
    }

    pub fn cache_delete(&self, key: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM api_cache WHERE cache_key = ?1", [key])?;
            Ok(())
        })
    }

    /// Drop all expired rows. Housekeeping only; correctness never depends
    /// on this running.
    pub fn cache_evict_expired(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM api_cache WHERE expires_at <= ?1",
                [Utc::now().to_rfc3339()],
            )?;
            Ok(removed)
        })
    }
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QualityGrade, Season};

    #[test]
    fn history_round_trip() {
        let db = Database::open_in_memory().unwrap();

        let record =
            HistoricalRecord::new("Wheat", Season::Rabi, 2024, 3.4, QualityGrade::Good);
        db.insert_history_record(&record).unwrap();

        let loaded = db.get_history(5).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].crop, "Wheat");
        assert_eq!(loaded[0].season, Season::Rabi);
        assert_eq!(loaded[0].year, 2024);
        assert_eq!(loaded[0].quality, QualityGrade::Good);
        assert!((loaded[0].yield_t_ha - 3.4).abs() < f64::EPSILON);
    }

    #[test]
    fn history_filtered_by_crop() {
        let db = Database::open_in_memory().unwrap();
        db.insert_history_record(&HistoricalRecord::new(
            "Wheat",
            Season::Rabi,
            2023,
            3.0,
            QualityGrade::Average,
        ))
        .unwrap();
        db.insert_history_record(&HistoricalRecord::new(
            "Rice",
            Season::Kharif,
            2023,
            4.2,
            QualityGrade::Excellent,
        ))
        .unwrap();

        let wheat = db.get_history_for_crop("Wheat").unwrap();
        assert_eq!(wheat.len(), 1);
        assert_eq!(wheat[0].crop, "Wheat");
    }

    #[test]
    fn history_limit_returns_most_recent() {
        let db = Database::open_in_memory().unwrap();
        for year in 2019..=2024 {
            db.insert_history_record(&HistoricalRecord::new(
                "Wheat",
                Season::Rabi,
                year,
                3.0,
                QualityGrade::Good,
            ))
            .unwrap();
        }

        let recent = db.get_history(5).unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].year, 2024);
        assert!(recent.iter().all(|r| r.year >= 2020));
    }

    #[test]
    fn delete_missing_record_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let err = db.delete_history_record(42).unwrap_err();
        assert!(matches!(err, crate::error::AdvisorError::NotFound(_)));
    }

    #[test]
    fn cache_round_trip() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.cache_get("weather:30.9000:75.8000").unwrap(), None);

        db.cache_set("weather:30.9000:75.8000", r#"{"temp":20.0}"#, 3600)
            .unwrap();
        assert_eq!(
            db.cache_get("weather:30.9000:75.8000").unwrap().as_deref(),
            Some(r#"{"temp":20.0}"#)
        );

        db.cache_delete("weather:30.9000:75.8000").unwrap();
        assert_eq!(db.cache_get("weather:30.9000:75.8000").unwrap(), None);
    }

    #[test]
    fn cache_expired_entry_is_a_miss() {
        let db = Database::open_in_memory().unwrap();

        db.cache_set("soil:30.9000:75.8000", "{}", 0).unwrap();
        assert_eq!(db.cache_get("soil:30.9000:75.8000").unwrap(), None);

        // Negative TTL behaves the same
        db.cache_set("soil:30.9000:75.8000", "{}", -60).unwrap();
        assert_eq!(db.cache_get("soil:30.9000:75.8000").unwrap(), None);
    }

    #[test]
    fn cache_overwrite_replaces_payload() {
        let db = Database::open_in_memory().unwrap();

        db.cache_set("k", "old", 3600).unwrap();
        db.cache_set("k", "new", 3600).unwrap();
        assert_eq!(db.cache_get("k").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn evict_expired_removes_only_stale_rows() {
        let db = Database::open_in_memory().unwrap();

        db.cache_set("stale", "{}", -1).unwrap();
        db.cache_set("fresh", "{}", 3600).unwrap();

        let removed = db.cache_evict_expired().unwrap();
        assert_eq!(removed, 1);
        assert_eq!(db.cache_get("fresh").unwrap().as_deref(), Some("{}"));
    }
}
