use crate::domain::model::{parse_calendar_date, parse_timestamp, ResidentCare, ResidentId};
use crate::domain::ports::{ActivityRepository, OutingRepository, ResidentCareRepository};
use crate::utils::error::{CareError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS residents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT,
    last_name TEXT,
    room_number TEXT,
    age INTEGER,
    mobility_status TEXT,
    has_fall_history INTEGER DEFAULT 0,
    last_fall_date DATE
);

CREATE TABLE IF NOT EXISTS activity_participation (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    resident_id INTEGER,
    activity_id INTEGER,
    date DATE,
    attended INTEGER DEFAULT 0,
    notes TEXT,
    FOREIGN KEY (resident_id) REFERENCES residents (id)
);

CREATE TABLE IF NOT EXISTS outings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    resident_id INTEGER,
    departure_time TIMESTAMP,
    expected_return_time TIMESTAMP,
    actual_return_time TIMESTAMP,
    destination TEXT,
    FOREIGN KEY (resident_id) REFERENCES residents (id)
);

CREATE INDEX IF NOT EXISTS idx_activity_resident_date
    ON activity_participation (resident_id, date);
CREATE INDEX IF NOT EXISTS idx_outings_resident_departure
    ON outings (resident_id, departure_time);
";

/// Read-only risk repositories over the facility's SQLite database.
///
/// Dates are stored as ISO text, so range filters compare strings.
pub struct SqliteCareStore {
    conn: Mutex<Connection>,
}

impl SqliteCareStore {
    /// Opens an existing database read-only. A missing file is an error,
    /// never a fresh empty database.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CareError::data(
                path.display().to_string(),
                "care database not found",
            ));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!("Opened care database read-only at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 建立 (或開啟) 可寫入的資料庫並補齊資料表，供匯入與測試使用
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open(path.as_ref())?),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// 建立風險評估所需的資料表 (若不存在)
    pub fn ensure_schema(&self) -> Result<()> {
        self.connection()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CareError::processing("care database connection lock poisoned"))
    }

    pub fn insert_resident(&self, care: &ResidentCare) -> Result<()> {
        self.connection()?.execute(
            "INSERT INTO residents (id, mobility_status, has_fall_history, last_fall_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                care.resident_id,
                care.mobility_status,
                care.last_fall_date.is_some(),
                care.last_fall_date.map(|d| d.format(DATE_FORMAT).to_string()),
            ],
        )?;
        Ok(())
    }

    pub fn insert_activity(&self, resident_id: ResidentId, date: NaiveDate) -> Result<()> {
        self.connection()?.execute(
            "INSERT INTO activity_participation (resident_id, date, attended) VALUES (?1, ?2, 1)",
            params![resident_id, date.format(DATE_FORMAT).to_string()],
        )?;
        Ok(())
    }

    pub fn insert_outing(&self, resident_id: ResidentId, departure: NaiveDateTime) -> Result<()> {
        self.connection()?.execute(
            "INSERT INTO outings (resident_id, departure_time) VALUES (?1, ?2)",
            params![resident_id, departure.format(TIMESTAMP_FORMAT).to_string()],
        )?;
        Ok(())
    }
}

fn count_to_u32(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

impl ActivityRepository for SqliteCareStore {
    fn participation_counts_since(
        &self,
        resident_id: ResidentId,
        since: NaiveDate,
    ) -> Result<Vec<(NaiveDate, u32)>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT date, COUNT(*)
             FROM activity_participation
             WHERE resident_id = ?1 AND date >= ?2
             GROUP BY date
             ORDER BY date ASC",
        )?;
        let rows = stmt
            .query_map(
                params![resident_id, since.format(DATE_FORMAT).to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // 同一天可能以不同時間字串儲存，合併計數
        let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for (raw, count) in rows {
            let date = parse_calendar_date(&raw).ok_or_else(|| {
                CareError::data("activity_participation", format!("invalid date '{}'", raw))
            })?;
            *counts.entry(date).or_default() += count_to_u32(count);
        }
        Ok(counts.into_iter().collect())
    }
}

impl OutingRepository for SqliteCareStore {
    fn visit_counts_since(
        &self,
        resident_id: ResidentId,
        since: NaiveDateTime,
    ) -> Result<Vec<(NaiveDateTime, u32)>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT departure_time, COUNT(*)
             FROM outings
             WHERE resident_id = ?1 AND departure_time >= ?2
             GROUP BY departure_time
             ORDER BY departure_time ASC",
        )?;
        let rows = stmt
            .query_map(
                params![resident_id, since.format(TIMESTAMP_FORMAT).to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(raw, count)| {
                let departure = parse_timestamp(&raw).ok_or_else(|| {
                    CareError::data("outings", format!("invalid departure_time '{}'", raw))
                })?;
                Ok((departure, count_to_u32(count)))
            })
            .collect()
    }
}

impl ResidentCareRepository for SqliteCareStore {
    fn resident_ids(&self) -> Result<Vec<ResidentId>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT id FROM residents ORDER BY id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn mobility_status(&self, resident_id: ResidentId) -> Result<Option<String>> {
        let status = self
            .connection()?
            .query_row(
                "SELECT mobility_status FROM residents WHERE id = ?1",
                params![resident_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(status.flatten())
    }

    fn count_falls_since(&self, resident_id: ResidentId, since: NaiveDate) -> Result<u32> {
        let count: i64 = self.connection()?.query_row(
            "SELECT COUNT(*) FROM residents
             WHERE id = ?1 AND last_fall_date IS NOT NULL AND last_fall_date >= ?2",
            params![resident_id, since.format(DATE_FORMAT).to_string()],
            |row| row.get(0),
        )?;
        Ok(count_to_u32(count))
    }
}
