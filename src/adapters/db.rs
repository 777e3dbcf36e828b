use rusqlite::{Connection, ErrorCode, Row, params};
use thiserror::Error;

use crate::domain::models::{
    HourlyElectricityRecord, NewHourlyElectricityRecord, NewPanelRecord, PanelRecord,
};

pub const LATEST_SCHEMA_VERSION: u32 = 1;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    r#"
CREATE TABLE IF NOT EXISTS panels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    serial TEXT NOT NULL,
    longitude REAL NOT NULL,
    latitude REAL NOT NULL,
    brand TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_panels_serial
ON panels (serial);

CREATE TABLE IF NOT EXISTS hourly_electricity (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    panel_id INTEGER NOT NULL REFERENCES panels (id),
    generated_electricity INTEGER NOT NULL,
    reading_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_hourly_electricity_panel_reading_at
ON hourly_electricity (panel_id, reading_at DESC);
"#,
)];

const HOURLY_COLUMNS: &str = "h.id, h.panel_id, p.serial, h.generated_electricity, h.reading_at";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("unsupported schema version {current}; latest supported is {latest}")]
    UnsupportedSchemaVersion { current: u32, latest: u32 },
    #[error("panel with serial {0} already exists")]
    DuplicateSerial(String),
    #[error("panel {0} does not exist")]
    MissingPanel(i64),
    #[error("stored count {0} is negative")]
    NegativeCount(i64),
}

pub fn open_connection(path: &str) -> Result<Connection, DbError> {
    let connection = Connection::open(path)?;
    connection.pragma_update(None, "foreign_keys", true)?;
    Ok(connection)
}

pub fn run_migrations(connection: &mut Connection) -> Result<(), DbError> {
    let current_version = schema_version(connection)?;

    if current_version > LATEST_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            current: current_version,
            latest: LATEST_SCHEMA_VERSION,
        });
    }

    let transaction = connection.transaction()?;

    for (version, sql) in MIGRATIONS {
        if *version > current_version {
            transaction.execute_batch(sql)?;
            transaction.pragma_update(None, "user_version", version)?;
        }
    }

    transaction.commit()?;

    Ok(())
}

pub fn schema_version(connection: &Connection) -> Result<u32, DbError> {
    let version = connection.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

pub fn insert_panel(connection: &Connection, new_panel: &NewPanelRecord) -> Result<i64, DbError> {
    connection
        .execute(
            "INSERT INTO panels (serial, longitude, latitude, brand) VALUES (?1, ?2, ?3, ?4)",
            params![
                new_panel.serial,
                new_panel.longitude,
                new_panel.latitude,
                new_panel.brand,
            ],
        )
        .map_err(|error| match constraint_code(&error) {
            Some(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE) => {
                DbError::DuplicateSerial(new_panel.serial.clone())
            }
            _ => DbError::from(error),
        })?;

    Ok(connection.last_insert_rowid())
}

pub fn find_panel_by_serial(
    connection: &Connection,
    serial: &str,
) -> Result<Option<PanelRecord>, DbError> {
    let mut statement = connection.prepare(
        "SELECT id, serial, longitude, latitude, brand
         FROM panels
         WHERE serial = ?1",
    )?;

    let mut rows = statement.query(params![serial])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(PanelRecord {
            id: row.get(0)?,
            serial: row.get(1)?,
            longitude: row.get(2)?,
            latitude: row.get(3)?,
            brand: row.get(4)?,
        }));
    }

    Ok(None)
}

pub fn count_panels(connection: &Connection) -> Result<u64, DbError> {
    let count: i64 = connection.query_row("SELECT COUNT(*) FROM panels", [], |row| row.get(0))?;
    to_count(count)
}

pub fn insert_hourly_electricity(
    connection: &Connection,
    new_reading: &NewHourlyElectricityRecord,
) -> Result<i64, DbError> {
    connection
        .execute(
            "INSERT INTO hourly_electricity (panel_id, generated_electricity, reading_at) VALUES (?1, ?2, ?3)",
            params![
                new_reading.panel_id,
                new_reading.generated_electricity,
                new_reading.reading_at,
            ],
        )
        .map_err(|error| match constraint_code(&error) {
            Some(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                DbError::MissingPanel(new_reading.panel_id)
            }
            _ => DbError::from(error),
        })?;

    Ok(connection.last_insert_rowid())
}

pub fn count_hourly_electricity_for_serial(
    connection: &Connection,
    serial: &str,
) -> Result<u64, DbError> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*)
         FROM hourly_electricity h
         JOIN panels p ON p.id = h.panel_id
         WHERE p.serial = ?1",
        params![serial],
        |row| row.get(0),
    )?;
    to_count(count)
}

pub fn list_hourly_electricity_for_serial(
    connection: &Connection,
    serial: &str,
    limit: u32,
    offset: u64,
) -> Result<Vec<HourlyElectricityRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {HOURLY_COLUMNS}
         FROM hourly_electricity h
         JOIN panels p ON p.id = h.panel_id
         WHERE p.serial = ?1
         ORDER BY h.reading_at DESC, h.id DESC
         LIMIT ?2 OFFSET ?3"
    ))?;

    let offset = i64::try_from(offset).unwrap_or(i64::MAX);
    let rows = statement.query_map(params![serial, i64::from(limit), offset], |row| {
        hourly_from_row(row)
    })?;

    let mut readings = Vec::new();
    for row in rows {
        readings.push(row?);
    }

    Ok(readings)
}

/// Readings for `serial` with `start <= reading_at < end`.
///
/// Bounds must use the stored UTC millisecond format so that text
/// comparison matches time order.
pub fn list_hourly_electricity_between(
    connection: &Connection,
    serial: &str,
    start: &str,
    end: &str,
) -> Result<Vec<HourlyElectricityRecord>, DbError> {
    let mut statement = connection.prepare(&format!(
        "SELECT {HOURLY_COLUMNS}
         FROM hourly_electricity h
         JOIN panels p ON p.id = h.panel_id
         WHERE p.serial = ?1 AND h.reading_at >= ?2 AND h.reading_at < ?3
         ORDER BY h.reading_at ASC, h.id ASC"
    ))?;

    let rows = statement.query_map(params![serial, start, end], |row| hourly_from_row(row))?;

    let mut readings = Vec::new();
    for row in rows {
        readings.push(row?);
    }

    Ok(readings)
}

fn hourly_from_row(row: &Row<'_>) -> rusqlite::Result<HourlyElectricityRecord> {
    Ok(HourlyElectricityRecord {
        id: row.get(0)?,
        panel_id: row.get(1)?,
        panel_serial: row.get(2)?,
        generated_electricity: row.get(3)?,
        reading_at: row.get(4)?,
    })
}

fn constraint_code(error: &rusqlite::Error) -> Option<std::os::raw::c_int> {
    match error {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Some(failure.extended_code)
        }
        _ => None,
    }
}

fn to_count(value: i64) -> Result<u64, DbError> {
    u64::try_from(value).map_err(|_| DbError::NegativeCount(value))
}
