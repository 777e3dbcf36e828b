use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use thiserror::Error;

use crate::adapters::db;
use crate::adapters::db::DbError;
use crate::domain::electricity::{
    DailyElectricity, DayWindow, HourlyReading, aggregate_daily, format_timestamp,
};
use crate::domain::models::{
    HourlyElectricityRecord, NewHourlyElectricityRecord, NewPanelRecord, PanelRecord,
};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::panel::Serial;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database lock poisoned")]
    DbLockPoisoned,
    #[error("database operation failed: {0}")]
    Database(#[from] DbError),
    #[error("panel with serial {0} is already registered")]
    DuplicateSerial(String),
    #[error("no panel registered with serial {0}")]
    PanelNotFound(String),
    #[error("reading references panel {referenced} but serial {serial} belongs to panel {actual}")]
    PanelMismatch {
        serial: String,
        referenced: i64,
        actual: i64,
    },
}

pub trait PanelQueryHandler {
    fn find_panel(&self, serial: &Serial) -> Result<Option<PanelRecord>, ServiceError>;
    fn hourly_history(
        &self,
        serial: &Serial,
        request: PageRequest,
    ) -> Result<Page<HourlyElectricityRecord>, ServiceError>;
    fn daily_electricity(
        &self,
        serial: &Serial,
        window: &DayWindow,
    ) -> Result<Vec<DailyElectricity>, ServiceError>;
}

pub trait PanelCommandHandler {
    fn register_panel(&self, new_panel: &NewPanelRecord) -> Result<PanelRecord, ServiceError>;
    fn record_hourly(
        &self,
        serial: &Serial,
        reading: &HourlyReading,
    ) -> Result<HourlyElectricityRecord, ServiceError>;
}

#[derive(Clone)]
pub struct SqlitePanelService {
    connection: Arc<Mutex<Connection>>,
}

impl SqlitePanelService {
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| ServiceError::DbLockPoisoned)?;
        op(&connection)
    }
}

impl PanelQueryHandler for SqlitePanelService {
    fn find_panel(&self, serial: &Serial) -> Result<Option<PanelRecord>, ServiceError> {
        self.with_connection(|connection| {
            Ok(db::find_panel_by_serial(connection, serial.as_str())?)
        })
    }

    fn hourly_history(
        &self,
        serial: &Serial,
        request: PageRequest,
    ) -> Result<Page<HourlyElectricityRecord>, ServiceError> {
        self.with_connection(|connection| {
            let total = db::count_hourly_electricity_for_serial(connection, serial.as_str())?;
            let content = db::list_hourly_electricity_for_serial(
                connection,
                serial.as_str(),
                request.size,
                request.offset(),
            )?;
            Ok(Page::new(content, request, total))
        })
    }

    fn daily_electricity(
        &self,
        serial: &Serial,
        window: &DayWindow,
    ) -> Result<Vec<DailyElectricity>, ServiceError> {
        if window.is_empty() {
            return Ok(Vec::new());
        }

        let readings = self.with_connection(|connection| {
            Ok(db::list_hourly_electricity_between(
                connection,
                serial.as_str(),
                &format_timestamp(window.start()),
                &format_timestamp(window.end()),
            )?)
        })?;

        Ok(aggregate_daily(&readings, window))
    }
}

impl PanelCommandHandler for SqlitePanelService {
    fn register_panel(&self, new_panel: &NewPanelRecord) -> Result<PanelRecord, ServiceError> {
        let id = self.with_connection(|connection| {
            db::insert_panel(connection, new_panel).map_err(|error| match error {
                DbError::DuplicateSerial(serial) => ServiceError::DuplicateSerial(serial),
                other => ServiceError::Database(other),
            })
        })?;

        tracing::info!(
            panel_id = id,
            serial = %new_panel.serial,
            brand = %new_panel.brand,
            "panel registered"
        );

        Ok(PanelRecord {
            id,
            serial: new_panel.serial.clone(),
            longitude: new_panel.longitude,
            latitude: new_panel.latitude,
            brand: new_panel.brand.clone(),
        })
    }

    fn record_hourly(
        &self,
        serial: &Serial,
        reading: &HourlyReading,
    ) -> Result<HourlyElectricityRecord, ServiceError> {
        self.with_connection(|connection| {
            let panel = db::find_panel_by_serial(connection, serial.as_str())?
                .ok_or_else(|| ServiceError::PanelNotFound(serial.to_string()))?;

            if let Some(referenced) = reading.panel_id
                && referenced != panel.id
            {
                return Err(ServiceError::PanelMismatch {
                    serial: serial.to_string(),
                    referenced,
                    actual: panel.id,
                });
            }

            let new_reading = NewHourlyElectricityRecord {
                panel_id: panel.id,
                generated_electricity: reading.generated_electricity,
                reading_at: format_timestamp(reading.reading_at),
            };

            let id = db::insert_hourly_electricity(connection, &new_reading).map_err(
                |error| match error {
                    DbError::MissingPanel(_) => ServiceError::PanelNotFound(serial.to_string()),
                    other => ServiceError::Database(other),
                },
            )?;

            tracing::debug!(
                reading_id = id,
                panel_id = panel.id,
                reading_at = %new_reading.reading_at,
                "hourly reading stored"
            );

            Ok(HourlyElectricityRecord {
                id,
                panel_id: panel.id,
                panel_serial: panel.serial,
                generated_electricity: new_reading.generated_electricity,
                reading_at: new_reading.reading_at,
            })
        })
    }
}
