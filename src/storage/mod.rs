use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::appointment::{Appointment, AppointmentField};
use crate::config::StorageOptions;

mod gateway;
pub mod schema;

pub use gateway::{AppointmentGateway, IdClock};

const SELECT_APPOINTMENT: &str =
    "SELECT id, pet_name, owner_name, phone, date, time, symptoms FROM appointments";

#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Adds a new record. Fails if the id is already taken.
    pub fn insert_appointment(&self, appointment: &Appointment) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO appointments (id, pet_name, owner_name, phone, date, time, symptoms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    appointment.id,
                    appointment.pet_name,
                    appointment.owner_name,
                    appointment.phone,
                    appointment.date,
                    appointment.time,
                    appointment.symptoms,
                ],
            )
            .with_context(|| format!("inserting appointment {}", appointment.id))?;
            Ok(())
        })
    }

    /// Writes every field of the record keyed by `appointment.id`, creating it if absent.
    pub fn put_appointment(&self, appointment: &Appointment) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO appointments (id, pet_name, owner_name, phone, date, time, symptoms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     pet_name = excluded.pet_name,
                     owner_name = excluded.owner_name,
                     phone = excluded.phone,
                     date = excluded.date,
                     time = excluded.time,
                     symptoms = excluded.symptoms",
                params![
                    appointment.id,
                    appointment.pet_name,
                    appointment.owner_name,
                    appointment.phone,
                    appointment.date,
                    appointment.time,
                    appointment.symptoms,
                ],
            )
            .with_context(|| format!("writing appointment {}", appointment.id))?;
            Ok(())
        })
    }

    /// Returns the number of rows removed (0 or 1).
    pub fn delete_appointment(&self, id: i64) -> Result<usize> {
        self.with_connection(|conn| {
            let removed = conn
                .execute("DELETE FROM appointments WHERE id = ?1", params![id])
                .with_context(|| format!("deleting appointment {id}"))?;
            Ok(removed)
        })
    }

    pub fn fetch_all_appointments(&self) -> Result<Vec<Appointment>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_APPOINTMENT} ORDER BY id"))?;
            let records = stmt
                .query_map([], appointment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("reading appointments")?;
            Ok(records)
        })
    }

    pub fn fetch_appointment_by_id(&self, id: i64) -> Result<Option<Appointment>> {
        self.with_connection(|conn| {
            let record = conn
                .query_row(
                    &format!("{SELECT_APPOINTMENT} WHERE id = ?1"),
                    params![id],
                    appointment_from_row,
                )
                .optional()
                .with_context(|| format!("reading appointment {id}"))?;
            Ok(record)
        })
    }

    /// Exact-match lookup served by the per-field index.
    pub fn find_by_field(&self, field: AppointmentField, value: &str) -> Result<Vec<Appointment>> {
        let value = value.trim();
        if value.is_empty() {
            bail!("{} lookup value cannot be empty", field.label());
        }
        self.with_connection(|conn| {
            let sql = format!(
                "{SELECT_APPOINTMENT} WHERE {column} = ?1 ORDER BY id",
                column = field.column()
            );
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map(params![value], appointment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("looking up appointments by {field}"))?;
            Ok(records)
        })
    }
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: row.get(0)?,
        pet_name: row.get(1)?,
        owner_name: row.get(2)?,
        phone: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        symptoms: row.get(6)?,
    })
}

/// Opens (creating if absent) the store and brings its schema up to date.
pub fn init(options: &StorageOptions) -> Result<StorageHandle> {
    let db_path = &options.database_path;
    if db_path.as_os_str().is_empty() {
        bail!("no database path configured");
    }
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, options)?;
    if schema::apply(&conn)? {
        tracing::info!(path = %db_path.display(), "appointment store created");
    }
    Ok(StorageHandle {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(options.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.busy_timeout(storage.busy_timeout())
        .context("setting busy timeout")?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    Ok(())
}
