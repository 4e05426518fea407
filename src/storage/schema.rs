use anyhow::{Context, Result};
use rusqlite::Connection;

pub const SCHEMA_VERSION: i64 = 1;

const CREATE_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY,
        pet_name TEXT NOT NULL,
        owner_name TEXT NOT NULL,
        phone TEXT NOT NULL,
        date TEXT NOT NULL,
        time TEXT NOT NULL,
        symptoms TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS appointments_pet_name_idx ON appointments(pet_name);
    CREATE INDEX IF NOT EXISTS appointments_owner_name_idx ON appointments(owner_name);
    CREATE INDEX IF NOT EXISTS appointments_phone_idx ON appointments(phone);
    CREATE INDEX IF NOT EXISTS appointments_date_idx ON appointments(date);
    CREATE INDEX IF NOT EXISTS appointments_time_idx ON appointments(time);
    CREATE INDEX IF NOT EXISTS appointments_symptoms_idx ON appointments(symptoms);
    CREATE UNIQUE INDEX IF NOT EXISTS appointments_id_idx ON appointments(id);
"#;

pub fn user_version(conn: &Connection) -> Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("reading schema version")
}

/// Creates the schema when the file is new or older than [`SCHEMA_VERSION`].
/// Returns whether the upgrade ran.
pub fn apply(conn: &Connection) -> Result<bool> {
    let current = user_version(conn)?;
    if current >= SCHEMA_VERSION {
        return Ok(false);
    }
    tracing::info!(from = current, to = SCHEMA_VERSION, "upgrading appointment schema");
    let tx = conn
        .unchecked_transaction()
        .context("starting schema upgrade")?;
    tx.execute_batch(CREATE_V1)
        .context("applying schema migrations")?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .context("recording schema version")?;
    tx.commit().context("committing schema upgrade")?;
    Ok(true)
}
