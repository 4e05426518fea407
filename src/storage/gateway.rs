use std::sync::Arc;

use parking_lot::Mutex;
use time::OffsetDateTime;

use super::StorageHandle;
use crate::appointment::{Appointment, AppointmentDraft, AppointmentField};
use crate::config::StorageOptions;
use crate::error::StoreError;

/// Millisecond-timestamp id source that never repeats or goes backwards.
#[derive(Debug, Default)]
pub struct IdClock {
    last: Mutex<i64>,
}

impl IdClock {
    pub fn next(&self) -> i64 {
        self.next_at(now_millis())
    }

    fn next_at(&self, now: i64) -> i64 {
        let mut last = self.last.lock();
        let id = now.max(*last + 1);
        *last = id;
        id
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Async front for the appointment store.
///
/// Produced once by [`AppointmentGateway::initialize`]. If the store could not
/// be opened the gateway carries no handle and every operation returns
/// [`StoreError::NotInitialized`].
#[derive(Clone)]
pub struct AppointmentGateway {
    handle: Option<StorageHandle>,
    clock: Arc<IdClock>,
}

impl AppointmentGateway {
    pub fn initialize(options: &StorageOptions) -> Self {
        let handle = match super::init(options) {
            Ok(handle) => {
                tracing::info!(path = %handle.database_path().display(), "appointment store open");
                Some(handle)
            }
            Err(err) => {
                let err = StoreError::OpenFailed {
                    path: options.database_path.clone(),
                    reason: format!("{err:#}"),
                };
                tracing::error!(%err, "appointment store unavailable");
                None
            }
        };
        Self {
            handle,
            clock: Arc::new(IdClock::default()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Result<&StorageHandle, StoreError> {
        self.handle.as_ref().ok_or(StoreError::NotInitialized)
    }

    async fn run<T, F>(&self, operation: &'static str, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&StorageHandle) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.handle()?.clone();
        tokio::task::spawn_blocking(move || work(&handle))
            .await
            .map_err(|err| StoreError::OperationFailed {
                operation,
                reason: err.to_string(),
            })?
            .map_err(|err| StoreError::operation(operation, err))
    }

    /// Adds the draft as a new record, assigning an id if it has none.
    pub async fn insert(&self, draft: &AppointmentDraft) -> Result<Appointment, StoreError> {
        self.handle()?;
        let id = draft.id.unwrap_or_else(|| self.clock.next());
        let appointment = draft.to_appointment(id);
        let record = appointment.clone();
        self.run("insert", move |storage| storage.insert_appointment(&record))
            .await?;
        tracing::debug!(id, "appointment added");
        Ok(appointment)
    }

    /// Overwrites the record whose id the draft carries.
    pub async fn update(&self, draft: &AppointmentDraft) -> Result<Appointment, StoreError> {
        let id = draft.id.ok_or(StoreError::MissingId)?;
        let appointment = draft.to_appointment(id);
        let record = appointment.clone();
        self.run("update", move |storage| storage.put_appointment(&record))
            .await?;
        tracing::debug!(id, "appointment updated");
        Ok(appointment)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let removed = self
            .run("delete", move |storage| storage.delete_appointment(id))
            .await?;
        if removed == 0 {
            return Err(StoreError::DeleteFailed(id));
        }
        tracing::debug!(id, "appointment deleted");
        Ok(())
    }

    /// Every stored record. Order follows the key and is not part of the contract.
    pub async fn list_all(&self) -> Result<Vec<Appointment>, StoreError> {
        self.run("list", |storage| storage.fetch_all_appointments())
            .await
    }

    pub async fn find_by(
        &self,
        field: AppointmentField,
        value: &str,
    ) -> Result<Vec<Appointment>, StoreError> {
        let value = value.to_owned();
        self.run("lookup", move |storage| storage.find_by_field(field, &value))
            .await
    }
}
