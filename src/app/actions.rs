use crate::app::state::{AppState, FormMode, NoticeKind};
use crate::appointment::Appointment;
use crate::error::{StoreError, ValidationError};
use crate::storage::AppointmentGateway;
use crate::validation::validate;

pub const ADDED_MESSAGE: &str = "Appointment added";
pub const UPDATED_MESSAGE: &str = "Appointment updated";
pub const DELETED_MESSAGE: &str = "Appointment deleted";
pub const DELETE_FAILED_MESSAGE: &str = "Could not delete the appointment";

#[derive(Debug)]
pub enum SubmitOutcome {
    Rejected(ValidationError),
    Created(Appointment),
    Updated(Appointment),
    /// The store refused the write. Only logged; the user sees no notice.
    StoreFailed(StoreError),
}

/// Runs form submissions and deletions against the store, then re-renders.
pub struct ActionDispatcher<'a> {
    gateway: &'a AppointmentGateway,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(gateway: &'a AppointmentGateway) -> Self {
        Self { gateway }
    }

    pub async fn submit(&self, state: &mut AppState) -> SubmitOutcome {
        if let Err(err) = validate(state.form.draft()) {
            tracing::debug!(?err, "draft rejected");
            state.show_message(err.user_message(), NoticeKind::Error);
            return SubmitOutcome::Rejected(err);
        }

        let mut draft = state.form.draft().clone();
        let outcome = match state.form.mode() {
            FormMode::Editing => match self.gateway.update(&draft).await {
                Ok(appointment) => {
                    state.show_message(UPDATED_MESSAGE, NoticeKind::Info);
                    state.form.finish_edit();
                    SubmitOutcome::Updated(appointment)
                }
                Err(err) => {
                    tracing::error!(%err, id = ?draft.id, "failed to update appointment");
                    SubmitOutcome::StoreFailed(err)
                }
            },
            FormMode::Creating => {
                draft.id = None;
                match self.gateway.insert(&draft).await {
                    Ok(appointment) => {
                        state.show_message(ADDED_MESSAGE, NoticeKind::Info);
                        SubmitOutcome::Created(appointment)
                    }
                    Err(err) => {
                        tracing::error!(%err, "failed to add appointment");
                        SubmitOutcome::StoreFailed(err)
                    }
                }
            }
        };

        state.form.reset_draft();
        if let Err(err) = self.refresh(state).await {
            tracing::error!(%err, "failed to refresh after submit");
        }
        outcome
    }

    pub async fn delete(&self, state: &mut AppState, id: i64) -> Result<(), StoreError> {
        match self.gateway.delete(id).await {
            Ok(()) => {
                state.show_message(DELETED_MESSAGE, NoticeKind::Info);
                if let Err(err) = self.refresh(state).await {
                    tracing::error!(%err, "failed to refresh after delete");
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, id, "failed to delete appointment");
                state.show_message(DELETE_FAILED_MESSAGE, NoticeKind::Error);
                Err(err)
            }
        }
    }

    pub async fn refresh(&self, state: &mut AppState) -> Result<(), StoreError> {
        let appointments = self.gateway.list_all().await?;
        state.render_list(appointments);
        Ok(())
    }
}
