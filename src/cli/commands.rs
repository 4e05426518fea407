use std::fmt::Write as _;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use tokio::runtime::Runtime;

use crate::app::actions::DELETE_FAILED_MESSAGE;
use crate::app::state::{format_date, session_date};
use crate::app::{ActionDispatcher, AppState, SubmitOutcome};
use crate::appointment::{Appointment, AppointmentField};
use crate::storage::AppointmentGateway;

#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    /// Pet name
    #[arg(long)]
    pub pet: Option<String>,
    /// Owner name
    #[arg(long)]
    pub owner: Option<String>,
    /// Contact phone (9 digits starting with 9)
    #[arg(long)]
    pub phone: Option<String>,
    /// Appointment date (YYYY-MM-DD, today or later)
    #[arg(long)]
    pub date: Option<String>,
    /// Appointment time (HH:MM)
    #[arg(long)]
    pub time: Option<String>,
    /// Reason for the visit
    #[arg(long)]
    pub symptoms: Option<String>,
}

impl AddArgs {
    fn values(&self) -> [(AppointmentField, Option<&str>); 6] {
        [
            (AppointmentField::PetName, self.pet.as_deref()),
            (AppointmentField::OwnerName, self.owner.as_deref()),
            (AppointmentField::Phone, self.phone.as_deref()),
            (AppointmentField::Date, self.date.as_deref()),
            (AppointmentField::Time, self.time.as_deref()),
            (AppointmentField::Symptoms, self.symptoms.as_deref()),
        ]
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only show appointments whose field equals --value (pet-name, owner-name, phone, date, time, symptoms)
    #[arg(long, requires = "value")]
    pub field: Option<AppointmentField>,
    /// Value to match exactly against --field
    #[arg(long, requires = "field")]
    pub value: Option<String>,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Appointment identifier
    pub id: i64,
}

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .context("building command runtime")
}

pub fn add_appointment(gateway: &AppointmentGateway, args: AddArgs) -> Result<()> {
    let appointment = runtime()?.block_on(run_add(gateway, &args))?;
    println!(
        "Created appointment #{} for {} on {} at {}",
        appointment.id, appointment.pet_name, appointment.date, appointment.time
    );
    Ok(())
}

pub fn list_appointments(gateway: &AppointmentGateway, args: ListArgs) -> Result<()> {
    let output = runtime()?.block_on(run_list(gateway, &args))?;
    print!("{output}");
    Ok(())
}

pub fn delete_appointment(gateway: &AppointmentGateway, args: DeleteArgs) -> Result<()> {
    runtime()?.block_on(run_delete(gateway, args.id))?;
    println!("Deleted appointment #{}", args.id);
    Ok(())
}

async fn run_add(gateway: &AppointmentGateway, args: &AddArgs) -> Result<Appointment> {
    let mut state = AppState::new(session_date(), None);
    // a typed argument is rejected, not snapped like the interactive date input
    if let Some(date) = args.date.as_deref() {
        if state.form.precedes_min_date(date) {
            bail!(
                "Date {} is before the earliest allowed date {}",
                date.trim(),
                format_date(state.form.min_date())
            );
        }
    }
    for (field, value) in args.values() {
        if let Some(value) = value {
            state.form.record_field(field, value);
        }
    }
    match ActionDispatcher::new(gateway).submit(&mut state).await {
        SubmitOutcome::Created(appointment) => Ok(appointment),
        SubmitOutcome::Rejected(err) => bail!("{}", err.user_message()),
        SubmitOutcome::StoreFailed(err) => {
            Err(anyhow!(err).context("appointment was not saved"))
        }
        SubmitOutcome::Updated(appointment) => {
            bail!("appointment {} was updated instead of created", appointment.id)
        }
    }
}

async fn run_list(gateway: &AppointmentGateway, args: &ListArgs) -> Result<String> {
    let appointments = match (args.field, args.value.as_deref()) {
        (Some(field), Some(value)) => gateway
            .find_by(field, value)
            .await
            .with_context(|| format!("looking up appointments by {field}"))?,
        _ => gateway.list_all().await.context("listing appointments")?,
    };
    if args.json {
        let mut out =
            serde_json::to_string_pretty(&appointments).context("serializing appointments")?;
        out.push('\n');
        return Ok(out);
    }
    Ok(format_appointments(&appointments))
}

async fn run_delete(gateway: &AppointmentGateway, id: i64) -> Result<()> {
    let mut state = AppState::new(session_date(), None);
    ActionDispatcher::new(gateway)
        .delete(&mut state, id)
        .await
        .context(DELETE_FAILED_MESSAGE)
}

fn format_appointments(appointments: &[Appointment]) -> String {
    if appointments.is_empty() {
        return "No appointments found.\n".to_string();
    }
    let mut out = String::new();
    for appointment in appointments {
        let _ = writeln!(
            &mut out,
            "#{}  {} ({})",
            appointment.id, appointment.pet_name, appointment.owner_name
        );
        let _ = writeln!(
            &mut out,
            "    when     {} {}",
            appointment.date, appointment.time
        );
        let _ = writeln!(&mut out, "    phone    {}", appointment.phone);
        let _ = writeln!(&mut out, "    symptoms {}", appointment.symptoms);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageOptions;
    use tempfile::TempDir;

    type TestResult<T = ()> = Result<T>;

    fn setup_gateway() -> TestResult<(TempDir, AppointmentGateway)> {
        let temp = TempDir::new().context("creating temp dir")?;
        let gateway =
            AppointmentGateway::initialize(&StorageOptions::at(temp.path().join("data/appointments.db")));
        Ok((temp, gateway))
    }

    fn rex_args() -> AddArgs {
        AddArgs {
            pet: Some("Rex".into()),
            owner: Some("Ana".into()),
            phone: Some("987654321".into()),
            date: Some("2030-01-01".into()),
            time: Some("10:00".into()),
            symptoms: Some("cough".into()),
        }
    }

    #[tokio::test]
    async fn cli_add_then_list_shows_single_record() -> TestResult {
        let (_temp, gateway) = setup_gateway()?;
        let created = run_add(&gateway, &rex_args()).await?;

        let output = run_list(&gateway, &ListArgs::default()).await?;
        assert!(output.contains(&format!("#{}  Rex (Ana)", created.id)));
        assert!(output.contains("2030-01-01 10:00"));
        assert!(output.contains("symptoms cough"));
        assert_eq!(gateway.list_all().await?, vec![created]);
        Ok(())
    }

    #[tokio::test]
    async fn cli_add_reports_validation_errors() -> TestResult {
        let (_temp, gateway) = setup_gateway()?;
        let mut args = rex_args();
        args.phone = Some("91234567a".into());
        let err = run_add(&gateway, &args).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid phone number");

        args.symptoms = None;
        let err = run_add(&gateway, &args).await.unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");
        assert!(gateway.list_all().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn cli_add_rejects_past_date_without_storing() -> TestResult {
        let (_temp, gateway) = setup_gateway()?;
        let mut args = rex_args();
        args.date = Some("2020-01-01".into());
        let err = run_add(&gateway, &args).await.unwrap_err();
        assert!(
            err.to_string().starts_with("Date 2020-01-01 is before the earliest allowed date"),
            "unexpected error: {err}"
        );
        assert!(gateway.list_all().await?.is_empty());

        args.date = Some(format_date(session_date()));
        let created = run_add(&gateway, &args).await?;
        assert_eq!(created.date, format_date(session_date()));
        Ok(())
    }

    #[tokio::test]
    async fn cli_list_filters_by_field_and_emits_json() -> TestResult {
        let (_temp, gateway) = setup_gateway()?;
        run_add(&gateway, &rex_args()).await?;
        let mut luna = rex_args();
        luna.pet = Some("Luna".into());
        run_add(&gateway, &luna).await?;

        let args = ListArgs {
            field: Some(AppointmentField::PetName),
            value: Some("Luna".into()),
            json: true,
        };
        let output = run_list(&gateway, &args).await?;
        let parsed: Vec<Appointment> = serde_json::from_str(&output)?;
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].pet_name, "Luna");
        assert!(output.contains("\"petName\""));
        Ok(())
    }

    #[tokio::test]
    async fn cli_delete_unknown_id_fails() -> TestResult {
        let (_temp, gateway) = setup_gateway()?;
        let created = run_add(&gateway, &rex_args()).await?;

        let err = run_delete(&gateway, created.id + 1).await.unwrap_err();
        assert_eq!(err.to_string(), DELETE_FAILED_MESSAGE);
        run_delete(&gateway, created.id).await?;
        assert_eq!(
            run_list(&gateway, &ListArgs::default()).await?,
            "No appointments found.\n"
        );
        Ok(())
    }
}
