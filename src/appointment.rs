use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// A persisted appointment. The id is assigned once at creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub pet_name: String,
    pub owner_name: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub symptoms: String,
}

impl Appointment {
    pub fn get(&self, field: AppointmentField) -> &str {
        match field {
            AppointmentField::PetName => &self.pet_name,
            AppointmentField::OwnerName => &self.owner_name,
            AppointmentField::Phone => &self.phone,
            AppointmentField::Date => &self.date,
            AppointmentField::Time => &self.time,
            AppointmentField::Symptoms => &self.symptoms,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum AppointmentField {
    PetName,
    OwnerName,
    Phone,
    Date,
    Time,
    Symptoms,
}

impl AppointmentField {
    pub fn all() -> impl Iterator<Item = AppointmentField> {
        AppointmentField::iter()
    }

    pub fn label(self) -> &'static str {
        match self {
            AppointmentField::PetName => "Pet name",
            AppointmentField::OwnerName => "Owner name",
            AppointmentField::Phone => "Phone",
            AppointmentField::Date => "Date",
            AppointmentField::Time => "Time",
            AppointmentField::Symptoms => "Symptoms",
        }
    }

    /// Column backing this field in the `appointments` table.
    pub fn column(self) -> &'static str {
        match self {
            AppointmentField::PetName => "pet_name",
            AppointmentField::OwnerName => "owner_name",
            AppointmentField::Phone => "phone",
            AppointmentField::Date => "date",
            AppointmentField::Time => "time",
            AppointmentField::Symptoms => "symptoms",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            AppointmentField::Phone => "9XXXXXXXX",
            AppointmentField::Date => "YYYY-MM-DD",
            AppointmentField::Time => "HH:MM",
            _ => "",
        }
    }
}

/// The not-yet-persisted record bound to the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub id: Option<i64>,
    pub pet_name: String,
    pub owner_name: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub symptoms: String,
}

impl AppointmentDraft {
    pub fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            id: Some(appointment.id),
            pet_name: appointment.pet_name.clone(),
            owner_name: appointment.owner_name.clone(),
            phone: appointment.phone.clone(),
            date: appointment.date.clone(),
            time: appointment.time.clone(),
            symptoms: appointment.symptoms.clone(),
        }
    }

    pub fn get(&self, field: AppointmentField) -> &str {
        match field {
            AppointmentField::PetName => &self.pet_name,
            AppointmentField::OwnerName => &self.owner_name,
            AppointmentField::Phone => &self.phone,
            AppointmentField::Date => &self.date,
            AppointmentField::Time => &self.time,
            AppointmentField::Symptoms => &self.symptoms,
        }
    }

    pub fn set<S: Into<String>>(&mut self, field: AppointmentField, value: S) {
        let slot = match field {
            AppointmentField::PetName => &mut self.pet_name,
            AppointmentField::OwnerName => &mut self.owner_name,
            AppointmentField::Phone => &mut self.phone,
            AppointmentField::Date => &mut self.date,
            AppointmentField::Time => &mut self.time,
            AppointmentField::Symptoms => &mut self.symptoms,
        };
        *slot = value.into();
    }

    /// Empties every field; the id is left alone.
    pub fn clear_fields(&mut self) {
        for field in AppointmentField::all() {
            self.set(field, String::new());
        }
    }

    pub fn to_appointment(&self, id: i64) -> Appointment {
        Appointment {
            id,
            pet_name: self.pet_name.clone(),
            owner_name: self.owner_name.clone(),
            phone: self.phone.clone(),
            date: self.date.clone(),
            time: self.time.clone(),
            symptoms: self.symptoms.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_parse_from_kebab_case() {
        assert_eq!(
            "pet-name".parse::<AppointmentField>().ok(),
            Some(AppointmentField::PetName)
        );
        assert_eq!(AppointmentField::OwnerName.to_string(), "owner-name");
        assert!("pet_name".parse::<AppointmentField>().is_err());
        assert_eq!(AppointmentField::all().count(), 6);
    }

    #[test]
    fn clear_fields_keeps_id() {
        let mut draft = AppointmentDraft {
            id: Some(42),
            pet_name: "Rex".into(),
            ..AppointmentDraft::default()
        };
        draft.clear_fields();
        assert_eq!(draft.id, Some(42));
        assert!(AppointmentField::all().all(|field| draft.get(field).is_empty()));
    }

    #[test]
    fn appointment_serializes_with_camel_case_keys() {
        let appointment = Appointment {
            id: 1,
            pet_name: "Rex".into(),
            owner_name: "Ana".into(),
            phone: "987654321".into(),
            date: "2030-01-01".into(),
            time: "10:00".into(),
            symptoms: "cough".into(),
        };
        let json = serde_json::to_value(&appointment).expect("serialize");
        assert_eq!(json["petName"], "Rex");
        assert_eq!(json["ownerName"], "Ana");
    }
}
