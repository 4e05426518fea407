use std::time::{Duration, Instant};

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;

use crate::appointment::{Appointment, AppointmentDraft, AppointmentField};

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub const CREATE_LABEL: &str = "Create Appointment";
pub const SAVE_LABEL: &str = "Save Changes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Form,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Creating,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeKind {
    #[default]
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub shown_at: Instant,
}

/// The local calendar date, used as the earliest date the form accepts.
pub fn session_date() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value, DATE_FORMAT).ok()
}

/// Form inputs plus the trimmed draft they feed.
#[derive(Debug, Clone)]
pub struct FormState {
    draft: AppointmentDraft,
    // raw text as shown in the widgets; the id slot is unused
    inputs: AppointmentDraft,
    mode: FormMode,
    focus: AppointmentField,
    min_date: Date,
}

impl FormState {
    pub fn new(min_date: Date) -> Self {
        Self {
            draft: AppointmentDraft::default(),
            inputs: AppointmentDraft::default(),
            mode: FormMode::Creating,
            focus: AppointmentField::PetName,
            min_date,
        }
    }

    pub fn draft(&self) -> &AppointmentDraft {
        &self.draft
    }

    pub fn input(&self, field: AppointmentField) -> &str {
        self.inputs.get(field)
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == FormMode::Editing
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            FormMode::Creating => CREATE_LABEL,
            FormMode::Editing => SAVE_LABEL,
        }
    }

    pub fn min_date(&self) -> Date {
        self.min_date
    }

    pub fn focused(&self) -> AppointmentField {
        self.focus
    }

    /// Captures one input event: the widget keeps the raw text, the draft the trimmed text.
    pub fn record_field(&mut self, field: AppointmentField, raw: &str) {
        let value = match field {
            AppointmentField::Date => self
                .clamp_date(raw.trim())
                .unwrap_or_else(|| raw.to_string()),
            _ => raw.to_string(),
        };
        self.draft.set(field, value.trim());
        self.inputs.set(field, value);
    }

    /// True when `value` is a complete `YYYY-MM-DD` date earlier than the minimum.
    pub fn precedes_min_date(&self, value: &str) -> bool {
        parse_date(value.trim()).is_some_and(|date| date < self.min_date)
    }

    // A complete date before the minimum snaps to the minimum, like a picker with `min` set.
    fn clamp_date(&self, value: &str) -> Option<String> {
        if self.precedes_min_date(value) {
            Some(format_date(self.min_date))
        } else {
            None
        }
    }

    pub fn begin_edit(&mut self, appointment: &Appointment) {
        self.draft = AppointmentDraft::from_appointment(appointment);
        self.inputs = AppointmentDraft::from_appointment(appointment);
        self.mode = FormMode::Editing;
        self.focus = AppointmentField::PetName;
        tracing::debug!(id = appointment.id, "editing appointment");
    }

    /// Clears every field and input. The draft id and the mode are left alone.
    pub fn reset_draft(&mut self) {
        self.draft.clear_fields();
        self.inputs.clear_fields();
        self.focus = AppointmentField::PetName;
    }

    /// Leaves edit mode after the pending changes were stored.
    pub fn finish_edit(&mut self) {
        self.mode = FormMode::Creating;
    }

    pub fn focus_field(&mut self, field: AppointmentField) {
        self.focus = field;
    }

    pub fn focus_next(&mut self) {
        self.shift_focus(1);
    }

    pub fn focus_previous(&mut self) {
        self.shift_focus(-1);
    }

    fn shift_focus(&mut self, delta: isize) {
        let fields: Vec<_> = AppointmentField::all().collect();
        let len = fields.len() as isize;
        let current = fields
            .iter()
            .position(|field| *field == self.focus)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.focus = fields[next];
    }

    pub fn push_char(&mut self, ch: char) {
        let field = self.focus;
        let mut value = self.inputs.get(field).to_string();
        value.push(ch);
        self.record_field(field, &value);
    }

    pub fn pop_char(&mut self) {
        let field = self.focus;
        let current = self.inputs.get(field);
        let cut = current
            .grapheme_indices(true)
            .next_back()
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let value = current[..cut].to_string();
        self.record_field(field, &value);
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub form: FormState,
    pub appointments: Vec<Appointment>,
    pub selected: usize,
    pub focus: FocusPane,
    notice: Option<Notice>,
    message_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(min_date: Date, message_timeout: Option<Duration>) -> Self {
        Self {
            form: FormState::new(min_date),
            appointments: Vec::new(),
            selected: 0,
            focus: FocusPane::Form,
            notice: None,
            message_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn selected(&self) -> Option<&Appointment> {
        self.appointments.get(self.selected)
    }

    /// Replaces the whole list with a fresh read of the store.
    pub fn render_list(&mut self, appointments: Vec<Appointment>) {
        self.appointments = appointments;
        self.normalize_selection();
    }

    /// Shows a notice, replacing whatever was on screen.
    pub fn show_message<S: Into<String>>(&mut self, text: S, kind: NoticeKind) {
        self.notice = Some(Notice {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        });
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn expire_notice(&mut self, now: Instant) {
        let (Some(notice), Some(timeout)) = (&self.notice, self.message_timeout) else {
            return;
        };
        if now.saturating_duration_since(notice.shown_at) >= timeout {
            self.notice = None;
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.appointments.is_empty() {
            return;
        }
        let len = self.appointments.len() as isize;
        let next = (self.selected as isize + delta).clamp(0, len - 1);
        self.selected = next as usize;
    }

    pub fn set_focus(&mut self, focus: FocusPane) {
        self.focus = focus;
    }

    /// Loads the selected record into the form. Returns false when nothing is selected.
    pub fn edit_selected(&mut self) -> bool {
        let Some(appointment) = self.selected().cloned() else {
            return false;
        };
        self.form.begin_edit(&appointment);
        self.focus = FocusPane::Form;
        true
    }

    fn normalize_selection(&mut self) {
        if self.appointments.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.appointments.len() {
            self.selected = self.appointments.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn appointment(id: i64) -> Appointment {
        Appointment {
            id,
            pet_name: "Rex".into(),
            owner_name: "Ana".into(),
            phone: "987654321".into(),
            date: "2030-01-01".into(),
            time: "10:00".into(),
            symptoms: "cough".into(),
        }
    }

    #[test]
    fn record_field_trims_into_draft_but_keeps_raw_input() {
        let mut form = FormState::new(date!(2026 - 01 - 01));
        form.record_field(AppointmentField::OwnerName, "  Ana  ");
        assert_eq!(form.draft().owner_name, "Ana");
        assert_eq!(form.input(AppointmentField::OwnerName), "  Ana  ");
    }

    #[test]
    fn begin_edit_copies_record_and_switches_label() {
        let mut form = FormState::new(date!(2026 - 01 - 01));
        assert_eq!(form.submit_label(), CREATE_LABEL);
        form.begin_edit(&appointment(11));
        assert_eq!(form.mode(), FormMode::Editing);
        assert_eq!(form.submit_label(), SAVE_LABEL);
        assert_eq!(form.draft().id, Some(11));
        assert_eq!(form.input(AppointmentField::Symptoms), "cough");
    }

    #[test]
    fn reset_clears_fields_but_not_id_or_mode() {
        let mut form = FormState::new(date!(2026 - 01 - 01));
        form.begin_edit(&appointment(11));
        form.reset_draft();
        assert_eq!(form.draft().id, Some(11));
        assert!(form.draft().pet_name.is_empty());
        assert!(form.input(AppointmentField::Phone).is_empty());
        assert!(form.is_editing());

        form.finish_edit();
        assert_eq!(form.submit_label(), CREATE_LABEL);
    }

    #[test]
    fn past_dates_snap_to_minimum() {
        let mut form = FormState::new(date!(2026 - 10 - 16));
        form.record_field(AppointmentField::Date, "2020-05-01");
        assert_eq!(form.draft().date, "2026-10-16");
        assert_eq!(form.input(AppointmentField::Date), "2026-10-16");

        form.record_field(AppointmentField::Date, "2027-01-02");
        assert_eq!(form.draft().date, "2027-01-02");

        form.record_field(AppointmentField::Date, "2020-05");
        assert_eq!(form.draft().date, "2020-05");
    }

    #[test]
    fn precedes_min_date_only_flags_complete_past_dates() {
        let form = FormState::new(date!(2026 - 10 - 16));
        assert!(form.precedes_min_date("2026-10-15"));
        assert!(form.precedes_min_date(" 2020-01-01 "));
        assert!(!form.precedes_min_date("2026-10-16"));
        assert!(!form.precedes_min_date("2020-01"));
        assert!(!form.precedes_min_date("tomorrow"));
    }

    #[test]
    fn long_input_keeps_every_keystroke() {
        let mut form = FormState::new(date!(2026 - 01 - 01));
        form.focus_field(AppointmentField::Symptoms);
        let text = "x".repeat(300);
        for ch in text.chars() {
            form.push_char(ch);
        }
        assert_eq!(form.input(AppointmentField::Symptoms), text);
        assert_eq!(form.draft().symptoms.len(), 300);
    }

    #[test]
    fn keystrokes_edit_the_focused_field() {
        let mut form = FormState::new(date!(2026 - 01 - 01));
        form.focus_next();
        assert_eq!(form.focused(), AppointmentField::OwnerName);
        for ch in "Zoë ".chars() {
            form.push_char(ch);
        }
        assert_eq!(form.draft().owner_name, "Zoë");
        form.pop_char();
        form.pop_char();
        assert_eq!(form.input(AppointmentField::OwnerName), "Zo");

        form.focus_previous();
        form.focus_previous();
        assert_eq!(form.focused(), AppointmentField::Symptoms);
    }

    #[test]
    fn new_notice_replaces_old_and_expires() {
        let mut state = AppState::new(date!(2026 - 01 - 01), Some(Duration::from_millis(50)));
        state.show_message("first", NoticeKind::Info);
        state.show_message("second", NoticeKind::Error);
        let notice = state.notice().expect("notice");
        assert_eq!(notice.text, "second");
        assert_eq!(notice.kind, NoticeKind::Error);

        let shown_at = notice.shown_at;
        state.expire_notice(shown_at + Duration::from_millis(10));
        assert!(state.notice().is_some());
        state.expire_notice(shown_at + Duration::from_millis(60));
        assert!(state.notice().is_none());
    }

    #[test]
    fn render_list_rebuilds_and_clamps_selection() {
        let mut state = AppState::new(date!(2026 - 01 - 01), None);
        state.render_list(vec![appointment(1), appointment(2), appointment(3)]);
        state.move_selection(5);
        assert_eq!(state.selected().map(|a| a.id), Some(3));

        state.render_list(vec![appointment(1)]);
        assert_eq!(state.selected().map(|a| a.id), Some(1));
        state.render_list(Vec::new());
        assert!(state.selected().is_none());
        assert!(!state.edit_selected());
    }
}
