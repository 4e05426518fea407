use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::state::{format_date, AppState, FocusPane, FormState, NoticeKind};
use crate::appointment::{Appointment, AppointmentField};

const LABEL_WIDTH: usize = 12;

pub fn draw_app(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(vertical[0]);

    let form_border = border_style(state.focus == FocusPane::Form);
    let form_title = match state.form.draft().id {
        Some(id) if state.form.is_editing() => format!("Edit appointment #{id}"),
        _ => "New appointment".to_string(),
    };
    let form = Paragraph::new(form_lines(&state.form, state.focus == FocusPane::Form))
        .block(
            Block::default()
                .title(form_title)
                .borders(Borders::ALL)
                .border_style(form_border),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(form, columns[0]);

    let mut items: Vec<ListItem> = state
        .appointments
        .iter()
        .map(|appointment| ListItem::new(appointment_lines(appointment)))
        .collect();
    if items.is_empty() {
        items.push(ListItem::new("No appointments yet. Fill in the form and press Enter."));
    }
    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("Appointments ({})", state.len()))
                .borders(Borders::ALL)
                .border_style(border_style(state.focus == FocusPane::List)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, columns[1], list_state);

    frame.render_widget(Paragraph::new(notice_line(state)), vertical[1]);
    frame.render_widget(
        Paragraph::new(help_line(state.focus)).style(Style::default().fg(Color::Gray)),
        vertical[2],
    );
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn form_lines(form: &FormState, focused: bool) -> Text<'static> {
    let mut lines = Vec::with_capacity(AppointmentField::all().count() + 4);
    for field in AppointmentField::all() {
        let active = focused && form.focused() == field;
        let label_style = if active {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mut spans = vec![Span::styled(
            format!("{:<width$}", field.label(), width = LABEL_WIDTH),
            label_style,
        )];
        let value = form.input(field);
        if value.is_empty() && !active {
            spans.push(Span::styled(
                field.placeholder().to_string(),
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            spans.push(Span::raw(value.to_string()));
        }
        if active {
            spans.push(Span::styled("▌", Style::default().fg(Color::Cyan)));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Earliest date: {}", format_date(form.min_date())),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("[Enter] "),
        Span::styled(
            form.submit_label(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    Text::from(lines)
}

fn appointment_lines(appointment: &Appointment) -> Vec<Line<'static>> {
    let detail = Style::default().fg(Color::Gray);
    vec![
        Line::from(vec![
            Span::styled(
                appointment.pet_name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  #{}", appointment.id), detail),
        ]),
        Line::from(Span::styled(
            format!(
                "Owner: {}  Phone: {}",
                appointment.owner_name, appointment.phone
            ),
            detail,
        )),
        Line::from(Span::styled(
            format!("Date: {}  Time: {}", appointment.date, appointment.time),
            detail,
        )),
        Line::from(Span::styled(
            format!("Symptoms: {}", appointment.symptoms),
            detail,
        )),
        Line::from(Span::styled(
            "[e] edit  [d] delete",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn notice_line(state: &AppState) -> Line<'static> {
    let Some(notice) = state.notice() else {
        return Line::from("");
    };
    let style = match notice.kind {
        NoticeKind::Info => Style::default().fg(Color::Green),
        NoticeKind::Error => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
    };
    Line::from(Span::styled(notice.text.clone(), style))
}

fn help_line(focus: FocusPane) -> &'static str {
    match focus {
        FocusPane::Form => "Tab/Shift-Tab fields • Enter submit • Esc list • Ctrl-c quit",
        FocusPane::List => "j/k move • e edit • d delete • Tab form • Ctrl-r refresh • q quit",
    }
}
