//! Minimal VTODO codec.
//!
//! Covers exactly the properties this system round-trips through the
//! store: UID, SUMMARY, DTSTART, DURATION, STATUS and the correlation
//! property. Times are written and read in the UTC basic format
//! (`20260317T100000Z`); entries using other forms come back with no
//! start, which reconciliation tolerates since it matches on the
//! correlation key alone.

use chrono::{DateTime, NaiveDateTime, Utc};

use super::{ItemDraft, TASK_UUID_PROPERTY};

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Maximum content-line length before folding (RFC 5545 §3.1).
const FOLD_WIDTH: usize = 75;

/// A VTODO component as parsed off the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTodo {
    pub uid: Option<String>,
    pub summary: String,
    pub task_uuid: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    pub completed: bool,
}

/// Render a draft as a complete iCalendar object holding one VTODO.
pub fn render_todo(draft: &ItemDraft, stamp: DateTime<Utc>) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//timeblock//timeblock-core//EN".to_string(),
        "BEGIN:VTODO".to_string(),
        format!("UID:{}", draft.correlation_key),
        format!("DTSTAMP:{}", format_utc(stamp)),
        format!("DTSTART:{}", format_utc(draft.start)),
        format!("DURATION:PT{}M", draft.duration_minutes),
        format!("SUMMARY:{}", escape_text(&draft.summary)),
        format!("{}:{}", TASK_UUID_PROPERTY, draft.correlation_key),
        "END:VTODO".to_string(),
        "END:VCALENDAR".to_string(),
    ];
    for line in &mut lines {
        *line = fold_line(line);
    }
    lines.join("\r\n") + "\r\n"
}

/// Parse the first VTODO component out of an iCalendar object.
pub fn parse_todo(ics: &str) -> Option<ParsedTodo> {
    let lines = unfold(ics);
    let mut todo = ParsedTodo::default();
    let mut inside = false;
    let mut found = false;

    for line in lines {
        match line.as_str() {
            "BEGIN:VTODO" => {
                inside = true;
                found = true;
            }
            "END:VTODO" => break,
            _ if inside => {
                let Some((name, value)) = split_property(&line) else {
                    continue;
                };
                match name.as_str() {
                    "UID" => todo.uid = Some(value.to_string()),
                    "SUMMARY" => todo.summary = unescape_text(value),
                    "DTSTART" => todo.start = parse_utc(value),
                    "DURATION" => todo.duration_minutes = parse_duration_minutes(value),
                    "STATUS" => todo.completed = value.eq_ignore_ascii_case("COMPLETED"),
                    name if name == TASK_UUID_PROPERTY => {
                        todo.task_uuid = Some(value.to_string())
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    found.then_some(todo)
}

pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format(UTC_FORMAT).to_string()
}

fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, UTC_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse an ISO 8601 duration down to minutes; seconds are ignored.
fn parse_duration_minutes(raw: &str) -> Option<u32> {
    let rest = raw.strip_prefix("PT").or_else(|| raw.strip_prefix("+PT"))?;
    let mut minutes = 0u32;
    let mut digits = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let value: u32 = digits.parse().ok()?;
        digits.clear();
        match ch {
            'H' => minutes += value * 60,
            'M' => minutes += value,
            'S' => {}
            _ => return None,
        }
    }
    Some(minutes)
}

/// `NAME;PARAMS:VALUE` → (NAME, VALUE); parameters are dropped.
fn split_property(line: &str) -> Option<(String, &str)> {
    let colon = line.find(':')?;
    let (head, value) = line.split_at(colon);
    let name = head.split(';').next().unwrap_or(head);
    Some((name.to_ascii_uppercase(), &value[1..]))
}

/// Join folded continuation lines (leading space or tab).
fn unfold(ics: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in ics.lines() {
        if let Some(rest) = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t')) {
            if let Some(last) = lines.last_mut() {
                last.push_str(rest);
                continue;
            }
        }
        lines.push(raw.to_string());
    }
    lines
}

fn fold_line(line: &str) -> String {
    if line.len() <= FOLD_WIDTH {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + line.len() / FOLD_WIDTH * 3);
    let mut width = 0;
    for ch in line.chars() {
        if width + ch.len_utf8() > FOLD_WIDTH {
            out.push_str("\r\n ");
            width = 1; // continuation marker counts toward the next line
        }
        out.push(ch);
        width += ch.len_utf8();
    }
    out
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft() -> ItemDraft {
        ItemDraft {
            correlation_key: "11111111-2222".into(),
            start: Utc.with_ymd_and_hms(2026, 3, 17, 10, 0, 0).unwrap(),
            duration_minutes: 60,
            summary: "Write report; final, really".into(),
        }
    }

    #[test]
    fn rendered_todo_parses_back() {
        let ics = render_todo(&draft(), Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap());
        let todo = parse_todo(&ics).unwrap();

        assert_eq!(todo.uid.as_deref(), Some("11111111-2222"));
        assert_eq!(todo.task_uuid.as_deref(), Some("11111111-2222"));
        assert_eq!(todo.summary, "Write report; final, really");
        assert_eq!(
            todo.start,
            Some(Utc.with_ymd_and_hms(2026, 3, 17, 10, 0, 0).unwrap())
        );
        assert_eq!(todo.duration_minutes, Some(60));
        assert!(!todo.completed);
    }

    #[test]
    fn rendered_lines_stay_within_fold_width() {
        let mut long = draft();
        long.summary = "x".repeat(300);
        let ics = render_todo(&long, Utc::now());
        for line in ics.lines() {
            assert!(line.len() <= FOLD_WIDTH, "line too long: {}", line.len());
        }
        // And the summary survives the fold round-trip.
        assert_eq!(parse_todo(&ics).unwrap().summary, "x".repeat(300));
    }

    #[test]
    fn parses_completed_status() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:a\r\nSTATUS:COMPLETED\r\nSUMMARY:done\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
        assert!(parse_todo(ics).unwrap().completed);
    }

    #[test]
    fn property_parameters_are_ignored() {
        let ics = "BEGIN:VTODO\r\nSUMMARY;LANGUAGE=en:hello\r\nEND:VTODO\r\n";
        assert_eq!(parse_todo(ics).unwrap().summary, "hello");
    }

    #[test]
    fn non_utc_start_is_dropped_not_mangled() {
        let ics = "BEGIN:VTODO\r\nUID:a\r\nDTSTART;TZID=Europe/Paris:20260317T100000\r\nEND:VTODO\r\n";
        assert!(parse_todo(ics).unwrap().start.is_none());
    }

    #[test]
    fn no_vtodo_component_is_none() {
        assert!(parse_todo("BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n").is_none());
    }

    #[test]
    fn duration_hours_and_minutes() {
        assert_eq!(parse_duration_minutes("PT1H30M"), Some(90));
        assert_eq!(parse_duration_minutes("PT45M"), Some(45));
        assert_eq!(parse_duration_minutes("PT2H"), Some(120));
        assert_eq!(parse_duration_minutes("whenever"), None);
    }

    #[test]
    fn text_escaping_round_trips() {
        let tricky = "a;b,c\\d\nnewline";
        assert_eq!(unescape_text(&escape_text(tricky)), tricky);
    }
}
