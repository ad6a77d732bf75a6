//! CalDAV-backed calendar store.
//!
//! Talks to one CalDAV collection over HTTP basic auth:
//! - `REPORT` calendar-query to list the collection's VTODOs
//! - `PUT` with `If-None-Match: *` to create without ever overwriting
//! - `DELETE` on the entry href, absent entries counting as deleted
//!
//! The client owns a current-thread tokio runtime and blocks on each
//! request; the planning pipeline is a single synchronous sequence.

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};

use super::ics;
use super::{CalendarItem, CalendarStore, ItemDraft};
use crate::config::CalendarConfig;
use crate::error::CalendarError;
use crate::secrets;

const CALENDAR_QUERY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<c:calendar-query xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav">
  <d:prop>
    <d:getetag/>
    <c:calendar-data/>
  </d:prop>
  <c:filter>
    <c:comp-filter name="VCALENDAR">
      <c:comp-filter name="VTODO"/>
    </c:comp-filter>
  </c:filter>
</c:calendar-query>"#;

/// Calendar store over one CalDAV collection.
pub struct CaldavStore {
    http: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    collection_url: String,
    origin: String,
    username: String,
    password: String,
}

impl CaldavStore {
    /// # Errors
    ///
    /// [`CalendarError::Client`] when the collection URL is missing or
    /// malformed, or the runtime cannot start.
    pub fn new(collection_url: &str, username: &str, password: &str) -> Result<Self, CalendarError> {
        if collection_url.is_empty() {
            return Err(CalendarError::Client(
                "no calendar collection URL configured".into(),
            ));
        }
        let collection_url = if collection_url.ends_with('/') {
            collection_url.to_string()
        } else {
            format!("{collection_url}/")
        };
        let origin = origin_of(&collection_url).ok_or_else(|| {
            CalendarError::Client(format!("invalid collection URL: {collection_url}"))
        })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CalendarError::Client(e.to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            runtime,
            collection_url,
            origin,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Build from config, with the password from the OS keyring.
    ///
    /// # Errors
    ///
    /// [`CalendarError::Credentials`] when no password is stored.
    pub fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        let password = secrets::get(secrets::CALDAV_PASSWORD_KEY)
            .map_err(|e| CalendarError::Credentials(e.to_string()))?
            .ok_or_else(|| {
                CalendarError::Credentials(
                    "no CalDAV password stored; run 'timeblock-cli auth login'".into(),
                )
            })?;
        Self::new(&config.collection_url, &config.username, &password)
    }

    fn absolute(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.origin, href)
        } else {
            format!("{}{}", self.collection_url, href)
        }
    }

    fn item_url(&self, correlation_key: &str) -> String {
        format!("{}{}.ics", self.collection_url, correlation_key)
    }
}

impl CalendarStore for CaldavStore {
    fn list_items(&self, include_completed: bool) -> Result<Vec<CalendarItem>, CalendarError> {
        let report = Method::from_bytes(b"REPORT")
            .map_err(|e| CalendarError::Client(e.to_string()))?;

        let response = self.runtime.block_on(
            self.http
                .request(report, &self.collection_url)
                .basic_auth(&self.username, Some(&self.password))
                .header("Depth", "1")
                .header(CONTENT_TYPE, "application/xml; charset=utf-8")
                .body(CALENDAR_QUERY)
                .send(),
        )?;

        let status = response.status();
        if !(status.is_success() || status == StatusCode::MULTI_STATUS) {
            return Err(CalendarError::UnexpectedStatus {
                operation: "list".into(),
                status: status.as_u16(),
            });
        }

        let body = self.runtime.block_on(response.text())?;
        parse_multistatus(&body, include_completed, |href| self.absolute(href))
    }

    fn create_item(&self, draft: &ItemDraft) -> Result<CalendarItem, CalendarError> {
        let url = self.item_url(&draft.correlation_key);
        let body = ics::render_todo(draft, Utc::now());

        let response = self.runtime.block_on(
            self.http
                .put(&url)
                .basic_auth(&self.username, Some(&self.password))
                .header("If-None-Match", "*")
                .header(CONTENT_TYPE, "text/calendar; charset=utf-8")
                .body(body)
                .send(),
        )?;

        match response.status() {
            StatusCode::PRECONDITION_FAILED => Err(CalendarError::AlreadyExists {
                key: draft.correlation_key.clone(),
            }),
            status if status.is_success() => Ok(CalendarItem {
                href: url,
                task_uuid: Some(draft.correlation_key.clone()),
                summary: draft.summary.clone(),
                start: Some(draft.start),
                duration_minutes: Some(draft.duration_minutes),
                completed: false,
            }),
            status => Err(CalendarError::UnexpectedStatus {
                operation: format!("create {}", draft.correlation_key),
                status: status.as_u16(),
            }),
        }
    }

    fn delete_item(&self, item: &CalendarItem) -> Result<(), CalendarError> {
        let response = self.runtime.block_on(
            self.http
                .delete(&item.href)
                .basic_auth(&self.username, Some(&self.password))
                .send(),
        )?;

        match response.status() {
            // Already gone counts as deleted.
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(CalendarError::UnexpectedStatus {
                operation: format!("delete {}", item.href),
                status: status.as_u16(),
            }),
        }
    }
}

/// Extract calendar items from a DAV multistatus body.
fn parse_multistatus(
    body: &str,
    include_completed: bool,
    absolute: impl Fn(&str) -> String,
) -> Result<Vec<CalendarItem>, CalendarError> {
    let mut items = Vec::new();
    let mut pos = 0;

    while let Some((start, end, after)) = find_element(body, "response", pos) {
        pos = after;
        let block = &body[start..end];

        let Some(href) = element_text(block, "href") else {
            continue;
        };
        let Some(data) = element_text(block, "calendar-data") else {
            continue;
        };
        if data.trim().is_empty() {
            continue;
        }

        let Some(todo) = ics::parse_todo(&data) else {
            return Err(CalendarError::Parse(format!(
                "no VTODO in calendar-data for {href}"
            )));
        };
        if todo.completed && !include_completed {
            continue;
        }

        items.push(CalendarItem {
            href: absolute(href.trim()),
            task_uuid: todo.task_uuid,
            summary: todo.summary,
            start: todo.start,
            duration_minutes: todo.duration_minutes,
            completed: todo.completed,
        });
    }

    Ok(items)
}

/// First element with the given local name at or after `from`; returns
/// (content start, content end, scan-resume offset). Namespace prefixes
/// are ignored; DAV servers disagree on them.
fn find_element(xml: &str, local: &str, from: usize) -> Option<(usize, usize, usize)> {
    let mut i = from;
    while let Some(off) = xml.get(i..)?.find('<') {
        let tag_start = i + off;
        let rest = &xml[tag_start + 1..];
        if rest.starts_with('/') || rest.starts_with('?') || rest.starts_with('!') {
            i = tag_start + 1;
            continue;
        }

        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        if !matches_local(&rest[..name_end], local) {
            i = tag_start + 1;
            continue;
        }

        let gt = xml[tag_start..].find('>')? + tag_start;
        if xml.as_bytes()[gt - 1] == b'/' {
            return Some((gt + 1, gt + 1, gt + 1));
        }

        let content_start = gt + 1;
        let mut j = content_start;
        while let Some(close_off) = xml[j..].find("</") {
            let close_start = j + close_off;
            let close_rest = &xml[close_start + 2..];
            let close_end = close_rest.find('>')?;
            if matches_local(close_rest[..close_end].trim(), local) {
                return Some((content_start, close_start, close_start + 2 + close_end + 1));
            }
            j = close_start + 2;
        }
        return None;
    }
    None
}

fn element_text(xml: &str, local: &str) -> Option<String> {
    let (start, end, _) = find_element(xml, local, 0)?;
    Some(xml_unescape(&xml[start..end]))
}

fn matches_local(name: &str, local: &str) -> bool {
    let bare = name.rsplit(':').next().unwrap_or(name);
    bare.eq_ignore_ascii_case(local)
}

fn xml_unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        match &tail[1..semi] {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            entity => {
                let code = entity
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()));
                match code.and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => out.push_str(&tail[..=semi]),
                }
            }
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}

/// `scheme://host[:port]` portion of an absolute URL.
fn origin_of(url: &str) -> Option<String> {
    let scheme_end = url.find("://")?;
    let authority = &url[scheme_end + 3..];
    if authority.is_empty() {
        return None;
    }
    match authority.find('/') {
        Some(slash) => Some(url[..scheme_end + 3 + slash].to_string()),
        None => Some(url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn multistatus_body() -> String {
        let todo_a = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:aaa\r\nDTSTART:20260317T100000Z\r\nDURATION:PT60M\r\nSUMMARY:Write report\r\nX-TASKWARRIOR-UUID:aaa\r\nEND:VTODO\r\nEND:VCALENDAR";
        let todo_b = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:bbb\r\nSTATUS:COMPLETED\r\nSUMMARY:Old chore\r\nX-TASKWARRIOR-UUID:bbb\r\nEND:VTODO\r\nEND:VCALENDAR";
        format!(
            r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:" xmlns:cal="urn:ietf:params:xml:ns:caldav">
  <d:response>
    <d:href>/cal/aaa.ics</d:href>
    <d:propstat>
      <d:prop>
        <d:getetag>"etag-a"</d:getetag>
        <cal:calendar-data>{todo_a}</cal:calendar-data>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/cal/bbb.ics</d:href>
    <d:propstat>
      <d:prop>
        <cal:calendar-data>{todo_b}</cal:calendar-data>
      </d:prop>
    </d:propstat>
  </d:response>
</d:multistatus>"#
        )
    }

    #[test]
    fn lists_todos_from_multistatus() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("REPORT", "/cal/")
            .match_header("depth", "1")
            .with_status(207)
            .with_body(multistatus_body())
            .create();

        let store =
            CaldavStore::new(&format!("{}/cal/", server.url()), "alice", "secret").unwrap();
        let items = store.list_items(true).unwrap();

        mock.assert();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].task_uuid.as_deref(), Some("aaa"));
        assert_eq!(items[0].summary, "Write report");
        assert_eq!(
            items[0].start,
            Some(Utc.with_ymd_and_hms(2026, 3, 17, 10, 0, 0).unwrap())
        );
        assert_eq!(items[0].href, format!("{}/cal/aaa.ics", server.url()));
        assert!(items[1].completed);
    }

    #[test]
    fn completed_todos_are_filtered_on_request() {
        let mut server = mockito::Server::new();
        server
            .mock("REPORT", "/cal/")
            .with_status(207)
            .with_body(multistatus_body())
            .create();

        let store =
            CaldavStore::new(&format!("{}/cal/", server.url()), "alice", "secret").unwrap();
        let items = store.list_items(false).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].task_uuid.as_deref(), Some("aaa"));
    }

    #[test]
    fn list_surfaces_unexpected_status() {
        let mut server = mockito::Server::new();
        server.mock("REPORT", "/cal/").with_status(403).create();

        let store =
            CaldavStore::new(&format!("{}/cal/", server.url()), "alice", "secret").unwrap();
        assert!(matches!(
            store.list_items(true),
            Err(CalendarError::UnexpectedStatus { status: 403, .. })
        ));
    }

    #[test]
    fn create_puts_with_no_overwrite_precondition() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("PUT", "/cal/task-1.ics")
            .match_header("if-none-match", "*")
            .with_status(201)
            .create();

        let store =
            CaldavStore::new(&format!("{}/cal/", server.url()), "alice", "secret").unwrap();
        let draft = ItemDraft {
            correlation_key: "task-1".into(),
            start: Utc.with_ymd_and_hms(2026, 3, 17, 10, 0, 0).unwrap(),
            duration_minutes: 60,
            summary: "Write report".into(),
        };
        let item = store.create_item(&draft).unwrap();

        mock.assert();
        assert_eq!(item.task_uuid.as_deref(), Some("task-1"));
        assert!(item.href.ends_with("/cal/task-1.ics"));
    }

    #[test]
    fn create_conflict_is_already_exists() {
        let mut server = mockito::Server::new();
        server
            .mock("PUT", "/cal/task-1.ics")
            .with_status(412)
            .create();

        let store =
            CaldavStore::new(&format!("{}/cal/", server.url()), "alice", "secret").unwrap();
        let draft = ItemDraft {
            correlation_key: "task-1".into(),
            start: Utc::now(),
            duration_minutes: 30,
            summary: "dup".into(),
        };
        assert!(matches!(
            store.create_item(&draft),
            Err(CalendarError::AlreadyExists { key }) if key == "task-1"
        ));
    }

    #[test]
    fn delete_tolerates_absent_items() {
        let mut server = mockito::Server::new();
        server
            .mock("DELETE", "/cal/gone.ics")
            .with_status(404)
            .create();

        let store =
            CaldavStore::new(&format!("{}/cal/", server.url()), "alice", "secret").unwrap();
        let item = CalendarItem {
            href: format!("{}/cal/gone.ics", server.url()),
            task_uuid: Some("gone".into()),
            summary: "gone".into(),
            start: None,
            duration_minutes: None,
            completed: false,
        };
        assert!(store.delete_item(&item).is_ok());
    }

    #[test]
    fn rejects_empty_collection_url() {
        assert!(matches!(
            CaldavStore::new("", "alice", "secret"),
            Err(CalendarError::Client(_))
        ));
    }

    #[test]
    fn origin_extraction() {
        assert_eq!(
            origin_of("https://dav.example.net/cal/alice/").as_deref(),
            Some("https://dav.example.net")
        );
        assert_eq!(
            origin_of("http://localhost:8080").as_deref(),
            Some("http://localhost:8080")
        );
        assert!(origin_of("not a url").is_none());
    }

    #[test]
    fn xml_unescape_handles_entities() {
        assert_eq!(xml_unescape("a &amp; b &lt;c&gt; &#13;"), "a & b <c> \r");
        assert_eq!(xml_unescape("plain"), "plain");
    }
}
