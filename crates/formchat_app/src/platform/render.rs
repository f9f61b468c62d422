use std::fmt::Write;

use formchat_core::{AppViewModel, ConnectionState, NoticeKind};
use serde_json::{Map, Value};

/// Renders the whole screen as plain text.
pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "── chat [{}] ──", connection_label(view.connection));

    if view.messages.is_empty() {
        out.push_str("  (no messages yet)\n");
    }
    for (index, row) in view.messages.iter().enumerate() {
        let marker = if row.selected { '*' } else { ' ' };
        let author = if row.is_user { "you" } else { "them" };
        let _ = writeln!(
            out,
            "{marker}{:>3} {} {author:>4}: {}",
            index + 1,
            row.timestamp.format("%H:%M"),
            row.text
        );
    }

    if view.selection_mode {
        let _ = writeln!(
            out,
            "selecting {} message(s); /use CODE to fill a form, /cancel to stop",
            view.selection.len()
        );
    }
    if view.handoff_pending {
        out.push_str("extracting form data...\n");
    }
    if view.listening {
        out.push_str("listening...\n");
    }
    if !view.compose.is_empty() {
        let _ = writeln!(out, "draft message: {}", view.compose);
    }

    if let Some(draft) = &view.draft {
        let _ = writeln!(
            out,
            "── form {}{}{} ──",
            draft.template_code,
            draft
                .form_id
                .as_deref()
                .map(|id| format!(" editing {id}"))
                .unwrap_or_default(),
            if draft.saving { " (saving)" } else { "" }
        );
        let mut lines = Vec::new();
        flatten_fields(&draft.data, "", &mut lines);
        if lines.is_empty() {
            out.push_str("  (empty)\n");
        }
        for (path, value) in lines {
            let _ = writeln!(out, "  {path} = {value}");
        }
    }

    if !view.templates.is_empty() {
        out.push_str("templates:");
        for template in &view.templates {
            let _ = write!(out, " {} ({})", template.code, template.title);
        }
        out.push('\n');
    }
    if !view.forms.is_empty() {
        let _ = writeln!(out, "forms: {}", view.forms.len());
        for form in &view.forms {
            let _ = writeln!(
                out,
                "  {} [{}] {} field(s){}",
                form.form_id,
                form.template_code,
                form.field_count,
                form.created_at
                    .as_deref()
                    .map(|at| format!(" at {at}"))
                    .unwrap_or_default()
            );
        }
    }

    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "! {}: {}", notice_label(notice.kind), notice.text);
    }
    out
}

fn connection_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "offline",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Open => "live",
        ConnectionState::Closed => "connection lost",
    }
}

fn notice_label(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Network => "network",
        NoticeKind::Validation => "check input",
        NoticeKind::EmptySelection => "selection",
        NoticeKind::Auth => "auth",
        NoticeKind::Speech => "voice",
    }
}

fn flatten_fields(data: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, String)>) {
    for (key, value) in data {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(children) => flatten_fields(children, &path, out),
            Value::String(text) => out.push((path, text.clone())),
            other => out.push((path, other.to_string())),
        }
    }
}
