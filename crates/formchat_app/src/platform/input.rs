use chrono::{DateTime, Utc};
use formchat_core::{AppViewModel, FieldSpec, MessageId, Msg};

pub const HELP: &str = "\
commands:
  <text>                 type and send a message
  /hold N                start selecting with message N
  /tap N                 toggle message N while selecting
  /cancel                clear the selection
  /use CODE              fill template CODE from the selection
  /new CODE              start an empty form for template CODE
  /set PATH VALUE        edit a draft field, e.g. /set vitals.bp 120/80
  /save | /discard       save or drop the open draft
  /edit-form ID          reopen a saved form as a draft
  /refresh               reload templates and forms
  /make-template NAME FIELD...
                         create a template; FIELD is ID[:TYPE][!], ! = required,
                         e.g. /make-template Intake patient.name! patient.age:number
  /rename-template ID NAME
  /rm-template ID        delete a template
  /rm-form ID            delete a form
  /listen                toggle voice input
  /dismiss               hide the current notice
  /open | /close         reconnect or leave the chat screen
  /help | /quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Vec<Msg>),
    Help,
    Quit,
    /// Not understood; the reason is shown to the user.
    Invalid(String),
}

/// Parses one terminal line against what the user currently sees.
pub fn parse_line(line: &str, view: &AppViewModel, now: DateTime<Utc>) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Dispatch(Vec::new());
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Dispatch(vec![
            Msg::ComposeChanged(line.to_string()),
            Msg::SendClicked { at: now },
        ]);
    };

    let (verb, arg) = match rest.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (rest, ""),
    };
    let single = |msg: Msg| Command::Dispatch(vec![msg]);

    match verb {
        "hold" => match message_at(view, arg) {
            Ok(id) => single(Msg::MessageLongPressed(id)),
            Err(reason) => Command::Invalid(reason),
        },
        "tap" => match message_at(view, arg) {
            Ok(id) => single(Msg::MessageTapped(id)),
            Err(reason) => Command::Invalid(reason),
        },
        "cancel" => single(Msg::SelectionCancelled),
        "use" => single(Msg::HandoffRequested {
            template_code: arg.to_string(),
        }),
        "new" if arg.is_empty() => usage("/new CODE"),
        "new" => single(Msg::NewDraftRequested {
            template_code: arg.to_string(),
        }),
        "edit-form" if arg.is_empty() => usage("/edit-form ID"),
        "edit-form" => single(Msg::EditFormRequested {
            form_id: arg.to_string(),
        }),
        "set" => match arg.split_once(char::is_whitespace) {
            Some((path, value)) => single(Msg::DraftFieldEdited {
                path: path.to_string(),
                value: value.trim().to_string(),
            }),
            None => usage("/set PATH VALUE"),
        },
        "save" => single(Msg::DraftSaveClicked { at: now }),
        "discard" => single(Msg::DraftDiscarded),
        "refresh" => single(Msg::RefreshClicked),
        "make-template" => match template_args(arg) {
            Ok((name, fields)) => single(Msg::TemplateSubmitted { name, fields }),
            Err(reason) => Command::Invalid(reason),
        },
        "rename-template" => match arg.split_once(char::is_whitespace) {
            Some((template_id, name)) => single(Msg::TemplateRenamed {
                template_id: template_id.to_string(),
                name: name.trim().to_string(),
            }),
            None => usage("/rename-template ID NAME"),
        },
        "rm-template" if arg.is_empty() => usage("/rm-template ID"),
        "rm-template" => single(Msg::DeleteTemplateClicked {
            template_id: arg.to_string(),
        }),
        "rm-form" if arg.is_empty() => usage("/rm-form ID"),
        "rm-form" => single(Msg::DeleteFormClicked {
            form_id: arg.to_string(),
        }),
        "listen" => single(Msg::ListenToggled),
        "dismiss" => single(Msg::NoticeDismissed),
        "open" => single(Msg::ScreenOpened),
        "close" => single(Msg::ScreenClosed),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Invalid(format!("unknown command /{rest}; try /help")),
    }
}

fn usage(syntax: &str) -> Command {
    Command::Invalid(format!("usage: {syntax}"))
}

fn template_args(arg: &str) -> Result<(String, Vec<FieldSpec>), String> {
    let mut words = arg.split_whitespace();
    let name = words
        .next()
        .ok_or_else(|| "usage: /make-template NAME FIELD...".to_string())?;
    let fields = words.map(field_spec).collect::<Result<Vec<_>, _>>()?;
    if fields.is_empty() {
        return Err("usage: /make-template NAME FIELD...".into());
    }
    Ok((name.to_string(), fields))
}

/// `patient.age:number!` is a required number field inside section `patient`.
fn field_spec(word: &str) -> Result<FieldSpec, String> {
    let (word, required) = match word.strip_suffix('!') {
        Some(rest) => (rest, true),
        None => (word, false),
    };
    let (id, field_type) = match word.split_once(':') {
        Some((id, field_type)) => (id, field_type),
        None => (word, "text"),
    };
    if id.is_empty() || field_type.is_empty() {
        return Err(format!("bad field {word:?}; expected ID[:TYPE][!]"));
    }
    let label = id.rsplit('.').next().unwrap_or(id);
    Ok(FieldSpec {
        id: id.to_string(),
        field_type: field_type.to_string(),
        label: label.to_string(),
        required,
    })
}

fn message_at(view: &AppViewModel, arg: &str) -> Result<MessageId, String> {
    let index: usize = arg
        .parse()
        .map_err(|_| format!("expected a message number, got {arg:?}"))?;
    index
        .checked_sub(1)
        .and_then(|i| view.messages.get(i))
        .map(|row| row.id.clone())
        .ok_or_else(|| format!("no message {index}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formchat_core::{update, AppState};
    use pretty_assertions::assert_eq;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn view_with(texts: &[&str]) -> AppViewModel {
        let mut state = AppState::new();
        for text in texts {
            state = update(state, Msg::RemoteMessageReceived { text: text.to_string(), at: at() }).0;
        }
        state.view()
    }

    #[test]
    fn plain_text_composes_and_sends() {
        let command = parse_line("  BP 120/80  ", &AppViewModel::default(), at());
        assert_eq!(
            command,
            Command::Dispatch(vec![
                Msg::ComposeChanged("BP 120/80".into()),
                Msg::SendClicked { at: at() },
            ])
        );
    }

    #[test]
    fn message_numbers_are_one_based() {
        let view = view_with(&["first", "second"]);
        let second = view.messages[1].id.clone();

        assert_eq!(
            parse_line("/hold 2", &view, at()),
            Command::Dispatch(vec![Msg::MessageLongPressed(second)])
        );
        assert_eq!(
            parse_line("/tap 3", &view, at()),
            Command::Invalid("no message 3".into())
        );
        assert!(matches!(parse_line("/tap 0", &view, at()), Command::Invalid(_)));
        assert!(matches!(parse_line("/tap x", &view, at()), Command::Invalid(_)));
    }

    #[test]
    fn set_keeps_spaces_in_value() {
        assert_eq!(
            parse_line("/set patient.name Ada Lovelace", &AppViewModel::default(), at()),
            Command::Dispatch(vec![Msg::DraftFieldEdited {
                path: "patient.name".into(),
                value: "Ada Lovelace".into(),
            }])
        );
    }

    #[test]
    fn use_without_code_still_reaches_update() {
        assert_eq!(
            parse_line("/use", &AppViewModel::default(), at()),
            Command::Dispatch(vec![Msg::HandoffRequested {
                template_code: String::new()
            }])
        );
        assert_eq!(parse_line("/quit", &AppViewModel::default(), at()), Command::Quit);
        assert_eq!(
            parse_line("/edit-form f-1", &AppViewModel::default(), at()),
            Command::Dispatch(vec![Msg::EditFormRequested {
                form_id: "f-1".into()
            }])
        );
        assert!(matches!(
            parse_line("/frobnicate", &AppViewModel::default(), at()),
            Command::Invalid(_)
        ));
    }

    #[test]
    fn commands_missing_their_argument_print_usage() {
        let view = AppViewModel::default();
        for (line, expected) in [
            ("/new", "usage: /new CODE"),
            ("/rm-template", "usage: /rm-template ID"),
            ("/rm-form  ", "usage: /rm-form ID"),
            ("/edit-form", "usage: /edit-form ID"),
            ("/rename-template t-1", "usage: /rename-template ID NAME"),
            ("/set notes", "usage: /set PATH VALUE"),
        ] {
            assert_eq!(parse_line(line, &view, at()), Command::Invalid(expected.into()), "{line}");
        }
    }

    #[test]
    fn make_template_parses_field_specs() {
        let command = parse_line(
            "/make-template Intake patient.name! patient.age:number notes",
            &AppViewModel::default(),
            at(),
        );
        let spec = |id: &str, field_type: &str, label: &str, required| FieldSpec {
            id: id.into(),
            field_type: field_type.into(),
            label: label.into(),
            required,
        };
        assert_eq!(
            command,
            Command::Dispatch(vec![Msg::TemplateSubmitted {
                name: "Intake".into(),
                fields: vec![
                    spec("patient.name", "text", "name", true),
                    spec("patient.age", "number", "age", false),
                    spec("notes", "text", "notes", false),
                ],
            }])
        );
        assert!(matches!(
            parse_line("/make-template Intake", &AppViewModel::default(), at()),
            Command::Invalid(_)
        ));
        assert!(matches!(
            parse_line("/make-template Intake :text", &AppViewModel::default(), at()),
            Command::Invalid(_)
        ));
    }

    #[test]
    fn rename_template_keeps_spaces_in_name() {
        assert_eq!(
            parse_line("/rename-template t-1 Dental intake", &AppViewModel::default(), at()),
            Command::Dispatch(vec![Msg::TemplateRenamed {
                template_id: "t-1".into(),
                name: "Dental intake".into(),
            }])
        );
    }
}
