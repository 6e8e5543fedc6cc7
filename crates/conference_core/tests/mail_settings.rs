use conference_core::{
    send_email, CollaboratorError, CollaboratorResult, ConferenceSettings, MailDraft, MailMessage,
    Mailer, SettingsError,
};
use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Default)]
struct Outbox {
    sent: RefCell<Vec<MailMessage>>,
    broken: bool,
}

impl Mailer for Outbox {
    fn send(&self, message: &MailMessage) -> CollaboratorResult<()> {
        if self.broken {
            return Err(CollaboratorError::Unavailable("smtp down".to_string()));
        }
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}

fn draft() -> MailDraft {
    MailDraft {
        subject: "Schedule".to_string(),
        body: "The timetable is out.".to_string(),
        ..MailDraft::default()
    }
}

#[test]
fn mail_is_skipped_without_allow_list() {
    let outbox = Outbox::default();
    let settings = ConferenceSettings::default();

    assert!(!send_email(&outbox, &settings, false, draft()).unwrap());
    assert!(outbox.sent.borrow().is_empty());
}

#[test]
fn forced_mail_uses_explicit_recipients() {
    let outbox = Outbox::default();
    let settings = ConferenceSettings::default();
    let mut draft = draft();
    draft.recipient_list = Some(vec!["speaker@example.org".to_string()]);

    assert!(send_email(&outbox, &settings, true, draft).unwrap());
    let sent = outbox.sent.borrow();
    assert_eq!(sent[0].recipient_list, vec!["speaker@example.org"]);
    assert_eq!(sent[0].from_email, "webmaster@localhost");
}

#[test]
fn allow_list_fills_missing_addresses() {
    let outbox = Outbox::default();
    let settings = ConferenceSettings {
        send_email_to: vec!["staff@example.org".to_string()],
        default_from_email: "conf@example.org".to_string(),
        ..ConferenceSettings::default()
    };

    assert!(send_email(&outbox, &settings, false, draft()).unwrap());
    assert_eq!(
        outbox.sent.borrow()[0],
        MailMessage {
            subject: "Schedule".to_string(),
            body: "The timetable is out.".to_string(),
            from_email: "conf@example.org".to_string(),
            recipient_list: vec!["staff@example.org".to_string()],
        }
    );
}

#[test]
fn transport_errors_propagate() {
    let outbox = Outbox {
        broken: true,
        ..Outbox::default()
    };
    let err = send_email(&outbox, &ConferenceSettings::default(), true, draft()).unwrap_err();
    assert!(matches!(err, CollaboratorError::Unavailable(_)));
}

#[test]
fn settings_fill_defaults_for_missing_fields() {
    let settings = ConferenceSettings::from_json_str(r#"{"slot_minutes": 30}"#).unwrap();
    assert_eq!(settings.slot_minutes, 30);
    assert_eq!(settings.missing_vote, 5);
    assert_eq!(settings.ranking_engine, PathBuf::from("voteengine"));
    assert_eq!(settings.feed_cache_ttl(), Duration::from_secs(300));
    assert!(settings.send_email_to.is_empty());

    assert_eq!(
        ConferenceSettings::from_json_str("{}").unwrap(),
        ConferenceSettings::default()
    );
}

#[test]
fn settings_reject_unusable_values() {
    let err = ConferenceSettings::from_json_str(r#"{"slot_minutes": 0}"#).unwrap_err();
    assert!(matches!(err, SettingsError::Invalid(_)));

    let err = ConferenceSettings::from_json_str(r#"{"send_email_to": ["a@b.c", " "]}"#)
        .unwrap_err();
    assert!(matches!(err, SettingsError::Invalid(_)));

    let err = ConferenceSettings::from_json_str(r#"{"slot_minutes": "15"}"#).unwrap_err();
    assert!(matches!(err, SettingsError::Parse(_)));
}

#[test]
fn settings_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"missing_vote": 3, "badge_program": "/opt/badge"}}"#).unwrap();

    let settings = ConferenceSettings::load(file.path()).unwrap();
    assert_eq!(settings.missing_vote, 3);
    assert_eq!(settings.badge_program, PathBuf::from("/opt/badge"));

    let dir = tempfile::tempdir().unwrap();
    let err = ConferenceSettings::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SettingsError::Io { .. }));
}
