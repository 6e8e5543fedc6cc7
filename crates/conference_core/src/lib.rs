//! Core logic for the conference toolkit.
//! The timetable grid engine lives here, next to thin boundaries to the
//! external collaborators (ranking, feed, badges, mail).

pub mod integrations;
pub mod logging;
pub mod settings;
pub mod timetable;

pub use integrations::badge::{render_badges, TicketGroup};
pub use integrations::feed::{CachedFeed, FeedEntry, FeedSource};
pub use integrations::mail::{send_email, MailDraft, MailMessage, Mailer};
pub use integrations::ranking::{
    ballot_input, ranking_of_talks, BallotTalk, ProcessRankingEngine, RankingEngine, TalkVote,
};
pub use integrations::{CollaboratorError, CollaboratorResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use settings::{ConferenceSettings, SettingsError};
pub use timetable::{
    Anchor, AnchorId, CellView, Diagnostic, DiagnosticKind, TimeTable, TimeTableError,
    TimeTableResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
