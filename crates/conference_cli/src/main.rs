//! Conference toolkit entry point.
//!
//! # Responsibility
//! - Build a timetable from a JSON schedule file and print it by time, then
//!   print accumulated overlap diagnostics as JSON lines.
//! - Rank talks through the configured vote engine.
//! - Render badges through the configured badge program.
//!
//! Usage:
//! - `conference_cli <schedule.json> [settings.json]`
//! - `conference_cli rank <ballots.json> [settings.json]`
//! - `conference_cli badges <groups.json> [settings.json]`
//!
//! File logging starts when `CONFERENCE_LOG_DIR` names an absolute directory.

use chrono::NaiveTime;
use conference_core::{
    ranking_of_talks, render_badges, BallotTalk, CellView, ConferenceSettings,
    ProcessRankingEngine, TalkVote, TicketGroup, TimeTable,
};
use serde::Deserialize;
use std::error::Error;
use std::process::ExitCode;

const USAGE: &str = "usage: conference_cli [rank|badges] <input.json> [settings.json]";

#[derive(Debug, Deserialize)]
struct Schedule {
    start: String,
    end: String,
    slot_minutes: Option<u32>,
    tracks: Vec<String>,
    #[serde(default)]
    events: Vec<ScheduledItem>,
}

#[derive(Debug, Deserialize)]
struct ScheduledItem {
    time: String,
    title: String,
    /// Minutes; omitted for flexible items.
    duration: Option<u32>,
    tracks: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Ballots {
    talks: Vec<BallotTalk>,
    #[serde(default)]
    votes: Vec<TalkVote>,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, rest) = match args.first().map(String::as_str) {
        Some("rank") => (Command::Rank, &args[1..]),
        Some("badges") => (Command::Badges, &args[1..]),
        _ => (Command::Timetable, &args[..]),
    };
    let Some(input_path) = rest.first() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match run(command, input_path, rest.get(1).map(String::as_str)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Timetable,
    Rank,
    Badges,
}

fn run(command: Command, input_path: &str, settings_path: Option<&str>) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = std::env::var_os("CONFERENCE_LOG_DIR") {
        conference_core::init_logging(conference_core::default_log_level(), log_dir)?;
    }
    let settings = match settings_path {
        Some(path) => ConferenceSettings::load(path)?,
        None => ConferenceSettings::default(),
    };
    let input = std::fs::read_to_string(input_path)?;

    match command {
        Command::Timetable => print_timetable(&settings, serde_json::from_str(&input)?),
        Command::Rank => print_ranking(&settings, serde_json::from_str(&input)?),
        Command::Badges => print_badges(&settings, serde_json::from_str(&input)?),
    }
}

fn print_timetable(settings: &ConferenceSettings, schedule: Schedule) -> Result<(), Box<dyn Error>> {
    let mut table = TimeTable::with_slot_length(
        (clock(&schedule.start)?, clock(&schedule.end)?),
        schedule.tracks.clone(),
        schedule.slot_minutes.unwrap_or(settings.slot_minutes),
    )?;
    for item in &schedule.events {
        table.set_event(clock(&item.time)?, item.title.clone(), item.duration, &item.tracks)?;
    }

    println!("conference_core version={}", conference_core::core_version());
    println!("time  | {}", schedule.tracks.join(" | "));
    for line in table.by_times() {
        let cells: Vec<String> = line
            .cells
            .iter()
            .map(|position| match position.cell {
                None => "-".to_string(),
                Some(CellView::Anchor(anchor)) => anchor.payload.clone(),
                Some(CellView::Secondary { anchor, .. }) => format!("({})", anchor.payload),
            })
            .collect();
        println!("{} | {}", line.time.format("%H:%M"), cells.join(" | "));
    }

    for diagnostic in table.errors() {
        println!("{}", serde_json::to_string(diagnostic)?);
    }
    Ok(())
}

fn print_ranking(settings: &ConferenceSettings, ballots: Ballots) -> Result<(), Box<dyn Error>> {
    let engine = ProcessRankingEngine::from_settings(settings);
    let ranked = ranking_of_talks(&engine, &ballots.talks, &ballots.votes, settings.missing_vote);
    for (position, talk) in ranked.iter().enumerate() {
        println!("{}. [{}] {}", position + 1, talk.id, talk.title);
    }
    Ok(())
}

fn print_badges(settings: &ConferenceSettings, groups: Vec<TicketGroup>) -> Result<(), Box<dyn Error>> {
    for artifact in render_badges(&settings.badge_program, &groups, &[])? {
        let (_, path) = artifact.keep()?;
        println!("{}", path.display());
    }
    Ok(())
}

fn clock(value: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(value, "%H:%M")
}
