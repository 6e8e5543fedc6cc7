//! Talk ranking through an external vote engine.
//!
//! # Responsibility
//! - Serialize talk ballots into the vote-engine text format.
//! - Invoke the engine and map its ordered id list back to talks.
//!
//! # Invariants
//! - Candidates tied in voter preference are broken by creation time,
//!   earliest first.
//! - Talks a voter did not vote on receive `missing_vote`.
//! - Engine failures degrade to an empty ranking.

use crate::integrations::{require_success, run_with_stdin, CollaboratorResult};
use crate::settings::ConferenceSettings;
use chrono::NaiveDateTime;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Vote assigned to talks a voter left unrated.
pub const DEFAULT_MISSING_VOTE: i32 = 5;

static CANDIDATE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("valid candidate id regex"));

/// Talk taking part in the ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotTalk {
    pub id: u64,
    pub title: String,
    /// Submission time; earlier talks win ties.
    pub created: NaiveDateTime,
}

/// One user's vote on one talk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalkVote {
    pub user_id: u64,
    pub talk_id: u64,
    pub vote: i32,
}

/// Engine computing a total order from newline-delimited ballot text.
pub trait RankingEngine {
    /// Returns the raw engine output; the ranking is on its last line.
    fn rank(&self, input: &str) -> CollaboratorResult<String>;
}

/// Ranking engine run as an executable reading ballots on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRankingEngine {
    program: PathBuf,
}

impl ProcessRankingEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Engine running the configured `ranking_engine` executable.
    pub fn from_settings(settings: &ConferenceSettings) -> Self {
        Self::new(settings.ranking_engine.clone())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl RankingEngine for ProcessRankingEngine {
    fn rank(&self, input: &str) -> CollaboratorResult<String> {
        let output = run_with_stdin(&self.program, &[], input.as_bytes().to_vec())?;
        require_success(&self.program, &output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Builds vote-engine input for `talks` from the recorded `votes`.
///
/// # Format
/// - `-m schulze`
/// - `-cands <ids> -tie <ids by creation time>`
/// - `# <id> - <title>` for every talk
/// - one ballot per voter: `=` joins equal preferences, `>` separates groups
///   in decreasing vote order.
///
/// Votes on talks outside `talks` are ignored.
pub fn ballot_input(talks: &[BallotTalk], votes: &[TalkVote], missing_vote: i32) -> String {
    let ids: BTreeSet<u64> = talks.iter().map(|talk| talk.id).collect();

    let mut by_creation: Vec<&BallotTalk> = talks.iter().collect();
    by_creation.sort_by_key(|talk| (talk.created, talk.id));

    let mut lines = vec![
        "-m schulze".to_string(),
        format!(
            "-cands {} -tie {}",
            join_ids(ids.iter().copied(), " "),
            join_ids(by_creation.iter().map(|talk| talk.id), " ")
        ),
    ];
    for talk in talks {
        let title = talk.title.replace(['\n', '\r'], " ");
        lines.push(format!("# {} - {}", talk.id, title));
    }

    let mut ballots: BTreeMap<u64, BTreeMap<i32, BTreeSet<u64>>> = BTreeMap::new();
    for vote in votes.iter().filter(|vote| ids.contains(&vote.talk_id)) {
        ballots
            .entry(vote.user_id)
            .or_default()
            .entry(vote.vote)
            .or_default()
            .insert(vote.talk_id);
    }

    for mut groups in ballots.into_values() {
        let voted: BTreeSet<u64> = groups.values().flatten().copied().collect();
        let missing: Vec<u64> = ids.difference(&voted).copied().collect();
        if !missing.is_empty() {
            groups.entry(missing_vote).or_default().extend(missing);
        }
        let line = groups
            .values()
            .rev()
            .map(|group| join_ids(group.iter().copied(), "="))
            .collect::<Vec<_>>()
            .join(">");
        lines.push(line);
    }

    lines.join("\n")
}

/// Ranks `talks` by running `engine` over the recorded `votes`.
///
/// Returns talks best first. Any engine failure is logged and yields an
/// empty list; ids the engine reports that are not in `talks` are skipped.
pub fn ranking_of_talks<'a>(
    engine: &impl RankingEngine,
    talks: &'a [BallotTalk],
    votes: &[TalkVote],
    missing_vote: i32,
) -> Vec<&'a BallotTalk> {
    let input = ballot_input(talks, votes, missing_vote);
    let output = match engine.rank(&input) {
        Ok(output) => output,
        Err(err) => {
            warn!(
                "event=ranking module=integrations status=error talks={} error={}",
                talks.len(),
                err
            );
            return Vec::new();
        }
    };

    let by_id: HashMap<u64, &BallotTalk> = talks.iter().map(|talk| (talk.id, talk)).collect();
    parse_ranking(&output)
        .into_iter()
        .filter_map(|id| by_id.get(&id).copied())
        .collect()
}

/// Candidate ids from the last non-empty line of engine output.
fn parse_ranking(output: &str) -> Vec<u64> {
    let Some(last) = output.lines().rev().find(|line| !line.trim().is_empty()) else {
        return Vec::new();
    };
    CANDIDATE_ID_RE
        .find_iter(last)
        .filter_map(|found| found.as_str().parse().ok())
        .collect()
}

fn join_ids(ids: impl Iterator<Item = u64>, separator: &str) -> String {
    ids.map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::parse_ranking;

    #[test]
    fn parse_ranking_reads_last_non_empty_line() {
        let output = "Schulze ranking\n3 > 1\n7 > 2 = 9\n\n";
        assert_eq!(parse_ranking(output), vec![7, 2, 9]);
    }

    #[test]
    fn parse_ranking_of_empty_output_is_empty() {
        assert!(parse_ranking("").is_empty());
        assert!(parse_ranking("\n  \n").is_empty());
    }
}
