//! Reaction polls: argument parsing, the announcement and the final tally.

use std::time::Duration;

pub const OPTION_EMOJI: [&str; 9] = [
    "1\u{fe0f}\u{20e3}",
    "2\u{fe0f}\u{20e3}",
    "3\u{fe0f}\u{20e3}",
    "4\u{fe0f}\u{20e3}",
    "5\u{fe0f}\u{20e3}",
    "6\u{fe0f}\u{20e3}",
    "7\u{fe0f}\u{20e3}",
    "8\u{fe0f}\u{20e3}",
    "9\u{fe0f}\u{20e3}",
];

const DEFAULT_DURATION: Duration = Duration::from_secs(30);

/// Votes behind a reaction: its count, minus the bot's own reaction when it managed to add one.
pub fn votes(count: u64, by_bot: bool) -> u64 {
    count.saturating_sub(u64::from(by_bot))
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PollError {
    #[error("A poll needs a question and at least one answer: `question | answer | answer`.")]
    MissingOptions,
    #[error("You must have 9 options or less.")]
    TooManyOptions,
    #[error("`{0}` is not a number of seconds.")]
    InvalidDuration(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub question: String,
    pub answers: Vec<String>,
    pub duration: Duration,
}

impl PollRequest {
    /// Parses `question | answer | answer [| time=N]`.
    pub fn parse(args: &str) -> Result<Self, PollError> {
        let mut parts: Vec<&str> = args.split(" | ").collect();

        let duration = match parts.iter().position(|p| p.starts_with("time=")) {
            Some(index) => {
                let raw = parts.remove(index);
                let seconds = raw["time=".len()..].trim();
                seconds
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| PollError::InvalidDuration(seconds.to_string()))?
            }
            None => DEFAULT_DURATION,
        };

        if parts.len() <= 1 {
            return Err(PollError::MissingOptions);
        }
        if parts.len() > OPTION_EMOJI.len() + 1 {
            return Err(PollError::TooManyOptions);
        }

        let question = parts[0].to_string();
        let answers = parts[1..].iter().map(|a| a.to_string()).collect();
        Ok(PollRequest {
            question,
            answers,
            duration,
        })
    }

    /// The emoji voters react with, one per answer.
    pub fn emoji(&self) -> &'static [&'static str] {
        &OPTION_EMOJI[..self.answers.len()]
    }

    pub fn announcement(&self) -> String {
        let mut msg = format!("**{}?**:\n\n", self.question.trim_end_matches('?'));
        for (emoji, answer) in self.emoji().iter().zip(&self.answers) {
            msg += &format!("{emoji} - {answer}\n");
        }
        msg += &format!(
            "\n\nYou have {} seconds to vote!",
            self.duration.as_secs()
        );
        msg
    }

    /// Results text given the number of votes for each answer.
    pub fn results(&self, counts: &[u64]) -> String {
        let votes: Vec<u64> = (0..self.answers.len())
            .map(|i| counts.get(i).copied().unwrap_or(0))
            .collect();

        let mut msg = "The poll is over. The results:\n\n".to_string();
        for ((emoji, answer), count) in self.emoji().iter().zip(&self.answers).zip(&votes) {
            msg += &format!("{emoji} {answer} - {count} votes\n");
        }

        let top = votes.iter().copied().max().unwrap_or(0);
        let winners: Vec<&str> = self
            .answers
            .iter()
            .zip(&votes)
            .filter(|(_, count)| **count == top)
            .map(|(answer, _)| answer.as_str())
            .collect();

        if let [winner] = winners.as_slice() {
            msg += &format!("\n{winner} is the winner!");
        } else {
            msg += &format!("\nThe victory is tied between: {}", winners.join(", "));
        }
        msg
    }
}
