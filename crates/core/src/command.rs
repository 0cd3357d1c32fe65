//! Parsing of manual review commands out of pull request comments.
//!
//! A command is a comment line of the form
//! `[@<bot-username>] /review [--features f1,f2] [--focus a1,a2]`. When a
//! bot username is configured the mention is required; without one the bare
//! `/review` suffices. Anything else is not a command and is silently
//! ignored by the caller.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use review_warden_engines::FocusArea;

use crate::trigger::{parse_feature_list, parse_focus_list, FeedbackChannel};

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;

/// The command word that triggers a review.
const REVIEW_COMMAND: &str = "/review";

lazy_static! {
    /// Captures the value of a `--features a,b,c` flag.
    static ref FEATURES_FLAG_REGEX: Regex =
        Regex::new(r"--features\s+(\S+)").expect("Failed to compile features flag regex");

    /// Captures the value of a `--focus a,b,c` flag.
    static ref FOCUS_FLAG_REGEX: Regex =
        Regex::new(r"--focus\s+(\S+)").expect("Failed to compile focus flag regex");
}

/// A parsed manual review command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewCommand {
    /// Feedback channels requested by `--features`, defaulted when absent
    pub channels: Vec<FeedbackChannel>,

    /// Focus areas requested by `--focus`, defaulted when absent
    pub focus: Vec<FocusArea>,
}

/// Parses comments into [`ReviewCommand`]s.
///
/// # Examples
///
/// ```
/// use review_warden_core::command::CommandParser;
///
/// let parser = CommandParser::new(None);
/// assert!(parser.parse("/review --focus security").is_some());
/// assert!(parser.parse("Looks good to me!").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct CommandParser {
    bot_username: Option<String>,
}

impl CommandParser {
    /// Creates a parser.
    ///
    /// # Arguments
    ///
    /// * `bot_username` - When set, commands must mention `@<bot_username>`
    ///   before the command word
    pub fn new(bot_username: Option<String>) -> Self {
        Self {
            bot_username: bot_username.filter(|name| !name.trim().is_empty()),
        }
    }

    /// Parses a comment body.
    ///
    /// Returns `None` for any comment that does not contain a review
    /// command, so the caller can ignore ordinary comments without
    /// treating them as errors. Unknown flags are ignored; invalid flag
    /// values are dropped and fall back to the defaults.
    pub fn parse(&self, comment_body: &str) -> Option<ReviewCommand> {
        for line in comment_body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some(rest) = self.strip_mention(line) else {
                continue;
            };

            let Some(args) = rest.strip_prefix(REVIEW_COMMAND) else {
                continue;
            };
            // Reject words that merely start with the command, e.g. "/reviews".
            if !args.is_empty() && !args.starts_with(char::is_whitespace) {
                continue;
            }

            let channels = FEATURES_FLAG_REGEX
                .captures(args)
                .map(|captures| parse_feature_list(Some(&captures[1])))
                .unwrap_or_else(|| parse_feature_list(None));

            let focus = FOCUS_FLAG_REGEX
                .captures(args)
                .map(|captures| parse_focus_list(Some(&captures[1])))
                .unwrap_or_else(|| parse_focus_list(None));

            debug!(?channels, ?focus, "Parsed review command");

            return Some(ReviewCommand { channels, focus });
        }

        None
    }

    /// Strips the required bot mention off a line.
    ///
    /// Without a configured bot username the line passes through
    /// unchanged. With one, the line must start with `@<bot_username>`
    /// followed by whitespace.
    fn strip_mention<'a>(&self, line: &'a str) -> Option<&'a str> {
        let Some(bot) = &self.bot_username else {
            return Some(line);
        };

        let mention = format!("@{}", bot);
        let rest = line.strip_prefix(&mention)?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }

        Some(rest.trim_start())
    }
}
