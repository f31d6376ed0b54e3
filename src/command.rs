//! Console command parser.
//!
//! One line of input becomes one `Command`. Multi-field forms use `|` as the
//! field separator so free text may contain spaces:
//!
//! ```text
//! create Flood | Riverside | Levee breach | flood, urgent
//! report Water rising on 5th street | https://img.example/a.jpg
//! ```

#[cfg(test)]
#[path = "command_test.rs"]
mod command_test;

use relief_client::net::types::{DisasterDraft, DisasterId, ReportDraft};
use relief_client::sync::driver::UserAction;
use relief_client::sync::throttle::Category;

pub const HELP: &str = "\
commands:
  select <id> [lat lon]          select a disaster (coordinates optional)
  user <id>                      switch the acting user
  tag [tag]                      filter the disaster list (no tag clears)
  refresh <view>                 disasters | social | resources | updates
  create <title> | <location> | <description> | <tags>
  update <title> | <location> | <description> | <tags>
  report <content> [| <image url>]
  geocode <description>          resolve a location and load nearby resources
  catalog                        list every disaster and tag
  reconnect                      reopen the push channel
  status                         show selection and push status
  help                           this text
  quit                           exit";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Action(UserAction),
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`; type `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unknown view `{0}`; expected disasters, social, resources, or updates")]
    UnknownView(String),
}

/// Parse one input line.
///
/// # Errors
///
/// Returns an error for blank lines, unknown verbs, and malformed arguments.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let action = match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        "select" => parse_select(rest)?,
        "user" => {
            let user = single_word(rest).ok_or(CommandError::Usage("user <id>"))?;
            UserAction::SelectUser(user.to_owned())
        }
        "tag" => UserAction::SetTag(Some(rest.to_owned()).filter(|t| !t.is_empty())),
        "refresh" => UserAction::Refresh(parse_view(rest)?),
        "create" => UserAction::Create(parse_draft(rest, "create <title> | <location> | <description> | <tags>")?),
        "update" => UserAction::Update(parse_draft(rest, "update <title> | <location> | <description> | <tags>")?),
        "report" => UserAction::Report(parse_report(rest)?),
        "geocode" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("geocode <description>"));
            }
            UserAction::Geocode(rest.to_owned())
        }
        "catalog" => UserAction::LoadCatalog,
        "reconnect" => UserAction::Reconnect,
        "status" => UserAction::Status,
        other => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(Command::Action(action))
}

fn single_word(rest: &str) -> Option<&str> {
    let mut words = rest.split_whitespace();
    let word = words.next()?;
    words.next().is_none().then_some(word)
}

fn parse_select(rest: &str) -> Result<UserAction, CommandError> {
    const USAGE: &str = "select <id> [lat lon]";
    let words: Vec<&str> = rest.split_whitespace().collect();
    let (id, latitude, longitude) = match words.as_slice() {
        [id] => (*id, None, None),
        [id, lat, lon] => (*id, Some(parse_number(lat)?), Some(parse_number(lon)?)),
        _ => return Err(CommandError::Usage(USAGE)),
    };
    Ok(UserAction::SelectDisaster { id: DisasterId::from(id), latitude, longitude })
}

fn parse_number(raw: &str) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::InvalidNumber(raw.to_owned()))
}

fn parse_view(rest: &str) -> Result<Category, CommandError> {
    let word = single_word(rest).ok_or(CommandError::Usage("refresh <disasters|social|resources|updates>"))?;
    let word = word.to_ascii_lowercase();
    match word.as_str() {
        "social-media" | "socialmedia" => Ok(Category::SocialMedia),
        _ => Category::ALL
            .into_iter()
            .find(|c| c.label() == word)
            .ok_or_else(|| CommandError::UnknownView(word.clone())),
    }
}

/// `title | location | description | tags`. Trailing fields may be omitted.
fn parse_draft(rest: &str, usage: &'static str) -> Result<DisasterDraft, CommandError> {
    if rest.is_empty() || fields_overflow(rest, 4) {
        return Err(CommandError::Usage(usage));
    }
    let mut fields = rest.split('|').map(str::trim);
    let mut next = || fields.next().unwrap_or_default().to_owned();
    Ok(DisasterDraft {
        title: next(),
        location: next(),
        description: next(),
        tags: DisasterDraft::parse_tags(&next()),
    })
}

fn parse_report(rest: &str) -> Result<ReportDraft, CommandError> {
    const USAGE: &str = "report <content> [| <image url>]";
    if rest.is_empty() || fields_overflow(rest, 2) {
        return Err(CommandError::Usage(USAGE));
    }
    let (content, image_url) = match rest.split_once('|') {
        Some((content, url)) => (content.trim(), Some(url.trim().to_owned()).filter(|u| !u.is_empty())),
        None => (rest, None),
    };
    Ok(ReportDraft { content: content.to_owned(), image_url })
}

fn fields_overflow(rest: &str, max: usize) -> bool {
    rest.split('|').count() > max
}
