// src/relay.rs
//
// Text protocol spoken with paired controllers. Commands are comma separated:
// the first field names the method, the rest are its arguments.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerCommand {
    Bookmark(f64),
    GetContentTime,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown method '{0}'")]
    UnknownMethod(String),
    #[error("missing argument for '{0}'")]
    MissingArgument(&'static str),
    #[error("invalid time '{0}'")]
    InvalidTime(String),
}

impl FromStr for ControllerCommand {
    type Err = CommandError;

    fn from_str(message: &str) -> Result<Self, Self::Err> {
        let mut fields = message.split(',');
        let method = fields.next().unwrap_or_default();
        match method {
            "bookmark" => {
                let raw = fields.next().ok_or(CommandError::MissingArgument("bookmark"))?;
                let time = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|t| t.is_finite())
                    .ok_or_else(|| CommandError::InvalidTime(raw.to_string()))?;
                Ok(ControllerCommand::Bookmark(time))
            }
            "getContentTime" => Ok(ControllerCommand::GetContentTime),
            other => Err(CommandError::UnknownMethod(other.to_string())),
        }
    }
}

/// Everything the receiver announces to its controllers.
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast {
    StreamRequestSucceeded,
    StreamRequestFailed,
    AdBreakStarted,
    AdBreakEnded,
    SeekingTo(f64),
    Bookmark(f64),
    ContentTime(f64),
    NotRecognized,
}

impl fmt::Display for Broadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Broadcast::StreamRequestSucceeded => {
                f.write_str("Stream request successful. Loading stream...")
            }
            Broadcast::StreamRequestFailed => {
                f.write_str("Stream request failed. Loading backup stream...")
            }
            Broadcast::AdBreakStarted => f.write_str("adBreakStarted"),
            Broadcast::AdBreakEnded => f.write_str("adBreakEnded"),
            Broadcast::SeekingTo(time) => write!(f, "Seeking to: {time}"),
            Broadcast::Bookmark(time) => write!(f, "bookmark,{time}"),
            Broadcast::ContentTime(time) => write!(f, "contentTime,{time}"),
            Broadcast::NotRecognized => f.write_str("Message not recognized"),
        }
    }
}

/// Fan-out to every connected controller.
#[derive(Clone)]
pub struct Relay {
    sender: broadcast::Sender<String>,
}

impl Relay {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn broadcast(&self, message: Broadcast) {
        let text = message.to_string();
        info!(message = %text, "broadcast");
        // no subscribers is fine; controllers come and go
        let _ = self.sender.send(text);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("bookmark,12.5", Ok(ControllerCommand::Bookmark(12.5)))]
    #[case("bookmark, 30", Ok(ControllerCommand::Bookmark(30.0)))]
    #[case("getContentTime", Ok(ControllerCommand::GetContentTime))]
    #[case("getContentTime,ignored", Ok(ControllerCommand::GetContentTime))]
    #[case("foo,1,2", Err(CommandError::UnknownMethod("foo".into())))]
    #[case("", Err(CommandError::UnknownMethod("".into())))]
    #[case("bookmark", Err(CommandError::MissingArgument("bookmark")))]
    #[case("bookmark,soon", Err(CommandError::InvalidTime("soon".into())))]
    #[case("bookmark,NaN", Err(CommandError::InvalidTime("NaN".into())))]
    fn parses_controller_commands(
        #[case] input: &str,
        #[case] expected: Result<ControllerCommand, CommandError>,
    ) {
        assert_eq!(input.parse::<ControllerCommand>(), expected);
    }

    #[rstest]
    #[case(Broadcast::Bookmark(12.5), "bookmark,12.5")]
    #[case(Broadcast::ContentTime(20.0), "contentTime,20")]
    #[case(Broadcast::SeekingTo(20.0), "Seeking to: 20")]
    #[case(Broadcast::NotRecognized, "Message not recognized")]
    #[case(Broadcast::AdBreakStarted, "adBreakStarted")]
    fn formats_broadcasts(#[case] broadcast: Broadcast, #[case] expected: &str) {
        assert_eq!(broadcast.to_string(), expected);
    }

    #[tokio::test]
    async fn every_subscriber_receives_broadcasts() {
        let relay = Relay::new(8);
        let mut first = relay.subscribe();
        let mut second = relay.subscribe();

        relay.broadcast(Broadcast::AdBreakEnded);

        assert_eq!(first.recv().await.unwrap(), "adBreakEnded");
        assert_eq!(second.recv().await.unwrap(), "adBreakEnded");
    }
}
