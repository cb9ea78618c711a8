use std::{io::Write, str::FromStr};

use peer_signaling::{ErrorKind, Peer, PeerId, UiSurface};
use tracing::warn;

/// A line typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in, optionally to another server than the configured one.
    Login {
        address: Option<String>,
        port: Option<u16>,
    },
    Logout,
    Call(PeerId),
    HangUp,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),
    #[error("'{0}' needs {1}")]
    MissingArgument(&'static str, &'static str),
    #[error("'{0}' is not a valid {1}")]
    InvalidArgument(String, &'static str),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(ParseError::Empty)?;
        match command {
            "login" | "l" => {
                let address = words.next().map(str::to_string);
                let port = words
                    .next()
                    .map(|p| {
                        p.parse()
                            .map_err(|_| ParseError::InvalidArgument(p.to_string(), "port"))
                    })
                    .transpose()?;
                Ok(Command::Login { address, port })
            }
            "logout" => Ok(Command::Logout),
            "call" | "c" => {
                let id = words
                    .next()
                    .ok_or(ParseError::MissingArgument("call", "a peer id"))?;
                id.parse()
                    .map(Command::Call)
                    .map_err(|_| ParseError::InvalidArgument(id.to_string(), "peer id"))
            }
            "hangup" | "h" => Ok(Command::HangUp),
            "help" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

pub const HELP: &str = "\
commands:
  login [address] [port]   sign in to the signaling server
  logout                   sign out
  call <id>                connect to a peer from the list
  hangup                   end the current call
  quit                     sign out and exit";

/// Renders conductor output as plain text.
#[derive(Debug)]
pub struct ConsoleSurface<W> {
    out: W,
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print(&mut self, text: std::fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(text).and_then(|_| self.out.flush()) {
            warn!("Could not write to console: {e}");
        }
    }
}

impl<W: Write> UiSurface for ConsoleSurface<W> {
    fn show_connect_prompt(&mut self) {
        self.print(format_args!("Not signed in. Type 'login [address] [port]'.\n"));
    }

    fn show_peer_list(&mut self, peers: &[Peer]) {
        if peers.is_empty() {
            self.print(format_args!("Signed in. Nobody else is here yet.\n"));
            return;
        }
        self.print(format_args!("Peers ('call <id>' to connect):\n"));
        for peer in peers {
            self.print(format_args!("  {:>4}  {}\n", peer.id(), peer.name()));
        }
    }

    fn show_in_session(&mut self, peer: PeerId) {
        self.print(format_args!("In session with peer {peer}. 'hangup' to end.\n"));
    }

    fn show_error(&mut self, kind: ErrorKind, message: &str) {
        self.print(format_args!("error ({kind}): {message}\n"));
    }
}
