/// Help text listing the operator commands.
pub const HELP: &str = "\
q         quit
f         flip the open state of the door
p <who>   signal that <who> passed through the door
r         remove or reattach the door to the bus
n         move to the next door in the list
h         show this help message
";

/// Represents one line of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoorCommand {
    /// Stop the command loop
    Quit,
    /// Flip the open state of the current door
    Flip,
    /// Announce that someone passed through the current door
    PassThrough(String),
    /// Take the current door off the bus, or put it back
    Reattach,
    /// Move to the next door without touching the current one
    Next,
    /// Show the help text
    Help,
    /// Input that is not a usable command
    Invalid(String),
}

impl DoorCommand {
    /// Parses a line of operator input
    ///
    /// Only the first character selects the command. For `p`, the name is the rest of the line after
    /// the spaces and tabs that follow the letter, with trailing whitespace removed.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut chars = line.chars();
        let Some(letter) = chars.next() else {
            return DoorCommand::Invalid("empty input".to_string());
        };

        match letter {
            'q' => DoorCommand::Quit,
            'f' => DoorCommand::Flip,
            'p' => {
                let who = chars.as_str().trim_start_matches([' ', '\t']).trim_end();
                if who.is_empty() {
                    DoorCommand::Invalid("missing name after 'p'".to_string())
                } else {
                    DoorCommand::PassThrough(who.to_string())
                }
            }
            'r' => DoorCommand::Reattach,
            'n' => DoorCommand::Next,
            'h' => DoorCommand::Help,
            other => DoorCommand::Invalid(format!("unknown command '{}'", other)),
        }
    }

    /// Whether accepting this command moves the turn to the next door.
    pub fn advances_turn(&self) -> bool {
        matches!(
            self,
            DoorCommand::Flip | DoorCommand::PassThrough(_) | DoorCommand::Reattach | DoorCommand::Next
        )
    }
}

impl From<&str> for DoorCommand {
    fn from(line: &str) -> Self {
        DoorCommand::parse(line)
    }
}
