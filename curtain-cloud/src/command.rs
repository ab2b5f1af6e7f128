use curtain_api::clock::is_hh_mm;

use crate::error::CommandError;

pub const USAGE: &str = "\
Cloud management commands:
1. Enable/disable rule (enable/disable)
2. Change rule period (time start_time end_time, e.g.: time 07:00 09:00)
3. Check latest status (status)
4. Exit (exit)";

/// A line typed on the management console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Enable,
    Disable,
    Time { start: String, end: String },
    Status,
    Exit,
}

impl ConsoleCommand {
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let args: Vec<&str> = input.split_whitespace().collect();
        let Some(command) = args.first() else {
            return Err(CommandError::Unknown);
        };

        match (command.to_lowercase().as_str(), &args[1..]) {
            ("enable", _) => Ok(ConsoleCommand::Enable),
            ("disable", _) => Ok(ConsoleCommand::Disable),
            ("time", [start, end]) => {
                for token in [start, end] {
                    if !is_hh_mm(token) {
                        return Err(CommandError::InvalidTime(token.to_string()));
                    }
                }

                Ok(ConsoleCommand::Time {
                    start: start.to_string(),
                    end: end.to_string(),
                })
            }
            ("status", _) => Ok(ConsoleCommand::Status),
            ("exit", _) => Ok(ConsoleCommand::Exit),
            _ => Err(CommandError::Unknown),
        }
    }
}
