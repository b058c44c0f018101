//! Walking state machine: the closed set of states and the table of legal moves.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum WalkState {
    #[default]
    Stopped,
    Walking,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum WalkCommand {
    Start,
    Pause,
    Continue,
    Stop,
    #[strum(serialize = "complete the route")]
    RouteComplete,
}

impl WalkState {
    /// The state `command` leads to, or `None` if the table has no such row.
    pub fn next(self, command: WalkCommand) -> Option<WalkState> {
        use WalkCommand::*;
        use WalkState::*;

        match (self, command) {
            (Stopped, Start) => Some(Walking),
            (Walking, Pause) => Some(Paused),
            (Paused, Continue) => Some(Walking),
            (Walking, Stop) | (Paused, Stop) => Some(Stopped),
            (Walking, RouteComplete) => Some(Stopped),
            _ => None,
        }
    }

    pub fn permits(self, command: WalkCommand) -> bool {
        self.next(command).is_some()
    }

    pub fn is_walking(self) -> bool {
        self == WalkState::Walking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_COMMANDS: [WalkCommand; 5] = [
        WalkCommand::Start,
        WalkCommand::Pause,
        WalkCommand::Continue,
        WalkCommand::Stop,
        WalkCommand::RouteComplete,
    ];

    fn legal(state: WalkState) -> Vec<WalkCommand> {
        ALL_COMMANDS
            .into_iter()
            .filter(|c| state.permits(*c))
            .collect()
    }

    #[test]
    fn starts_stopped() {
        assert_eq!(WalkState::default(), WalkState::Stopped);
    }

    #[test]
    fn stopped_only_starts() {
        assert_eq!(legal(WalkState::Stopped), vec![WalkCommand::Start]);
    }

    #[test]
    fn walking_pauses_stops_or_completes() {
        assert_eq!(
            legal(WalkState::Walking),
            vec![
                WalkCommand::Pause,
                WalkCommand::Stop,
                WalkCommand::RouteComplete
            ]
        );
        assert_eq!(
            WalkState::Walking.next(WalkCommand::RouteComplete),
            Some(WalkState::Stopped)
        );
    }

    #[test]
    fn paused_continues_or_stops() {
        assert_eq!(
            legal(WalkState::Paused),
            vec![WalkCommand::Continue, WalkCommand::Stop]
        );
        assert_eq!(
            WalkState::Paused.next(WalkCommand::Continue),
            Some(WalkState::Walking)
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(WalkState::Paused.to_string(), "paused");
        assert_eq!(WalkCommand::Continue.to_string(), "continue");
    }
}
