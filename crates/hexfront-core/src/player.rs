//! Game participants - humans and AI opponents.

use crate::types::ParticipantId;
use serde::{Deserialize, Serialize};

/// A participant in a game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Participant {
    /// Index within the game's ordered participant list.
    pub id: ParticipantId,
    /// Human player or AI opponent.
    pub kind: ParticipantKind,
    /// Display name.
    pub name: String,
    /// Has this participant been knocked out of the game?
    pub eliminated: bool,
}

impl Participant {
    /// Create a new human participant.
    pub fn human(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            kind: ParticipantKind::Human,
            name: name.into(),
            eliminated: false,
        }
    }

    /// Create a new AI participant.
    pub fn ai(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            kind: ParticipantKind::Ai,
            name: name.into(),
            eliminated: false,
        }
    }
}

/// Kind of participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantKind {
    Human,
    Ai,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_constructors() {
        let human = Participant::human(0, "Aino");
        assert_eq!(human.kind, ParticipantKind::Human);
        assert!(!human.eliminated);

        let ai = Participant::ai(1, "Legion");
        assert_eq!(ai.kind, ParticipantKind::Ai);
    }
}
