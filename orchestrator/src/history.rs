use tutor_common::protocol::HistoryEntry;
use tutor_common::turn::{Role, Turn, TurnCounters};

/// Ordered, append-only turn list plus the per-role id counters.
#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
    counters: TurnCounters,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn with the next display id for `role`.
    pub fn push(&mut self, role: Role, content: String) -> &Turn {
        let display_id = self.counters.next(role);
        self.turns.push(Turn {
            role,
            content,
            display_id,
        });
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn counters(&self) -> TurnCounters {
        self.counters
    }

    /// Most recent teacher turn, if any.
    pub fn last_assistant(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::Assistant)
    }

    /// Wire form of the full history.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.turns.iter().map(HistoryEntry::from).collect()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.counters.reset();
    }
}
