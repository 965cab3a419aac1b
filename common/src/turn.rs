use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Prefix used in display ids ("User-01", "Teacher-01").
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Teacher",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// Per-role display id, e.g. `User-03` or `Teacher-12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayId {
    role: Role,
    seq: u32,
}

impl DisplayId {
    pub fn new(role: Role, seq: u32) -> Self {
        Self { role, seq }
    }
}

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.role.label(), self.seq)
    }
}

/// One conversational unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub display_id: DisplayId,
}

/// Monotonic per-role counters. Only `reset` moves them backwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TurnCounters {
    user: u32,
    teacher: u32,
}

impl TurnCounters {
    /// Advance the counter for `role` and return the id it now names.
    pub fn next(&mut self, role: Role) -> DisplayId {
        let slot = match role {
            Role::User => &mut self.user,
            Role::Assistant => &mut self.teacher,
        };
        *slot += 1;
        DisplayId::new(role, *slot)
    }

    pub fn current(&self, role: Role) -> u32 {
        match role {
            Role::User => self.user,
            Role::Assistant => self.teacher,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_id_is_zero_padded() {
        assert_eq!(DisplayId::new(Role::User, 1).to_string(), "User-01");
        assert_eq!(DisplayId::new(Role::Assistant, 9).to_string(), "Teacher-09");
        assert_eq!(DisplayId::new(Role::Assistant, 42).to_string(), "Teacher-42");
        assert_eq!(DisplayId::new(Role::User, 123).to_string(), "User-123");
    }

    #[test]
    fn counters_advance_independently_per_role() {
        let mut counters = TurnCounters::default();
        assert_eq!(counters.next(Role::User).to_string(), "User-01");
        assert_eq!(counters.next(Role::User).to_string(), "User-02");
        assert_eq!(counters.next(Role::Assistant).to_string(), "Teacher-01");
        assert_eq!(counters.next(Role::User).to_string(), "User-03");
        assert_eq!(counters.current(Role::User), 3);
        assert_eq!(counters.current(Role::Assistant), 1);
    }

    #[test]
    fn counters_restart_after_reset() {
        let mut counters = TurnCounters::default();
        counters.next(Role::User);
        counters.next(Role::Assistant);
        counters.reset();
        assert_eq!(counters.current(Role::User), 0);
        assert_eq!(counters.next(Role::Assistant).to_string(), "Teacher-01");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(Role::User.to_string(), "user");
    }
}
