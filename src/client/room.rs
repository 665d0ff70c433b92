use crate::server::model::room::RoomNumberRule;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEntryOutcome {
    /// open the room chat page
    Navigate(String),
    /// keep the form and show the message
    Toast(String),
}

/// Guest-facing room number form.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomEntry {
    rule: RoomNumberRule,
}

impl RoomEntry {
    pub fn new(rule: RoomNumberRule) -> Self {
        Self { rule }
    }

    pub fn submit(&self, input: &str) -> RoomEntryOutcome {
        match self.rule.validate(input) {
            Ok(room) => RoomEntryOutcome::Navigate(format!("/hotel/{room}")),
            Err(e) => RoomEntryOutcome::Toast(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_rooms_navigate() {
        let entry = RoomEntry::default();
        assert_eq!(entry.submit(" 204 "), RoomEntryOutcome::Navigate("/hotel/204".to_string()));
        assert_eq!(entry.submit("1204"), RoomEntryOutcome::Navigate("/hotel/1204".to_string()));
    }

    #[test]
    fn invalid_rooms_toast() {
        let entry = RoomEntry::default();
        assert_eq!(
            entry.submit("  "),
            RoomEntryOutcome::Toast("Please enter your room number".to_string())
        );
        for input in ["12", "12345", "2O4"] {
            assert_eq!(
                entry.submit(input),
                RoomEntryOutcome::Toast("Room number must be 3-4 digits".to_string()),
                "{input}"
            );
        }
    }

    #[test]
    fn bounds_are_configurable() {
        let entry = RoomEntry::new(RoomNumberRule {
            min_digits: 2,
            max_digits: 5,
        });
        assert_eq!(entry.submit("12"), RoomEntryOutcome::Navigate("/hotel/12".to_string()));
        assert_eq!(
            entry.submit("1"),
            RoomEntryOutcome::Toast("Room number must be 2-5 digits".to_string())
        );
    }
}
