use chrono::{DateTime, Local};

/// One run of the experiment program, numbered across runs through the results log.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: u32,
    pub started_at: DateTime<Local>,
}

impl Session {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            started_at: Local::now(),
        }
    }

    /// First session of a fresh log.
    pub fn first() -> Self {
        Self::new(1)
    }

    /// Session following the one recorded last.
    pub fn after(last: u32) -> Self {
        Self::new(last.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering() {
        assert_eq!(Session::first().id, 1);
        assert_eq!(Session::after(4).id, 5);
        assert_eq!(Session::after(u32::MAX).id, u32::MAX);
    }
}
