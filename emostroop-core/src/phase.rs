/// Session sequence, advanced strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Welcome,
    Instructions(u8),
    Block(u8),
    Rest,
    Farewell,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Welcome
    }
}

impl SessionPhase {
    pub fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Welcome => Instructions(1),
            Instructions(n) => Block(*n),
            Block(1) => Rest,
            Rest => Instructions(2),
            Block(_) => Farewell,
            Farewell => return None,
        })
    }

    /// Slides wait for the participant to press Space.
    pub fn is_slide(&self) -> bool {
        !matches!(self, SessionPhase::Block(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_full_session() {
        let mut phases = vec![SessionPhase::default()];
        while let Some(next) = phases.last().and_then(SessionPhase::next) {
            phases.push(next);
        }
        use SessionPhase::*;
        assert_eq!(
            phases,
            [
                Welcome,
                Instructions(1),
                Block(1),
                Rest,
                Instructions(2),
                Block(2),
                Farewell
            ]
        );
    }
}
