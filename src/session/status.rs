#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Booting,
    Idle,
    Running,
    /// The interpreter failed to initialize; runs are disabled for good.
    Failed,
}

impl SessionStatus {
    pub fn display(&self) -> &'static str {
        match self {
            SessionStatus::Booting => "BOOTING",
            SessionStatus::Idle => "IDLE",
            SessionStatus::Running => "RUNNING",
            SessionStatus::Failed => "FAILED",
        }
    }
}
