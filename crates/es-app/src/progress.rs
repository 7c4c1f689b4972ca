#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingProject,
    ResolvingProfiles,
    CheckingCache,
    LoadingCachedResult,
    Compiling,
    WritingLp,
    Solving,
    SavingResults,
    Completed,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub system_id: String,
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl RunProgressEvent {
    pub fn stage(
        system_id: impl Into<String>,
        stage: RunStage,
        elapsed_wall_s: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            system_id: system_id.into(),
            stage,
            elapsed_wall_s,
            message,
        }
    }
}
