use crate::config::OverwritePolicy;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Skip,
}

/// Asks whether an existing output file may be replaced.
pub trait OverwritePrompt {
    fn confirm_overwrite(&self, path: &Path) -> std::io::Result<bool>;
}

pub struct OverwriteGuard {
    policy: OverwritePolicy,
    prompt: Box<dyn OverwritePrompt>,
}

impl OverwriteGuard {
    pub fn new(policy: OverwritePolicy, prompt: Box<dyn OverwritePrompt>) -> Self {
        Self { policy, prompt }
    }

    pub fn policy(&self) -> OverwritePolicy {
        self.policy
    }

    /// Never prompts when the output does not exist. A prompt that fails
    /// (EOF, no terminal, interrupted) counts as "no".
    pub fn check(&self, output: &Path) -> GuardDecision {
        if !output.exists() {
            return GuardDecision::Proceed;
        }

        match self.policy {
            OverwritePolicy::Always => GuardDecision::Proceed,
            OverwritePolicy::Never => GuardDecision::Skip,
            OverwritePolicy::Ask => match self.prompt.confirm_overwrite(output) {
                Ok(true) => GuardDecision::Proceed,
                Ok(false) => GuardDecision::Skip,
                Err(e) => {
                    log::warn!(
                        "Overwrite prompt for {} failed ({}), keeping existing file",
                        output.display(),
                        e
                    );
                    GuardDecision::Skip
                }
            },
        }
    }
}
