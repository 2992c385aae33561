use crate::converter::OverwritePrompt;
use dialoguer::Confirm;
use std::path::Path;

/// Terminal yes/no question, default "no".
pub struct DialoguerPrompt;

impl OverwritePrompt for DialoguerPrompt {
    fn confirm_overwrite(&self, path: &Path) -> std::io::Result<bool> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Confirm::new()
            .with_prompt(format!("File '{}' already exists. Overwrite?", name))
            .default(false)
            .interact()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
