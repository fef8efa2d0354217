// src/stages/action.rs

use std::fmt;

use crate::types::Category;

/// What a clean stage removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanTarget {
    /// Every entry below the output root, dotfiles included.
    All,
    /// Every output file matched by the category's output-side glob set.
    Category(Category),
}

/// Side-effecting unit of work a task performs when dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageAction {
    Clean(CleanTarget),
    Script,
    Style,
    Markup,
    File,
    Favicon,
    /// Drops the build-only favicon markup snippet in production mode.
    FaviconPost,
    ListingCopy,
    ListingConfig,
}

impl StageAction {
    /// Default task name for this action, e.g. `clean-markup`.
    pub fn task_name(&self) -> String {
        match self {
            StageAction::Clean(CleanTarget::All) => "clean".to_string(),
            StageAction::Clean(CleanTarget::Category(c)) => format!("clean-{c}"),
            StageAction::Script => "script".to_string(),
            StageAction::Style => "style".to_string(),
            StageAction::Markup => "markup".to_string(),
            StageAction::File => "file".to_string(),
            StageAction::Favicon => "favicon".to_string(),
            StageAction::FaviconPost => "favicon-post".to_string(),
            StageAction::ListingCopy => "listing-copy".to_string(),
            StageAction::ListingConfig => "listing-config".to_string(),
        }
    }

    /// CPU-heavy stages run on the blocking pool.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            StageAction::Style | StageAction::Markup | StageAction::Favicon
        )
    }
}

impl fmt::Display for StageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.task_name())
    }
}
