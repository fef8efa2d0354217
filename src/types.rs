use std::fmt;

/// Build flavour selected by the `--prod` switch.
///
/// - `Development`: fast, unminified scripts with inline source maps; the
///   favicon markup snippet is left in the output tree.
/// - `Production`: optimised scripts without source maps; build-time-only
///   artifacts are removed after use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    pub fn from_prod_flag(prod: bool) -> Self {
        if prod {
            BuildMode::Production
        } else {
            BuildMode::Development
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, BuildMode::Production)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Development => f.write_str("development"),
            BuildMode::Production => f.write_str("production"),
        }
    }
}

/// Asset category. Every source file belongs to exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Script,
    Style,
    Markup,
    /// Markup fragments that are only pulled in through include directives.
    Partial,
    Favicon,
    /// Catch-all: everything the specialised categories do not claim.
    File,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Script,
        Category::Style,
        Category::Markup,
        Category::Partial,
        Category::Favicon,
        Category::File,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Script => "script",
            Category::Style => "style",
            Category::Markup => "markup",
            Category::Partial => "partial",
            Category::Favicon => "favicon",
            Category::File => "file",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of filesystem change reported by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    Added,
    Changed,
    Removed,
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchEventKind::Added => f.write_str("added"),
            WatchEventKind::Changed => f.write_str("changed"),
            WatchEventKind::Removed => f.write_str("removed"),
        }
    }
}
