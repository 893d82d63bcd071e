use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::ArchivePath;
use crate::core::{ArchiveError, Result};

/// Path predicate used by merge, filter, enumeration and directory streams.
///
/// Regular expressions must match the whole canonical path (`/a/b`, no trailing separator).
#[derive(Clone)]
pub enum Filter {
    IncludeAll,
    Include(Regex),
    Exclude(Regex),
    IncludePaths(HashSet<ArchivePath>),
    ExcludePaths(HashSet<ArchivePath>),
    Predicate(Arc<dyn Fn(&ArchivePath) -> bool + Send + Sync>),
}

impl Filter {
    pub fn include_all() -> Filter {
        Filter::IncludeAll
    }

    pub fn include(pattern: &str) -> Result<Filter> {
        Ok(Filter::Include(compile(pattern)?))
    }

    pub fn exclude(pattern: &str) -> Result<Filter> {
        Ok(Filter::Exclude(compile(pattern)?))
    }

    pub fn include_paths<I, P>(paths: I) -> Filter
    where
        I: IntoIterator<Item = P>,
        P: Into<ArchivePath>,
    {
        Filter::IncludePaths(paths.into_iter().map(Into::into).collect())
    }

    pub fn exclude_paths<I, P>(paths: I) -> Filter
    where
        I: IntoIterator<Item = P>,
        P: Into<ArchivePath>,
    {
        Filter::ExcludePaths(paths.into_iter().map(Into::into).collect())
    }

    pub fn predicate<F>(f: F) -> Filter
    where
        F: Fn(&ArchivePath) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(f))
    }

    pub fn includes(&self, path: &ArchivePath) -> bool {
        match self {
            Filter::IncludeAll => true,
            Filter::Include(regex) => regex.is_match(path.as_str()),
            Filter::Exclude(regex) => !regex.is_match(path.as_str()),
            Filter::IncludePaths(paths) => paths.contains(path),
            Filter::ExcludePaths(paths) => !paths.contains(path),
            Filter::Predicate(f) => f(path),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::IncludeAll
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::IncludeAll => f.write_str("IncludeAll"),
            Filter::Include(regex) => write!(f, "Include({})", regex.as_str()),
            Filter::Exclude(regex) => write!(f, "Exclude({})", regex.as_str()),
            Filter::IncludePaths(paths) => f.debug_tuple("IncludePaths").field(paths).finish(),
            Filter::ExcludePaths(paths) => f.debug_tuple("ExcludePaths").field(paths).finish(),
            Filter::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| ArchiveError::InvalidArgument(format!("invalid filter pattern: {e}")))
}
