//! Field names, criterion pairing and the catalog of committable fields.

use std::collections::BTreeSet;

/// Cap on justification (and explanation) text, in characters.
pub const MAX_TEXT_LENGTH: usize = 8192;

pub const STATUS_SUFFIX: &str = "_status";
pub const JUSTIFICATION_SUFFIX: &str = "_justification";

/// Well-known project attributes.
pub mod names {
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const LICENSE: &str = "license";
    pub const REPO_URL: &str = "repo_url";
    pub const HOMEPAGE_URL: &str = "homepage_url";
    /// Pipeline-only locator for repository file access; never committed.
    pub const REPO_FILES: &str = "repo_files";
}

/// Identity attributes detectives may fill in.
pub const IDENTITY_FIELDS: &[&str] = &[names::NAME, names::DESCRIPTION, names::LICENSE];

/// Criteria known to the standard catalog, by stem (`<stem>_status`).
pub const STANDARD_CRITERIA: &[&str] = &[
    "description_good",
    "interact",
    "contribution",
    "contribution_requirements",
    "floss_license",
    "floss_license_osi",
    "license_location",
    "documentation_basics",
    "sites_https",
    "discussion",
    "repo_public",
    "repo_track",
    "repo_distributed",
    "release_notes",
    "report_process",
    "vulnerability_report_process",
    "build",
    "build_common_tools",
    "hardened_site",
    "osps_gv_02_01",
    "osps_gv_03_01",
    "osps_le_02_01",
];

pub fn is_status_field(field: &str) -> bool {
    field.ends_with(STATUS_SUFFIX)
}

pub fn is_justification_field(field: &str) -> bool {
    field.ends_with(JUSTIFICATION_SUFFIX)
}

/// `contribution_status` → `contribution_justification`.
pub fn justification_field(status_field: &str) -> Option<String> {
    status_field
        .strip_suffix(STATUS_SUFFIX)
        .map(|stem| format!("{stem}{JUSTIFICATION_SUFFIX}"))
}

/// `contribution_justification` → `contribution_status`.
pub fn status_field(justification_field: &str) -> Option<String> {
    justification_field
        .strip_suffix(JUSTIFICATION_SUFFIX)
        .map(|stem| format!("{stem}{STATUS_SUFFIX}"))
}

/// Cut `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_text(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The set of fields the chief is allowed to write into a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalog {
    writable: BTreeSet<String>,
    criteria: BTreeSet<String>,
}

impl FieldCatalog {
    /// Identity fields plus every standard criterion.
    pub fn standard() -> Self {
        STANDARD_CRITERIA
            .iter()
            .fold(Self::identity_only(), |catalog, stem| catalog.with_criterion(stem))
    }

    /// Identity fields and no criteria.
    pub fn identity_only() -> Self {
        FieldCatalog {
            writable: IDENTITY_FIELDS.iter().map(|f| f.to_string()).collect(),
            criteria: BTreeSet::new(),
        }
    }

    /// Register a criterion by stem; adds its status and justification fields.
    pub fn with_criterion(mut self, stem: &str) -> Self {
        self.criteria.insert(stem.to_string());
        self.writable.insert(format!("{stem}{STATUS_SUFFIX}"));
        self.writable.insert(format!("{stem}{JUSTIFICATION_SUFFIX}"));
        self
    }

    pub fn is_writable(&self, field: &str) -> bool {
        self.writable.contains(field)
    }

    /// All writable fields, ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.writable.iter().map(String::as_str)
    }

    /// Status and justification fields of every registered criterion.
    pub fn criterion_fields(&self) -> impl Iterator<Item = &str> {
        self.fields()
            .filter(|f| is_status_field(f) || is_justification_field(f))
    }

    pub fn criteria(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().map(String::as_str)
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
