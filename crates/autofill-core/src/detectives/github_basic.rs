use async_trait::async_trait;
use evidence_source::EvidenceKey;
use regex::Regex;
use serde::Deserialize;

use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::{DetectiveError, DetectiveResult};
use crate::evidence::Evidence;
use crate::fields::names;
use crate::status::CriterionStatus;

/// Descriptions shorter than this read like a name, not a summary.
const SHORT_DESCRIPTION: usize = 60;

/// SPDX spellings for license keys that upper-casing gets wrong.
const LICENSE_CORRECT_CASE: &[(&str, &str)] = &[
    ("APACHE-2.0", "Apache-2.0"),
    ("ARTISTIC-2.0", "Artistic-2.0"),
    ("BSD-3-CLAUSE", "BSD-3-Clause"),
    ("BSD-2-CLAUSE", "BSD-2-Clause"),
    ("EUDATAGRID", "EUDatagrid"),
    ("ENTESSA", "Entessa"),
    ("FAIR", "Fair"),
    ("FRAMEWORX-1.0", "Frameworx-1.0"),
    ("MIROS", "MirOS"),
    ("MOTOSOTO", "Motosoto"),
    ("MULTICS", "Multics"),
    ("NAUMEN", "Naumen"),
    ("NOKIA", "Nokia"),
    ("POSTGRESQL", "PostgreSQL"),
    ("PYTHON-2.0", "Python-2.0"),
    ("CNRI-PYTHON", "CNRI-Python"),
    ("SIMPL-2.0", "SimPL-2.0"),
    ("SLEEPYCAT", "Sleepycat"),
    ("WATCOM-1.0", "Watcom-1.0"),
    ("WXWINDOWS", "WXwindows"),
    ("XNET", "Xnet"),
    ("ZLIB", "Zlib"),
];

/// Normalise a GitHub license key to its SPDX spelling.
pub fn cleanup_license(key: &str) -> String {
    let upper = key.trim().to_ascii_uppercase();
    LICENSE_CORRECT_CASE
        .iter()
        .find(|(from, _)| *from == upper)
        .map(|(_, to)| to.to_string())
        .unwrap_or(upper)
}

#[derive(Debug, Deserialize)]
struct RepoData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    license: Option<LicenseData>,
}

#[derive(Debug, Deserialize)]
struct LicenseData {
    #[serde(default)]
    key: Option<String>,
}

/// Facts implied by hosting on GitHub, plus repository metadata.
pub struct GithubBasicDetective {
    descriptor: DetectiveDescriptor,
    repo_url: Regex,
}

impl GithubBasicDetective {
    pub const NAME: &'static str = "GithubBasicDetective";

    pub fn new() -> Result<Self, regex::Error> {
        Ok(GithubBasicDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_URL])
                .with_outputs([
                    names::NAME,
                    names::DESCRIPTION,
                    names::LICENSE,
                    "discussion_status",
                    "repo_public_status",
                    "repo_track_status",
                    "repo_distributed_status",
                    "contribution_status",
                ]),
            repo_url: Regex::new(r"\Ahttps://github.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)/?\z")?,
        })
    }

    fn hosting_facts(changes: &mut Changeset) {
        let met = CriterionStatus::Met.as_str();
        changes.propose(
            "repo_public_status",
            met,
            Confidence::saturating(3),
            "Repository on GitHub, which provides public git repositories with URLs.",
        );
        changes.propose(
            "repo_track_status",
            met,
            Confidence::saturating(4),
            "Repository on GitHub, which uses git. git can track the changes, \
             who made them, and when they were made.",
        );
        changes.propose(
            "repo_distributed_status",
            met,
            Confidence::saturating(4),
            "Repository on GitHub, which uses git. git is distributed.",
        );
        changes.propose(
            "contribution_status",
            met,
            Confidence::saturating(2),
            "Projects on GitHub by default use issues and pull requests, as \
             encouraged by documentation such as \
             <https://guides.github.com/activities/contributing-to-open-source/>.",
        );
        changes.propose(
            "discussion_status",
            met,
            Confidence::saturating(3),
            "GitHub supports discussions on issues and pull requests.",
        );
    }

    fn metadata(data: RepoData, changes: &mut Changeset) {
        let confidence = Confidence::saturating(3);
        let description = data.description.filter(|d| !d.trim().is_empty());
        match description {
            Some(short) if short.chars().count() < SHORT_DESCRIPTION => {
                changes.propose(names::NAME, short, confidence, "GitHub name");
            }
            description => {
                if let Some(name) = data.name.filter(|n| !n.trim().is_empty()) {
                    changes.propose(names::NAME, name, confidence, "GitHub name");
                }
                if let Some(description) = description {
                    changes.propose(names::DESCRIPTION, description, confidence, "GitHub description");
                }
            }
        }

        if let Some(key) = data
            .license
            .and_then(|l| l.key)
            .filter(|k| !k.trim().is_empty())
        {
            changes.propose(
                names::LICENSE,
                cleanup_license(&key),
                confidence,
                "GitHub API license analysis",
            );
        }
    }
}

#[async_trait]
impl Detective for GithubBasicDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let mut changes = Changeset::new();
        let Some(repo_url) = current.present(names::REPO_URL) else {
            return Ok(changes);
        };
        let Some(caps) = self.repo_url.captures(repo_url) else {
            return Ok(changes);
        };
        Self::hosting_facts(&mut changes);

        let key = EvidenceKey::github_repo(format!("{}/{}", &caps[1], &caps[2])).to_string();
        let Some(bytes) = evidence.get(&key).await else {
            return Ok(changes);
        };
        let data: RepoData =
            serde_json::from_slice(&bytes).map_err(|err| DetectiveError::MalformedEvidence {
                key,
                reason: err.to_string(),
            })?;
        Self::metadata(data, &mut changes);
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_license_case() {
        assert_eq!(cleanup_license("mit"), "MIT");
        assert_eq!(cleanup_license("apache-2.0"), "Apache-2.0");
        assert_eq!(cleanup_license("bsd-3-clause"), "BSD-3-Clause");
        assert_eq!(cleanup_license("gpl-3.0"), "GPL-3.0");
    }

    #[test]
    fn test_short_description_becomes_name() {
        let mut changes = Changeset::new();
        GithubBasicDetective::metadata(
            RepoData {
                name: Some("widget".into()),
                description: Some("Widget Toolkit".into()),
                license: None,
            },
            &mut changes,
        );
        assert_eq!(changes.get("name").unwrap().value, "Widget Toolkit");
        assert!(!changes.contains("description"));
    }

    #[test]
    fn test_long_description_kept_as_description() {
        let long = "A toolkit for composing widgets into larger widgets, with batteries.";
        let mut changes = Changeset::new();
        GithubBasicDetective::metadata(
            RepoData {
                name: Some("widget".into()),
                description: Some(long.into()),
                license: Some(LicenseData { key: Some("mit".into()) }),
            },
            &mut changes,
        );
        assert_eq!(changes.get("name").unwrap().value, "widget");
        assert_eq!(changes.get("description").unwrap().value, long);
        assert_eq!(changes.get("license").unwrap().value, "MIT");
    }
}
