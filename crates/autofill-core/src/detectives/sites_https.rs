use async_trait::async_trait;

use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;
use crate::fields::names;
use crate::status::CriterionStatus;

const STATUS: &str = "sites_https_status";

/// Checks the project's own URLs use https.
pub struct ProjectSitesHttpsDetective {
    descriptor: DetectiveDescriptor,
}

impl ProjectSitesHttpsDetective {
    pub const NAME: &'static str = "ProjectSitesHttpsDetective";

    pub fn new() -> Self {
        ProjectSitesHttpsDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_URL, names::HOMEPAGE_URL])
                .with_outputs([STATUS]),
        }
    }
}

impl Default for ProjectSitesHttpsDetective {
    fn default() -> Self {
        Self::new()
    }
}

fn has_scheme(url: &str, scheme: &str) -> bool {
    url.get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
}

#[async_trait]
impl Detective for ProjectSitesHttpsDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, _evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let mut changes = Changeset::new();
        let urls: Vec<&str> = [names::REPO_URL, names::HOMEPAGE_URL]
            .into_iter()
            .filter_map(|field| current.present(field))
            .collect();

        if urls.iter().any(|url| has_scheme(url, "http://")) {
            changes.propose(
                STATUS,
                CriterionStatus::Unmet.as_str(),
                Confidence::MAX,
                "Given an http: URL.",
            );
        } else if urls.iter().any(|url| has_scheme(url, "https://")) {
            changes.propose(
                STATUS,
                CriterionStatus::Met.as_str(),
                Confidence::saturating(3),
                "Given only https: URLs.",
            );
        }
        Ok(changes)
    }
}
