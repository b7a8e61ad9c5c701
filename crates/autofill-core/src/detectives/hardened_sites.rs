use std::collections::BTreeMap;

use async_trait::async_trait;
use evidence_source::EvidenceKey;

use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::{DetectiveError, DetectiveResult};
use crate::evidence::Evidence;
use crate::fields::names;
use crate::status::CriterionStatus;

const STATUS: &str = "hardened_site_status";
const XCTO: &str = "x-content-type-options";

/// Hardening headers every project site must send.
pub const REQUIRED_HEADERS: &[&str] = &[
    "content-security-policy",
    XCTO,
    "x-frame-options",
    "x-xss-protection",
];

type Headers = BTreeMap<String, String>;

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Hardened,
    Missing,
    NoSniff,
}

fn judge(sites: &[Headers]) -> Verdict {
    let complete = sites
        .iter()
        .all(|headers| REQUIRED_HEADERS.iter().all(|h| headers.contains_key(*h)));
    if !complete {
        return Verdict::Missing;
    }
    let nosniff = sites.iter().all(|headers| {
        headers
            .get(XCTO)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("nosniff"))
    });
    if nosniff {
        Verdict::Hardened
    } else {
        Verdict::NoSniff
    }
}

/// Checks the homepage and repository respond with hardening headers.
pub struct HardenedSitesDetective {
    descriptor: DetectiveDescriptor,
}

impl HardenedSitesDetective {
    pub const NAME: &'static str = "HardenedSitesDetective";

    pub fn new() -> Self {
        HardenedSitesDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_URL, names::HOMEPAGE_URL])
                .with_outputs([STATUS]),
        }
    }

    async fn headers(evidence: &Evidence, url: &str) -> DetectiveResult<Option<Headers>> {
        let key = EvidenceKey::headers(url).to_string();
        let Some(bytes) = evidence.get(&key).await else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| DetectiveError::MalformedEvidence {
                key,
                reason: err.to_string(),
            })
    }
}

impl Default for HardenedSitesDetective {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detective for HardenedSitesDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let mut changes = Changeset::new();
        let (Some(homepage), Some(repo)) = (
            current.present(names::HOMEPAGE_URL),
            current.present(names::REPO_URL),
        ) else {
            return Ok(changes);
        };

        let (homepage, repo) = futures::join!(
            Self::headers(evidence, homepage),
            Self::headers(evidence, repo)
        );
        // Without headers from both sites there is nothing to judge.
        let (Some(homepage), Some(repo)) = (homepage?, repo?) else {
            return Ok(changes);
        };

        let (status, confidence, explanation) = match judge(&[homepage, repo]) {
            Verdict::Hardened => (
                CriterionStatus::Met,
                3,
                "Found all required security hardening headers.",
            ),
            Verdict::Missing => (
                CriterionStatus::Unmet,
                5,
                "One or more of the required security hardening headers is missing.",
            ),
            Verdict::NoSniff => (
                CriterionStatus::Unmet,
                5,
                "X-Content-Type-Options was not set to \"nosniff\".",
            ),
        };
        changes.propose(
            STATUS,
            status.as_str(),
            Confidence::saturating(confidence),
            explanation,
        );
        Ok(changes)
    }
}
