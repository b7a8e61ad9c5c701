use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use super::repo_files::RepoFiles;
use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;
use crate::fields::names;
use crate::status::CriterionStatus;

const SECURITY_POLICY: &str = "osps_gv_02_01_status";
const VULNERABILITY_REPORTING: &str = "osps_gv_03_01_status";
const LICENSE_DECLARED: &str = "osps_le_02_01_status";

/// License values that declare nothing.
const NO_LICENSE: &[&str] = &["NOASSERTION", "NONE"];

/// Baseline controls that follow from a security policy and a license.
///
/// Suggest-only.
pub struct BaselineDetective {
    descriptor: DetectiveDescriptor,
    security_file: Regex,
}

impl BaselineDetective {
    pub const NAME: &'static str = "BaselineDetective";

    pub fn new() -> Result<Self, regex::Error> {
        Ok(BaselineDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_FILES, names::LICENSE])
                .with_outputs([SECURITY_POLICY, VULNERABILITY_REPORTING, LICENSE_DECLARED])
                .with_overridable_outputs(Vec::<String>::new()),
            security_file: RegexBuilder::new(r"\ASECURITY(\.md|\.txt)?\z")
                .case_insensitive(true)
                .build()?,
        })
    }

    async fn security_policy(
        &self,
        evidence: &Evidence,
        current: &Current,
        changes: &mut Changeset,
    ) -> DetectiveResult<()> {
        let Some(files) = current
            .present(names::REPO_FILES)
            .and_then(|locator| RepoFiles::locate(evidence, locator))
        else {
            return Ok(());
        };
        let top_level = files.list("").await?;
        let Some(policy) = top_level
            .iter()
            .find(|e| e.is_file() && self.security_file.is_match(&e.name))
        else {
            return Ok(());
        };

        let met = CriterionStatus::Met.as_str();
        changes.propose(
            SECURITY_POLICY,
            met,
            Confidence::saturating(3),
            format!("Security policy found: {}.", policy.name),
        );
        changes.propose(
            VULNERABILITY_REPORTING,
            met,
            Confidence::saturating(3),
            "Security policy file suggests vulnerability reporting process is documented.",
        );
        Ok(())
    }
}

#[async_trait]
impl Detective for BaselineDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let mut changes = Changeset::new();
        self.security_policy(evidence, current, &mut changes).await?;

        if let Some(license) = current
            .present(names::LICENSE)
            .filter(|l| !NO_LICENSE.contains(l))
        {
            changes.propose(
                LICENSE_DECLARED,
                CriterionStatus::Met.as_str(),
                Confidence::saturating(3),
                format!("License declared: {license}."),
            );
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_source::MemorySource;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_license_without_repo_files() {
        let d = BaselineDetective::new().unwrap();
        let evidence = Evidence::new(Arc::new(MemorySource::new()), 1024);
        let current: Current = [("license", "MIT")].into_iter().collect();
        let changes = d.analyze(&evidence, &current).await.unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get(LICENSE_DECLARED).unwrap().value, "Met");

        let none: Current = [("license", "NOASSERTION")].into_iter().collect();
        assert!(d.analyze(&evidence, &none).await.unwrap().is_empty());
    }
}
