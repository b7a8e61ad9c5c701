use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use super::repo_files::RepoFiles;
use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;
use crate::fields::names;
use crate::status::CriterionStatus;

const BUILD_FILES: &str = r"\A(Makefile|GNUmakefile|configure\.ac|autoconf\.ac|automake\.am|Makefile\.am|CMakeLists\.txt|meson\.build|Rakefile|pom\.xml|build\.xml|build\.gradle|build\.gradle\.kts|.*\.proj|build\.sbt|SConstruct|wscript|Cargo\.toml|BUILD|BUILD\.bazel)\z";

/// Recognises a top-level file of a common build system.
pub struct BuildDetective {
    descriptor: DetectiveDescriptor,
    build_file: Regex,
}

impl BuildDetective {
    pub const NAME: &'static str = "BuildDetective";

    pub fn new() -> Result<Self, regex::Error> {
        Ok(BuildDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_URL, names::REPO_FILES])
                .with_outputs(["build_status", "build_common_tools_status"]),
            build_file: RegexBuilder::new(BUILD_FILES).case_insensitive(true).build()?,
        })
    }
}

#[async_trait]
impl Detective for BuildDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let mut changes = Changeset::new();
        let Some(files) = current
            .present(names::REPO_FILES)
            .and_then(|locator| RepoFiles::locate(evidence, locator))
        else {
            return Ok(changes);
        };

        let top_level = files.list("").await?;
        let Some(found) = top_level
            .iter()
            .find(|e| e.is_file() && self.build_file.is_match(&e.name))
        else {
            return Ok(changes);
        };

        let explanation = format!(
            "Non-trivial build file in repository: <{}>.",
            found.html_url.as_deref().unwrap_or(&found.path)
        );
        for field in ["build_status", "build_common_tools_status"] {
            changes.propose(
                field,
                CriterionStatus::Met.as_str(),
                Confidence::saturating(3),
                explanation.as_str(),
            );
        }
        Ok(changes)
    }
}
