//! The standard detective set.

mod baseline;
mod build;
mod floss_license;
mod github_basic;
mod hardened_sites;
mod how_access;
mod name_from_url;
pub mod repo_files;
mod repo_files_examine;
mod repo_json;
mod sites_https;
mod subdir;

use std::sync::Arc;

pub use baseline::BaselineDetective;
pub use build::BuildDetective;
pub use floss_license::{is_osi_license, FlossLicenseDetective, OSI_LICENSES};
pub use github_basic::{cleanup_license, GithubBasicDetective};
pub use hardened_sites::{HardenedSitesDetective, REQUIRED_HEADERS};
pub use how_access::HowAccessRepoFilesDetective;
pub use name_from_url::NameFromUrlDetective;
pub use repo_files_examine::RepoFilesExamineDetective;
pub use repo_json::RepoJsonDetective;
pub use sites_https::ProjectSitesHttpsDetective;
pub use subdir::SubdirFileContentsDetective;

use crate::detective::Detective;
use crate::error::ChiefResult;
use crate::fields::FieldCatalog;

/// Every standard detective, in registration order.
///
/// The plan reorders by dependency; registration order only breaks ties.
pub fn default_detectives(catalog: &FieldCatalog) -> ChiefResult<Vec<Arc<dyn Detective>>> {
    let detectives: Vec<Arc<dyn Detective>> = vec![
        Arc::new(NameFromUrlDetective::new()?),
        Arc::new(GithubBasicDetective::new()?),
        Arc::new(HowAccessRepoFilesDetective::new()?),
        Arc::new(RepoFilesExamineDetective::new()?),
        Arc::new(BuildDetective::new()?),
        Arc::new(SubdirFileContentsDetective::new()?),
        Arc::new(RepoJsonDetective::new(catalog)),
        Arc::new(FlossLicenseDetective::new()),
        Arc::new(ProjectSitesHttpsDetective::new()),
        Arc::new(HardenedSitesDetective::new()),
        Arc::new(BaselineDetective::new()?),
    ];
    Ok(detectives)
}
