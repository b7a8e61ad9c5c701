use async_trait::async_trait;

use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;
use crate::fields::names;
use crate::status::CriterionStatus;

/// SPDX identifiers of OSI-approved licenses.
pub const OSI_LICENSES: &[&str] = &[
    "AFL-3.0", "APL-1.0", "Apache-2.0", "APSL-2.0", "Artistic-2.0", "AAL",
    "BSD-3-Clause", "BSD-2-Clause", "BSL-1.0", "CECILL-2.1", "CATOSL-1.1",
    "CDDL-1.0", "CPAL-1.0", "CUA-OPL-1.0", "EUDatagrid", "EPL-1.0", "ECL-2.0",
    "EFL-2.0", "Entessa", "EUPL-1.1", "Fair", "Frameworx-1.0", "AGPL-3.0",
    "GPL-2.0", "GPL-3.0", "LGPL-2.1", "LGPL-3.0", "HPND", "IPL-1.0", "IPA",
    "ISC", "LPPL-1.3c", "LPL-1.02", "MirOS", "MS-PL", "MS-RL", "MIT",
    "Motosoto", "MPL-2.0", "Multics", "NASA-1.3", "NTP", "Naumen", "NGPL",
    "Nokia", "NPOSL-3.0", "OCLC-2.0", "OFL-1.1", "OGTSL", "OSL-3.0", "PHP-3.0",
    "PostgreSQL", "Python-2.0", "CNRI-Python", "QPL-1.0", "RPSL-1.0", "RPL-1.5",
    "RSCPL", "SimPL-2.0", "Sleepycat", "SPL-1.0", "Watcom-1.0", "NCSA", "UPL",
    "VSL-1.0", "W3C", "WXwindows", "Xnet", "ZPL-2.0", "Zlib",
];

/// Case-insensitive membership in [`OSI_LICENSES`].
pub fn is_osi_license(license: &str) -> bool {
    OSI_LICENSES.iter().any(|known| known.eq_ignore_ascii_case(license))
}

/// Judges the declared license against the OSI list.
pub struct FlossLicenseDetective {
    descriptor: DetectiveDescriptor,
}

impl FlossLicenseDetective {
    pub const NAME: &'static str = "FlossLicenseDetective";

    pub fn new() -> Self {
        FlossLicenseDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::LICENSE])
                .with_outputs(["floss_license_osi_status", "floss_license_status"]),
        }
    }
}

impl Default for FlossLicenseDetective {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Detective for FlossLicenseDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, _evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let mut changes = Changeset::new();
        let Some(license) = current.present(names::LICENSE) else {
            return Ok(changes);
        };
        // "or later" never makes a license less free.
        let license = license.strip_suffix('+').unwrap_or(license).trim_end();

        if is_osi_license(license) {
            let explanation =
                format!("The {license} license is approved by the Open Source Initiative (OSI).");
            for field in ["floss_license_osi_status", "floss_license_status"] {
                changes.propose(
                    field,
                    CriterionStatus::Met.as_str(),
                    Confidence::MAX,
                    explanation.as_str(),
                );
            }
        } else if !license.starts_with('(') {
            changes.propose(
                "floss_license_osi_status",
                CriterionStatus::Unmet.as_str(),
                Confidence::MIN,
                "Did not find license in the OSI list.",
            );
        }
        Ok(changes)
    }
}
