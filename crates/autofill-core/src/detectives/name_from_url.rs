use async_trait::async_trait;
use regex::Regex;

use crate::changeset::{Changeset, Confidence};
use crate::detective::{Current, Detective, DetectiveDescriptor};
use crate::error::DetectiveResult;
use crate::evidence::Evidence;
use crate::fields::names;

/// Guesses the project name from the homepage domain or a URL tail.
pub struct NameFromUrlDetective {
    descriptor: DetectiveDescriptor,
    domain: Regex,
    tail: Regex,
}

impl NameFromUrlDetective {
    pub const NAME: &'static str = "NameFromUrlDetective";

    pub fn new() -> Result<Self, regex::Error> {
        Ok(NameFromUrlDetective {
            descriptor: DetectiveDescriptor::new(Self::NAME)
                .with_inputs([names::REPO_URL, names::HOMEPAGE_URL])
                .with_outputs([names::NAME]),
            domain: Regex::new(r"\Ahttps?://(www\.)?([A-Za-z0-9-]+)\.([A-Za-z0-9._-]*)/?\z")?,
            tail: Regex::new(r"[^/]/([A-Za-z0-9._-]*)/?\z")?,
        })
    }

    fn tail_of<'u>(&self, url: &'u str) -> Option<&'u str> {
        self.tail
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
    }

    fn guess(&self, homepage: Option<&str>, repo: Option<&str>) -> Option<(String, &'static str)> {
        if let Some(homepage) = homepage {
            if let Some(domain) = self.domain.captures(homepage).and_then(|c| c.get(2)) {
                return Some((
                    domain.as_str().to_string(),
                    "The project URL's domain name suggests this.",
                ));
            }
            if let Some(tail) = self.tail_of(homepage) {
                return Some((tail.to_string(), "The project URL's tail suggests this."));
            }
        }
        repo.and_then(|repo| self.tail_of(repo))
            .map(|tail| (tail.to_string(), "The repo URL's tail suggests this."))
    }
}

#[async_trait]
impl Detective for NameFromUrlDetective {
    fn descriptor(&self) -> &DetectiveDescriptor {
        &self.descriptor
    }

    async fn analyze(&self, _evidence: &Evidence, current: &Current) -> DetectiveResult<Changeset> {
        let mut changes = Changeset::new();
        if let Some((name, why)) = self.guess(
            current.present(names::HOMEPAGE_URL),
            current.present(names::REPO_URL),
        ) {
            changes.propose(names::NAME, name, Confidence::MIN, why);
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_beats_tail() {
        let d = NameFromUrlDetective::new().unwrap();
        let (name, why) = d
            .guess(Some("https://www.widget.org/"), Some("https://github.com/acme/other"))
            .unwrap();
        assert_eq!(name, "widget");
        assert!(why.contains("domain"));
    }

    #[test]
    fn test_homepage_tail_then_repo_tail() {
        let d = NameFromUrlDetective::new().unwrap();
        let (name, _) = d.guess(Some("https://acme.github.io/widget"), None).unwrap();
        assert_eq!(name, "widget");
        let (name, why) = d.guess(None, Some("https://github.com/acme/gadget/")).unwrap();
        assert_eq!(name, "gadget");
        assert!(why.contains("repo URL"));
        assert!(d.guess(None, None).is_none());
    }
}
