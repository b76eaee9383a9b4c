//! Past prediction runs discovered from the server's directory listings.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Folder prefix of a timestamped prediction run, e.g. `predicao_20251110_153145`.
pub const RUN_PREFIX: &str = "predicao_";

fn href_pattern() -> &'static Regex {
    static HREF: OnceLock<Regex> = OnceLock::new();
    HREF.get_or_init(|| {
        Regex::new(r#"(?i)href=["']?([^"'>\s]+)"#).expect("href regex must compile")
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Invalid listing base URL {url}: {source}")]
    BaseUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Links of one HTML directory listing, resolved against the listed folder.
#[derive(Debug, Clone)]
pub struct DirListing {
    base: Url,
    links: Vec<Url>,
}

impl DirListing {
    /// Relative hrefs resolve against `base`; links that cannot be resolved
    /// are skipped.
    pub fn parse(html: &str, base: &str) -> Result<Self, ListingError> {
        let mut base_url = Url::parse(base).map_err(|source| ListingError::BaseUrl {
            url: base.to_string(),
            source,
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let links = href_pattern()
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .filter_map(|target| base_url.join(target.as_str()).ok())
            .collect();
        Ok(Self {
            base: base_url,
            links,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn links(&self) -> &[Url] {
        &self.links
    }

    /// Run folder names in the listing, unique and in listing order.
    pub fn prediction_runs(&self) -> Vec<String> {
        self.children(|segment| segment.starts_with(RUN_PREFIX))
    }

    /// Model sub-folders of a run listing, unique and in listing order.
    pub fn run_models(&self) -> Vec<String> {
        self.children(|segment| !segment.starts_with('.'))
    }

    /// Entries directly below the base; parent and self links drop out.
    fn children(&self, keep: impl Fn(&str) -> bool) -> Vec<String> {
        let base_path = self.base.path();
        let mut found: Vec<String> = Vec::new();
        for link in &self.links {
            if link.origin() != self.base.origin() {
                continue;
            }
            let Some(rest) = link.path().strip_prefix(base_path) else {
                continue;
            };
            let Some(segment) = rest.split('/').next().filter(|s| !s.is_empty()) else {
                continue;
            };
            if keep(segment) && !found.iter().any(|existing| existing == segment) {
                found.push(segment.to_string());
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNS_PAGE: &str = r#"
        <html><body><ul>
        <li><a href="../">Parent</a></li>
        <li><a href="predicao_20251110_153145/">predicao_20251110_153145/</a></li>
        <li><a href='predicao_20251111_090000/'>second</a></li>
        <li><a href=/predictions/predicao_20251110_153145/>dup</a></li>
        <li><a href="notes.txt">notes</a></li>
        </ul></body></html>
    "#;

    #[test]
    fn relative_and_absolute_links_resolve() {
        let listing = DirListing::parse(RUNS_PAGE, "http://host:8000/predictions").unwrap();
        assert_eq!(listing.base().as_str(), "http://host:8000/predictions/");
        let links = listing.links();
        assert_eq!(links.len(), 5);
        assert_eq!(links[0].as_str(), "http://host:8000/");
        assert_eq!(
            links[1].as_str(),
            "http://host:8000/predictions/predicao_20251110_153145/"
        );
    }

    #[test]
    fn runs_are_unique_and_prefixed() {
        let listing = DirListing::parse(RUNS_PAGE, "http://host:8000/predictions/").unwrap();
        assert_eq!(
            listing.prediction_runs(),
            vec!["predicao_20251110_153145", "predicao_20251111_090000"]
        );
    }

    #[test]
    fn run_models_skip_dot_and_parent_entries() {
        let html = r#"<a href="./">.</a><a href="../">..</a><a href=".cache/">c</a>
            <a href="01_best/">01_best</a><a href="fabricante-1/">f</a>
            <a href="http://elsewhere/predictions/predicao_1/x/">x</a>"#;
        let listing = DirListing::parse(html, "http://host/predictions/predicao_1/").unwrap();
        assert_eq!(listing.run_models(), vec!["01_best", "fabricante-1"]);
    }

    #[test]
    fn href_pattern_accepts_every_quoting_style() {
        let html = r#"<A HREF="one/">1</A><a href='two/'>2</a><a href=three/>3</a><a name="x">"#;
        let targets: Vec<&str> = href_pattern()
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|target| target.as_str())
            .collect();
        assert_eq!(targets, vec!["one/", "two/", "three/"]);
    }

    #[test]
    fn bad_base_is_an_error() {
        assert!(DirListing::parse("", "not a url").is_err());
    }
}
