use regex::Regex;
use std::sync::OnceLock;

/// Identifier shapes, tried in priority order. The first one that matches wins.
const FILE_ID_PATTERNS: [&str; 3] = [
    r"/file/d/([A-Za-z0-9_-]+)",
    r"id=([A-Za-z0-9_-]+)",
    r"/d/([A-Za-z0-9_-]+)",
];

static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

fn patterns() -> &'static [Regex] {
    PATTERNS.get_or_init(|| {
        FILE_ID_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub direct_url: String,
    pub file_id: String,
}

impl ResolvedLink {
    /// Variant of the direct URL that acknowledges the "can't scan for viruses" interstitial.
    pub fn confirm_url(&self) -> String {
        format!("{}&confirm=1", self.direct_url)
    }
}

/// Resolve a shareable link into a direct-download URL rooted at `base`.
///
/// Returns `None` when no identifier shape matches; that is an ordinary outcome
/// for roster rows holding something other than a sharing link.
pub fn resolve_with_base(share_link: &str, base: &str) -> Option<ResolvedLink> {
    let file_id = patterns()
        .iter()
        .find_map(|re| re.captures(share_link))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())?;

    Some(ResolvedLink {
        direct_url: format!(
            "{}?export=download&id={}",
            base.trim_end_matches('/'),
            file_id
        ),
        file_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DRIVE_DOWNLOAD_BASE;

    fn resolve_share_link(share_link: &str) -> Option<ResolvedLink> {
        resolve_with_base(share_link, DEFAULT_DRIVE_DOWNLOAD_BASE)
    }

    #[test]
    fn resolves_file_d_links() {
        let link = "https://drive.google.com/file/d/1AbC-dEf_123/view?usp=sharing";
        let resolved = resolve_share_link(link).unwrap();
        assert_eq!(resolved.file_id, "1AbC-dEf_123");
        assert_eq!(
            resolved.direct_url,
            "https://drive.google.com/uc?export=download&id=1AbC-dEf_123"
        );
    }

    #[test]
    fn resolves_id_query_links() {
        let resolved = resolve_share_link("https://drive.google.com/open?id=XyZ_9-8").unwrap();
        assert_eq!(resolved.file_id, "XyZ_9-8");
        assert_eq!(
            resolved.direct_url,
            "https://drive.google.com/uc?export=download&id=XyZ_9-8"
        );
    }

    #[test]
    fn resolves_bare_d_links() {
        let resolved =
            resolve_share_link("https://docs.google.com/document/d/Doc42/edit").unwrap();
        assert_eq!(resolved.file_id, "Doc42");
    }

    #[test]
    fn file_d_beats_id_query() {
        let resolved =
            resolve_share_link("https://drive.google.com/file/d/FIRST/view?id=SECOND").unwrap();
        assert_eq!(resolved.file_id, "FIRST");
    }

    #[test]
    fn id_query_beats_bare_d() {
        let resolved = resolve_share_link("https://example.com/d/THIRD?id=SECOND").unwrap();
        assert_eq!(resolved.file_id, "SECOND");
    }

    #[test]
    fn id_stops_at_first_foreign_character() {
        let resolved = resolve_share_link("https://drive.google.com/file/d/abc.def/view").unwrap();
        assert_eq!(resolved.file_id, "abc");
    }

    #[test]
    fn unrecognised_links_resolve_to_nothing() {
        assert_eq!(resolve_share_link("not-a-link"), None);
        assert_eq!(resolve_share_link(""), None);
        assert_eq!(resolve_share_link("https://drive.google.com/file/d/"), None);
    }

    #[test]
    fn custom_base_and_confirm_variant() {
        let resolved = resolve_with_base("https://x/file/d/F1/view", "http://127.0.0.1:9/uc/").unwrap();
        assert_eq!(resolved.direct_url, "http://127.0.0.1:9/uc?export=download&id=F1");
        assert_eq!(
            resolved.confirm_url(),
            "http://127.0.0.1:9/uc?export=download&id=F1&confirm=1"
        );
    }
}
