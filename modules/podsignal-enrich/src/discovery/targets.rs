use podsignal_common::FieldKey;

/// One field the orchestrator can search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryTarget {
    pub key: FieldKey,
    /// Query substitutes the host name instead of the podcast name.
    pub host_scoped: bool,
    /// `{name}` is the podcast name, `{host}` the host name.
    pub query: &'static str,
    /// Used for host-scoped targets while no host name is known.
    pub fallback_query: Option<&'static str>,
}

impl DiscoveryTarget {
    pub fn label(&self) -> &'static str {
        self.key.label()
    }

    pub fn build_query(&self, name: &str, host: Option<&str>) -> String {
        match (self.host_scoped, host, self.fallback_query) {
            (true, Some(host), _) => self.query.replace("{host}", host).replace("{name}", name),
            (true, None, Some(fallback)) => fallback.replace("{name}", name),
            _ => self.query.replace("{name}", name),
        }
    }
}

const fn target(key: FieldKey, query: &'static str) -> DiscoveryTarget {
    DiscoveryTarget {
        key,
        host_scoped: false,
        query,
        fallback_query: None,
    }
}

const fn host_target(key: FieldKey, query: &'static str, fallback: &'static str) -> DiscoveryTarget {
    DiscoveryTarget {
        key,
        host_scoped: true,
        query,
        fallback_query: Some(fallback),
    }
}

/// Search order. The host target comes first so host-scoped targets can use a real name.
pub const TARGETS: &[DiscoveryTarget] = &[
    target(FieldKey::HostNames, "who hosts the {name} podcast"),
    target(FieldKey::WebsiteUrl, "{name} podcast official website"),
    target(FieldKey::ContactEmail, "{name} podcast contact email"),
    target(FieldKey::TwitterUrl, "{name} podcast twitter"),
    target(FieldKey::InstagramUrl, "{name} podcast instagram"),
    target(FieldKey::TiktokUrl, "{name} podcast tiktok"),
    target(FieldKey::LinkedinUrl, "{name} podcast linkedin page"),
    target(FieldKey::YoutubeUrl, "{name} podcast youtube channel"),
    target(FieldKey::FacebookUrl, "{name} podcast facebook page"),
    host_target(
        FieldKey::HostLinkedinUrl,
        "{host} {name} podcast host linkedin",
        "{name} podcast host linkedin",
    ),
    host_target(
        FieldKey::HostTwitterUrl,
        "{host} {name} podcast host twitter",
        "{name} podcast host twitter",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::DiscoveryResult;
    use ai_client::StructuredOutput;

    #[test]
    fn host_target_runs_first() {
        assert_eq!(TARGETS[0].key, FieldKey::HostNames);
        assert!(TARGETS.iter().skip(1).all(|t| t.key != FieldKey::HostNames));
    }

    #[test]
    fn every_target_is_in_the_extraction_schema() {
        let schema = DiscoveryResult::openai_schema();
        let props = schema["properties"].as_object().unwrap();
        for t in TARGETS {
            assert!(props.contains_key(t.key.name()), "{} missing from schema", t.key);
        }
        assert_eq!(props.len(), TARGETS.len());
    }

    #[test]
    fn host_scoped_queries_fall_back_without_host() {
        let t = TARGETS.iter().find(|t| t.key == FieldKey::HostLinkedinUrl).unwrap();
        assert_eq!(
            t.build_query("Tech Show", Some("Jane Doe")),
            "Jane Doe Tech Show podcast host linkedin"
        );
        assert_eq!(t.build_query("Tech Show", None), "Tech Show podcast host linkedin");
        let website = TARGETS.iter().find(|t| t.key == FieldKey::WebsiteUrl).unwrap();
        assert_eq!(
            website.build_query("Tech Show", Some("Jane Doe")),
            "Tech Show podcast official website"
        );
    }
}
