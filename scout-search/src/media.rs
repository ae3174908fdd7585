//! Bilingual media labels derived from a result's host.

use crate::types::MediaName;
use url::Url;

/// Label used when the host is not in [`KNOWN_MEDIA`].
pub const UNKNOWN_MEDIA: &str = "未知媒体";

/// Hosts with a known Chinese name.
const KNOWN_MEDIA: &[(&str, &str)] = &[
    ("reuters.com", "路透社"),
    ("apnews.com", "美联社"),
    ("bloomberg.com", "彭博社"),
    ("nytimes.com", "纽约时报"),
];

/// Derive the `(cn, en)` media label for `link`.
///
/// The English label is the link's host; if the link does not parse, the
/// whole link is used instead.
pub fn media_names(link: &str) -> MediaName {
    let host = Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| link.to_owned());

    let lookup = host.strip_prefix("www.").unwrap_or(&host);
    let cn = KNOWN_MEDIA
        .iter()
        .find(|(domain, _)| *domain == lookup)
        .map_or(UNKNOWN_MEDIA, |(_, name)| name);

    MediaName {
        cn: cn.to_owned(),
        en: host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_host_maps_to_chinese_name() {
        let media = media_names("https://reuters.com/world/some-story");
        assert_eq!(media.cn, "路透社");
        assert_eq!(media.en, "reuters.com");
    }

    #[test]
    fn www_prefix_ignored_for_lookup() {
        let media = media_names("https://www.nytimes.com/2024/01/01/world.html");
        assert_eq!(media.cn, "纽约时报");
        assert_eq!(media.en, "www.nytimes.com");
    }

    #[test]
    fn unknown_host_falls_back() {
        let media = media_names("https://example.org/post");
        assert_eq!(media.cn, UNKNOWN_MEDIA);
        assert_eq!(media.en, "example.org");
    }

    #[test]
    fn unparseable_link_uses_link_as_label() {
        let media = media_names("not a link");
        assert_eq!(media.cn, UNKNOWN_MEDIA);
        assert_eq!(media.en, "not a link");
    }
}
