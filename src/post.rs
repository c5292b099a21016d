//! Defines [`Post`], the in-memory record for one published document, and
//! [`PostSet`], the date-ordered collection every renderer reads from.

use crate::tag::Tag;
use crate::url::Permalink;
use chrono::{DateTime, Utc};
use std::ops::Deref;

/// Post metadata as supplied by a single origin (a front-matter block or a
/// manifest entry). Every field is optional here; [`crate::parser::Parser`]
/// merges the origins and enforces the required ones.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub description: Option<String>,

    /// Trimmed, non-empty tag names in order of first appearance. `None` means
    /// the origin didn't mention tags at all.
    pub tags: Option<Vec<String>>,
}

impl Metadata {
    /// Fills each field missing from `self` with the corresponding field from
    /// `fallback`.
    pub fn or(self, fallback: Metadata) -> Metadata {
        Metadata {
            title: self.title.or(fallback.title),
            published_at: self.published_at.or(fallback.published_at),
            description: self.description.or(fallback.description),
            tags: self.tags.or(fallback.tags),
        }
    }
}

/// One published document.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// Identifies the source document: its path relative to the posts
    /// directory, or its manifest `source` entry.
    pub source_id: String,

    pub title: String,
    pub published_at: DateTime<Utc>,
    pub description: Option<String>,
    pub tags: Vec<Tag>,

    /// The rendered HTML body. Trusted; templates insert it verbatim.
    pub body: String,

    pub permalink: Permalink,
}

impl Post {
    /// Returns the part of the body above the `<!-- more -->` fold and whether
    /// the fold was found. Without a fold the whole body is the summary.
    pub fn summary(&self) -> (&str, bool) {
        const FOLD_TAG: &str = "<!-- more -->";
        match self.body.find(FOLD_TAG) {
            Some(i) => (&self.body[..i], true),
            None => (&self.body, false),
        }
    }
}

/// The posts of one build, newest first. Construction is the only way to get
/// one, so every consumer observes the same order.
#[derive(Clone, Debug, Default)]
pub struct PostSet(Vec<Post>);

impl PostSet {
    /// Sorts `posts` by publication date, most recent first. The sort is
    /// stable: posts with identical timestamps keep their discovery order.
    pub fn new(mut posts: Vec<Post>) -> PostSet {
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        PostSet(posts)
    }

    /// The most recently published post, if there is one.
    pub fn newest(&self) -> Option<&Post> {
        self.0.first()
    }
}

impl Deref for PostSet {
    type Target = [Post];

    fn deref(&self) -> &[Post] {
        &self.0
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::config::Layout;

    /// Builds a post whose tags are taken verbatim.
    pub(crate) fn post(source_id: &str, date: &str, tags: &[&str]) -> Post {
        Post {
            source_id: source_id.to_owned(),
            title: source_id.to_uppercase(),
            published_at: crate::date::parse(date).unwrap(),
            description: None,
            tags: tags.iter().map(|t| Tag::new(t).unwrap()).collect(),
            body: format!("<p>{}</p>", source_id),
            permalink: Permalink::new(source_id, Layout::Root).unwrap(),
        }
    }

    fn ids(set: &PostSet) -> Vec<&str> {
        set.iter().map(|p| p.source_id.as_str()).collect()
    }

    #[test]
    fn test_sorted_newest_first() {
        let set = PostSet::new(vec![
            post("jan.md", "2023-01-01", &[]),
            post("mar.md", "2023-03-01", &[]),
            post("feb.md", "2023-02-01", &[]),
        ]);
        assert_eq!(vec!["mar.md", "feb.md", "jan.md"], ids(&set));
        assert_eq!("mar.md", set.newest().unwrap().source_id);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let set = PostSet::new(vec![
            post("b.md", "2023-01-01", &[]),
            post("newest.md", "2023-05-01", &[]),
            post("a.md", "2023-01-01", &[]),
            post("c.md", "2023-01-01", &[]),
        ]);
        assert_eq!(vec!["newest.md", "b.md", "a.md", "c.md"], ids(&set));
    }

    #[test]
    fn test_zoned_dates_compare_as_instants() {
        let set = PostSet::new(vec![
            // 23:00 UTC on the 1st
            post("late.md", "2023-01-02T01:00:00+02:00", &[]),
            post("noon.md", "2023-01-01T12:00:00Z", &[]),
        ]);
        assert_eq!(vec!["late.md", "noon.md"], ids(&set));
    }

    #[test]
    fn test_empty_set_has_no_newest() {
        assert!(PostSet::new(Vec::new()).newest().is_none());
    }

    #[test]
    fn test_permalink_depends_only_on_source() {
        let alone = PostSet::new(vec![post("hello.md", "2023-01-01", &[])]);
        let crowded = PostSet::new(vec![
            post("other.md", "2024-01-01", &[]),
            post("hello.md", "2023-01-01", &[]),
        ]);
        assert_eq!(alone[0].permalink, crowded[1].permalink);
        assert_eq!("/hello.html", crowded[1].permalink.url);
    }

    #[test]
    fn test_summary_fold() {
        let mut p = post("fold.md", "2023-01-01", &[]);
        p.body = "<p>above</p><!-- more --><p>below</p>".to_owned();
        assert_eq!(("<p>above</p>", true), p.summary());

        p.body = "<p>all</p>".to_owned();
        assert_eq!(("<p>all</p>", false), p.summary());
    }

    #[test]
    fn test_metadata_or_prefers_self() {
        let manifest = Metadata {
            title: None,
            published_at: crate::date::parse("2023-01-01").ok(),
            description: None,
            tags: Some(vec!["go".to_owned()]),
        };
        let frontmatter = Metadata {
            title: Some("From front matter".to_owned()),
            published_at: crate::date::parse("2020-01-01").ok(),
            description: Some("d".to_owned()),
            tags: None,
        };
        let merged = manifest.clone().or(frontmatter);
        assert_eq!(Some("From front matter".to_owned()), merged.title);
        assert_eq!(manifest.published_at, merged.published_at);
        assert_eq!(Some("d".to_owned()), merged.description);
        assert_eq!(Some(vec!["go".to_owned()]), merged.tags);
    }
}
