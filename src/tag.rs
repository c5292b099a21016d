//! Defines the [`Tag`] type, which represents a [`Post`] tag, and the
//! [`TagIndex`], which groups the posts of a [`PostSet`] by tag.

use crate::post::{Post, PostSet};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// The output subdirectory (and URL path segment) for tag pages.
pub const TAGS_DIRECTORY: &str = "tags";

/// Represents a [`Post`] tag. The `name` is kept as written for display; the
/// `slug` decides identity and the tag page's file name, so `macOS` and
/// `MacOS` resolve to the same page and no tag can escape the tags
/// directory.
#[derive(Clone, Debug)]
pub struct Tag {
    pub name: String,
    pub slug: String,
}

impl Tag {
    /// Creates a tag from its display name. Returns `None` when the name has
    /// no characters that survive slugification (e.g. `"/.."`).
    pub fn new(name: &str) -> Option<Tag> {
        let name = name.trim();
        let slug = slug::slugify(name);
        if slug.is_empty() {
            return None;
        }
        Some(Tag {
            name: name.to_owned(),
            slug,
        })
    }

    /// `<slug>.html`
    pub fn file_name(&self) -> String {
        format!("{}.html", self.slug)
    }

    /// `/tags/<slug>.html`
    pub fn url(&self) -> String {
        format!("/{}/{}", TAGS_DIRECTORY, self.file_name())
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `slug`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `slug` field.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Tag {}

/// Trims tag names and drops blank ones and exact repeats, keeping the order
/// of first appearance.
pub fn normalize<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        if !name.is_empty() && !tags.iter().any(|t| t == name) {
            tags.push(name.to_owned());
        }
    }
    tags
}

/// The posts carrying one tag.
#[derive(Debug)]
pub struct TagGroup<'a> {
    /// The tag as first encountered in the post set.
    pub tag: &'a Tag,

    /// Posts in [`PostSet`] order.
    pub posts: Vec<&'a Post>,
}

/// Maps each distinct tag to the posts carrying it. Iteration is ordered by
/// slug so that builds are reproducible.
#[derive(Debug, Default)]
pub struct TagIndex<'a>(BTreeMap<&'a str, TagGroup<'a>>);

impl<'a> TagIndex<'a> {
    /// Groups `posts` by tag. A post with N tags lands in N groups; within a
    /// group posts keep the set's global order.
    pub fn new(posts: &'a PostSet) -> TagIndex<'a> {
        let mut groups: BTreeMap<&'a str, TagGroup<'a>> = BTreeMap::new();
        for post in posts.iter() {
            for tag in &post.tags {
                groups
                    .entry(tag.slug.as_str())
                    .or_insert_with(|| TagGroup {
                        tag,
                        posts: Vec::new(),
                    })
                    .posts
                    .push(post);
            }
        }
        TagIndex(groups)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, slug: &str) -> Option<&TagGroup<'a>> {
        self.0.get(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagGroup<'a>> {
        self.0.values()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::post;

    fn ids(group: &TagGroup) -> Vec<String> {
        group.posts.iter().map(|p| p.source_id.clone()).collect()
    }

    #[test]
    fn test_slug_and_paths() {
        let tag = Tag::new(" Rust Lang ").unwrap();
        assert_eq!("Rust Lang", tag.name);
        assert_eq!("rust-lang", tag.slug);
        assert_eq!("rust-lang.html", tag.file_name());
        assert_eq!("/tags/rust-lang.html", tag.url());
    }

    #[test]
    fn test_path_unsafe_tags_are_contained() {
        let tag = Tag::new("../etc/passwd").unwrap();
        assert!(!tag.file_name().contains('/'));
        assert!(Tag::new("/..").is_none());
    }

    #[test]
    fn test_equality_by_slug() {
        assert_eq!(Tag::new("macOS").unwrap(), Tag::new("MacOS").unwrap());
        assert_ne!(Tag::new("go").unwrap(), Tag::new("rust").unwrap());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            vec!["go", "rust"],
            normalize(vec![" go", "", "rust ", "go", "   "])
        );
    }

    #[test]
    fn test_fan_out() {
        let posts = PostSet::new(vec![
            post("both.md", "2023-01-02", &["a", "b"]),
            post("only-a.md", "2023-01-01", &["a"]),
            post("untagged.md", "2023-01-03", &[]),
        ]);
        let index = TagIndex::new(&posts);

        assert_eq!(2, index.len());
        assert_eq!(vec!["both.md", "only-a.md"], ids(index.get("a").unwrap()));
        assert_eq!(vec!["both.md"], ids(index.get("b").unwrap()));
        assert!(index.get("untagged").is_none());
    }

    #[test]
    fn test_group_order_follows_post_set() {
        let posts = PostSet::new(vec![
            post("old.md", "2021-01-01", &["x"]),
            post("new.md", "2023-01-01", &["x"]),
            post("mid.md", "2022-01-01", &["x"]),
        ]);
        let index = TagIndex::new(&posts);
        assert_eq!(
            vec!["new.md", "mid.md", "old.md"],
            ids(index.get("x").unwrap())
        );
    }

    #[test]
    fn test_groups_iterate_by_slug_with_first_seen_name() {
        let posts = PostSet::new(vec![
            post("new.md", "2023-01-01", &["Rust"]),
            post("old.md", "2022-01-01", &["rust", "Go"]),
        ]);
        let index = TagIndex::new(&posts);
        let names: Vec<&str> = index.iter().map(|g| g.tag.name.as_str()).collect();
        assert_eq!(vec!["Go", "Rust"], names);
        assert_eq!(vec!["new.md", "old.md"], ids(index.get("rust").unwrap()));
    }

    #[test]
    fn test_empty() {
        let posts = PostSet::new(Vec::new());
        assert!(TagIndex::new(&posts).is_empty());
    }
}
