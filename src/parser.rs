//! Defines the [`Parser`] and [`Error`] types: the logic for turning post
//! source documents into [`Post`] records.
//!
//! A source document starts with a metadata block followed by a markdown
//! body. Two block styles are understood:
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2021-04-16
//! tags: [greet, meta]
//! ---
//! # Hello
//! ```
//!
//! and the bare style, where `key: value` lines run until the first blank line
//! and indented lines continue the previous key:
//!
//! ```md
//! title: Hello, world!
//! date: 2021-04-16T09:30:00+02:00
//! tags: greet, meta
//!
//! # Hello
//! ```
//!
//! `title` and `date` (or `published_at`) are required; `description` and
//! `tags` are optional.

use crate::config::Layout;
use crate::date;
use crate::markdown;
use crate::post::{Metadata, Post};
use crate::source::Source;
use crate::tag::{self, Tag};
use crate::url::{Converter as LinkConverter, InvalidFileNameError, Permalink};
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Parses [`Post`] objects from [`Source`]s.
pub struct Parser {
    layout: Layout,
    link_converter: LinkConverter,
}

impl Parser {
    /// Constructs a parser producing permalinks for `layout`.
    pub fn new(layout: Layout) -> Parser {
        Parser {
            layout,
            link_converter: LinkConverter::new(layout),
        }
    }

    /// Parses every source, in order. Fails on the first invalid post, and
    /// when two posts would be written to the same page.
    pub fn parse_all(&self, sources: &[Source]) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = Vec::with_capacity(sources.len());
        let mut seen: HashMap<String, usize> = HashMap::new();
        for source in sources {
            let post = self.parse(source)?;
            if let Some(&i) = seen.get(&post.permalink.url) {
                return Err(Error::new(
                    &post.source_id,
                    ErrorKind::DuplicatePermalink {
                        permalink: post.permalink.url.clone(),
                        other: posts[i].source_id.clone(),
                    },
                ));
            }
            seen.insert(post.permalink.url.clone(), posts.len());
            tracing::debug!("parsed post `{}`", post.source_id);
            posts.push(post);
        }
        Ok(posts)
    }

    /// Reads and parses a single source document.
    pub fn parse(&self, source: &Source) -> Result<Post> {
        let input = std::fs::read_to_string(&source.path).map_err(|err| {
            Error::new(
                &source.id,
                ErrorKind::Read {
                    path: source.path.clone(),
                    err,
                },
            )
        })?;
        self.parse_str(&source.id, &input, source.overrides.clone())
    }

    /// Parses a single post from its source identifier and contents.
    /// `overrides` win over the document's own metadata, field by field.
    pub fn parse_str(&self, source_id: &str, input: &str, overrides: Metadata) -> Result<Post> {
        self._parse_str(source_id, input, overrides)
            .map_err(|kind| Error::new(source_id, kind))
    }

    fn _parse_str(
        &self,
        source_id: &str,
        input: &str,
        overrides: Metadata,
    ) -> std::result::Result<Post, ErrorKind> {
        let permalink = Permalink::new(source_id, self.layout)?;
        let (frontmatter, body) = split_frontmatter(input)?;
        let metadata = overrides.or(frontmatter.into_metadata()?);

        let title = non_blank(metadata.title).ok_or(ErrorKind::MissingField("title"))?;
        let published_at = metadata
            .published_at
            .ok_or(ErrorKind::MissingField("date"))?;

        let mut tags: Vec<Tag> = Vec::new();
        for name in metadata.tags.unwrap_or_default() {
            let tag = Tag::new(&name).ok_or(ErrorKind::InvalidTag(name))?;
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        Ok(Post {
            source_id: source_id.to_owned(),
            title,
            published_at,
            description: non_blank(metadata.description),
            tags,
            body: markdown::to_html(body, &self.link_converter),
            permalink,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// The metadata block of a post, before validation.
#[derive(Deserialize, Default, Debug)]
struct Frontmatter {
    #[serde(default, alias = "Title")]
    title: Option<String>,

    #[serde(default, alias = "Date", alias = "published_at", alias = "PublishedAt")]
    date: Option<String>,

    #[serde(default, alias = "Description")]
    description: Option<String>,

    #[serde(default, alias = "Tags")]
    tags: Option<TagList>,
}

/// Tags may be given as a list or as a comma-separated string.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TagList {
    List(Vec<TagScalar>),
    Csv(TagScalar),
}

/// A single YAML scalar used as tag text. `2023` and `true` are as good a tag
/// as `rust`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TagScalar {
    Text(String),
    Number(serde_yaml::Number),
    Bool(bool),
}

impl TagScalar {
    fn into_text(self) -> String {
        match self {
            TagScalar::Text(text) => text,
            TagScalar::Number(number) => number.to_string(),
            TagScalar::Bool(value) => value.to_string(),
        }
    }
}

impl Frontmatter {
    /// Parses the bare `key: value` style. Keys are case-insensitive;
    /// continuation lines are joined with a space.
    fn from_meta_lines(lines: &[(&str, Vec<&str>)]) -> Frontmatter {
        let mut frontmatter = Frontmatter::default();
        for (key, values) in lines {
            let value = values.join(" ");
            match key.to_lowercase().as_str() {
                "title" => frontmatter.title = Some(value),
                "date" | "published_at" => frontmatter.date = Some(value),
                "description" => frontmatter.description = Some(value),
                // Each continuation line may itself hold comma-separated tags.
                "tags" => {
                    frontmatter.tags = Some(TagList::Csv(TagScalar::Text(values.join(","))))
                }
                _ => {}
            }
        }
        frontmatter
    }

    fn into_metadata(self) -> std::result::Result<Metadata, ErrorKind> {
        let published_at = match self.date {
            Some(date) => Some(date::parse(&date)?),
            None => None,
        };
        let tags = self.tags.map(|tags| match tags {
            TagList::List(list) => tag::normalize(list.into_iter().map(TagScalar::into_text)),
            TagList::Csv(csv) => tag::normalize(csv.into_text().split(',')),
        });
        Ok(Metadata {
            title: self.title,
            published_at,
            description: self.description,
            tags,
        })
    }
}

/// Splits `input` into its parsed metadata block and the markdown body. A
/// document with neither block style yields empty metadata and the whole
/// input as the body.
fn split_frontmatter(input: &str) -> std::result::Result<(Frontmatter, &str), ErrorKind> {
    const FENCE: &str = "---";
    let input = input.trim_start_matches('\u{feff}');

    let mut lines = LineOffsets::new(input);
    match lines.next() {
        Some((_, first)) if first.trim_end() == FENCE => {
            let yaml_start = first.len();
            for (offset, line) in lines {
                if line.trim_end() == FENCE {
                    let yaml = &input[yaml_start..offset];
                    let frontmatter = if yaml.trim().is_empty() {
                        Frontmatter::default()
                    } else {
                        serde_yaml::from_str(yaml)?
                    };
                    return Ok((frontmatter, &input[offset + line.len()..]));
                }
            }
            Err(ErrorKind::FrontmatterMissingEndFence)
        }
        _ => {
            let (pairs, body_start) = meta_block(input);
            Ok((Frontmatter::from_meta_lines(&pairs), &input[body_start..]))
        }
    }
}

/// Reads a bare `key: value` block from the top of `input`. Returns the keys
/// with their value lines and the offset where the body starts.
fn meta_block(input: &str) -> (Vec<(&str, Vec<&str>)>, usize) {
    let mut pairs: Vec<(&str, Vec<&str>)> = Vec::new();
    for (offset, line) in LineOffsets::new(input) {
        let content = line.trim_end_matches(|c| c == '\n' || c == '\r');
        if content.trim().is_empty() {
            return (pairs, offset + line.len());
        }
        let is_continuation = content.starts_with("    ") || content.starts_with('\t');
        if is_continuation {
            if let Some((_, values)) = pairs.last_mut() {
                values.push(content.trim());
                continue;
            }
        }
        match meta_key_value(content) {
            Some((key, value)) => pairs.push((key, vec![value])),
            // Not metadata: the body starts here.
            None => return (pairs, offset),
        }
    }
    (pairs, input.len())
}

fn meta_key_value(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let key = &line[..colon];
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Some((key, line[colon + 1..].trim()))
    } else {
        None
    }
}

/// Iterates over the lines of a string (terminators included) together with
/// each line's byte offset.
struct LineOffsets<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> LineOffsets<'a> {
    fn new(input: &'a str) -> LineOffsets<'a> {
        LineOffsets { input, offset: 0 }
    }
}

impl<'a> Iterator for LineOffsets<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<(usize, &'a str)> {
        let rest = &self.input[self.offset..];
        if rest.is_empty() {
            return None;
        }
        let len = rest.find('\n').map_or(rest.len(), |i| i + 1);
        let start = self.offset;
        self.offset += len;
        Some((start, &rest[..len]))
    }
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`]. Always names the offending source.
#[derive(Debug, thiserror::Error)]
#[error("post `{source_id}`: {kind}")]
pub struct Error {
    pub source_id: String,

    #[source]
    pub kind: ErrorKind,
}

impl Error {
    fn new(source_id: &str, kind: ErrorKind) -> Error {
        Error {
            source_id: source_id.to_owned(),
            kind,
        }
    }
}

/// What went wrong with a post.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Returned when the source file can't be read.
    #[error("reading `{}`: {err}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned when the opening `---` fence is found but the closing one is
    /// missing.
    #[error("front matter is missing its closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the front matter as YAML.
    #[error("front matter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),

    #[error("missing required front-matter field `{0}`")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidDate(#[from] date::Error),

    /// Returned for tags that slugify to nothing and so can't name a page.
    #[error("tag {0:?} has no characters usable in a file name")]
    InvalidTag(String),

    #[error("{0}")]
    InvalidFileName(#[from] InvalidFileNameError),

    #[error("would overwrite `{permalink}`, already produced by post `{other}`")]
    DuplicatePermalink { permalink: String, other: String },
}
