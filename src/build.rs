//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: discovering and parsing the
//! posts ([`crate::source`], [`crate::parser`]), rendering post, index, and
//! tag pages ([`crate::write`]), generating the RSS feed ([`crate::feed`]),
//! and copying the static source directory into the static output directory
//! ([`crate::assets`]).

use crate::assets::{self, Error as AssetsError};
use crate::config::Config;
use crate::feed::{self, Error as FeedError};
use crate::parser::{Error as ParseError, Parser as PostParser};
use crate::post::PostSet;
use crate::source::{self, Error as SourceError};
use crate::tag::TagIndex;
use crate::theme::{Error as ThemeError, Templates};
use crate::write::{Error as WriteError, Writer};
use std::io;
use std::path::{Path, PathBuf};

/// What a successful build produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// The number of post pages written.
    pub posts: usize,

    /// The number of tag pages written.
    pub tags: usize,

    /// The number of static files copied.
    pub assets: usize,
}

/// Builds the site described by a [`Config`]. Stages run strictly in order
/// and the first failure aborts the rest:
///
/// 1. create the output directories
/// 2. load the templates
/// 3. discover and parse every post, then sort them newest first
/// 4. write the post pages, the index page, and the tag pages
/// 5. write the feed
/// 6. copy the static assets
///
/// A site without posts is rejected with [`Error::EmptyPostSet`] before any
/// page is written.
pub fn build_site(config: &Config) -> Result<BuildSummary> {
    tracing::info!("Preparing output directories...");
    ensure_dir_exists(&config.output_directory)?;
    ensure_dir_exists(&config.posts_output_directory())?;
    ensure_dir_exists(&config.tags_output_directory())?;

    let templates = Templates::load(&config.templates_directory)?;

    tracing::info!("Parsing posts...");
    let sources = source::for_config(config).discover()?;
    let posts = PostSet::new(PostParser::new(config.layout).parse_all(&sources)?);
    if posts.is_empty() {
        return Err(Error::EmptyPostSet);
    }
    let tags = TagIndex::new(&posts);
    tracing::info!("Parsed {} posts with {} distinct tags", posts.len(), tags.len());

    let writer = Writer {
        templates: &templates,
        config,
    };
    tracing::info!("Generating posts...");
    let post_pages = writer.write_posts(&posts)?;
    tracing::info!("Generating index page...");
    writer.write_index(&posts)?;
    tracing::info!("Generating tag pages...");
    let tag_pages = writer.write_tags(&tags)?;

    tracing::info!("Generating feed...");
    feed::write_feed(&config.site, &posts, &config.feed_path())?;

    tracing::info!("Copying static files...");
    let copied = assets::copy_dir(
        &config.static_source_directory,
        &config.static_output_directory(),
        &config.output_directory,
    )?;

    Ok(BuildSummary {
        posts: post_pages,
        tags: tag_pages,
        assets: copied,
    })
}

fn ensure_dir_exists(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|err| Error::CreateDirectory {
        path: dir.to_owned(),
        err,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Each variant corresponds to the stage
/// that failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when an output directory can't be created.
    #[error("creating output directory `{}`: {err}", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned for errors reading or parsing the templates.
    #[error(transparent)]
    Theme(#[from] ThemeError),

    /// Returned when post sources can't be enumerated.
    #[error(transparent)]
    Discover(#[from] SourceError),

    /// Returned for invalid posts.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Returned when there are no posts to publish.
    #[error("no posts found; a site needs at least one post for its feed")]
    EmptyPostSet,

    /// Returned for errors writing pages to disk.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Returned for errors writing the feed.
    #[error(transparent)]
    Feed(FeedError),

    /// Returned for errors copying static files.
    #[error(transparent)]
    Assets(#[from] AssetsError),
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`], surfacing an empty post set as
    /// [`Error::EmptyPostSet`].
    fn from(err: FeedError) -> Error {
        match err {
            FeedError::EmptyPostSet => Error::EmptyPostSet,
            err => Error::Feed(err),
        }
    }
}
