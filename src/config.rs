//! Loads and validates the project configuration. The configuration file is
//! decoded into a strictly-typed [`Project`] (unknown keys are rejected) and
//! then resolved into a [`Config`] with absolute directories, a canonical site
//! URL, and, when the project carries a post manifest, normalized manifest
//! entries.

use crate::date;
use crate::post::Metadata;
use crate::tag;
use crate::url::{self as urls, InvalidFileNameError, Permalink, FEED_FILE_NAME};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// The file names searched for, in order, by [`Config::from_directory`].
pub const CONFIG_FILE_NAMES: &[&str] = &["config.toml", "config.yaml", "config.yml"];

/// Where post pages live relative to the output root.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Posts are written next to `index.html` and served from `/<post>.html`.
    #[default]
    Root,

    /// Posts are written to `posts/` and served from `/posts/<post>.html`.
    Posts,
}

impl Layout {
    /// The subdirectory holding post pages, if any.
    pub fn posts_directory(self) -> Option<&'static str> {
        match self {
            Layout::Root => None,
            Layout::Posts => Some("posts"),
        }
    }
}

/// The on-disk shape of the configuration file.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,

    /// Alternative home for `title`, `description`, and `url`.
    site: Option<SiteSection>,

    #[serde(default)]
    layout: Layout,

    #[serde(default)]
    paths: Paths,

    /// The post manifest. When present, it replaces directory discovery.
    posts: Option<Vec<ManifestRecord>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SiteSection {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct Paths {
    posts: Option<PathBuf>,
    templates: Option<PathBuf>,
    #[serde(rename = "static")]
    static_files: Option<PathBuf>,
    output: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestRecord {
    source: String,
    #[serde(alias = "date")]
    published_at: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    title: Option<String>,
    description: Option<String>,
}

/// Site-wide settings available to every template and to the feed.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    pub title: String,
    pub description: String,

    /// The base URL, always ending in `/`.
    pub url: Url,

    /// `{url}feed.rss`
    pub feed_url: Url,
}

/// A normalized manifest entry: the post's source file plus the metadata the
/// manifest supplies for it.
#[derive(Clone, Debug, PartialEq)]
pub struct ManifestEntry {
    /// The `source` string exactly as written in the manifest.
    pub source_id: String,

    /// `source` resolved against the project root.
    pub path: PathBuf,

    pub permalink: Permalink,

    pub metadata: Metadata,
}

/// The resolved configuration for one build.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: Site,
    pub layout: Layout,

    /// The directory containing the configuration file. Relative paths in the
    /// file are resolved against it.
    pub root_directory: PathBuf,
    pub posts_source_directory: PathBuf,
    pub templates_directory: PathBuf,
    pub static_source_directory: PathBuf,
    pub output_directory: PathBuf,

    /// Present when the configuration file lists its posts explicitly.
    pub manifest: Option<Vec<ManifestEntry>>,
}

/// The serialization formats accepted for the configuration file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
}

impl Format {
    /// Picks the format from a file extension; anything but `.toml` is YAML.
    pub fn from_path(path: &Path) -> Format {
        match path.extension() {
            Some(ext) if ext == "toml" => Format::Toml,
            _ => Format::Yaml,
        }
    }
}

impl Config {
    /// Searches `dir` and then each of its ancestors for one of
    /// [`CONFIG_FILE_NAMES`] and loads the first one found. A relative `dir`
    /// is resolved against the working directory first, so `.` reaches its
    /// real parents.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let start = std::fs::canonicalize(dir).map_err(|_| Error::NotFound(dir.to_owned()))?;
        for candidate in start.ancestors() {
            for name in CONFIG_FILE_NAMES {
                let path = candidate.join(name);
                if path.is_file() {
                    return Config::from_file(&path, output_directory);
                }
            }
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    /// Loads the configuration file at `path`. `output_directory`, when given,
    /// overrides the `paths.output` setting.
    pub fn from_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let text = std::fs::read_to_string(path).map_err(|err| Error::Read {
            path: path.to_owned(),
            err,
        })?;
        let root = match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => Path::new("."),
        };
        Config::parse(&text, Format::from_path(path), root, output_directory).map_err(|err| {
            match err {
                Error::Decode { message, .. } => Error::Decode {
                    path: path.to_owned(),
                    message,
                },
                err => err,
            }
        })
    }

    /// Decodes and validates configuration text. Relative directories are
    /// resolved against `root`.
    pub fn parse(
        text: &str,
        format: Format,
        root: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let project: Project = match format {
            Format::Toml => toml::from_str(text).map_err(|e| decode_error(e.to_string()))?,
            Format::Yaml => serde_yaml::from_str(text).map_err(|e| decode_error(e.to_string()))?,
        };

        let site = resolve_site(&project)?;
        let layout = project.layout;
        let paths = project.paths;
        let dir = |configured: Option<PathBuf>, default: &str| {
            root.join(configured.unwrap_or_else(|| PathBuf::from(default)))
        };

        let manifest = match project.posts {
            None => None,
            Some(records) => Some(
                records
                    .into_iter()
                    .map(|record| normalize_manifest_record(record, root, layout))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        Ok(Config {
            site,
            layout,
            root_directory: root.to_owned(),
            posts_source_directory: dir(paths.posts, "posts"),
            templates_directory: dir(paths.templates, "templates"),
            static_source_directory: dir(paths.static_files, "static"),
            output_directory: match output_directory {
                Some(output) => output.to_owned(),
                None => dir(paths.output, "output"),
            },
            manifest,
        })
    }

    /// The directory post pages are written to.
    pub fn posts_output_directory(&self) -> PathBuf {
        match self.layout.posts_directory() {
            Some(sub) => self.output_directory.join(sub),
            None => self.output_directory.clone(),
        }
    }

    /// The directory tag pages are written to.
    pub fn tags_output_directory(&self) -> PathBuf {
        self.output_directory.join(crate::tag::TAGS_DIRECTORY)
    }

    /// The directory static assets are copied to.
    pub fn static_output_directory(&self) -> PathBuf {
        self.output_directory.join("static")
    }

    /// The path of the RSS feed.
    pub fn feed_path(&self) -> PathBuf {
        self.output_directory.join(FEED_FILE_NAME)
    }
}

fn decode_error(message: String) -> Error {
    Error::Decode {
        path: PathBuf::new(),
        message,
    }
}

fn resolve_site(project: &Project) -> Result<Site> {
    let top_level =
        project.title.is_some() || project.description.is_some() || project.url.is_some();
    let (title, description, url) = match &project.site {
        Some(_) if top_level => return Err(Error::AmbiguousSite),
        Some(site) => (&site.title, &site.description, &site.url),
        None => (&project.title, &project.description, &project.url),
    };

    let title = required(title, "title")?;
    let description = required(description, "description")?;
    let url = required(url, "url")?;

    let invalid = |reason: String| Error::InvalidUrl {
        value: url.clone(),
        reason,
    };
    let parsed = Url::parse(&url).map_err(|e| invalid(e.to_string()))?;
    if parsed.cannot_be_a_base() {
        return Err(invalid("not a hierarchical URL".to_owned()));
    }
    let url = urls::canonicalize(parsed);
    let feed_url = urls::feed_url(&url).map_err(|e| invalid(e.to_string()))?;

    Ok(Site {
        title,
        description,
        url,
        feed_url,
    })
}

fn required(value: &Option<String>, field: &'static str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_owned()),
        _ => Err(Error::MissingField(field)),
    }
}

fn normalize_manifest_record(
    record: ManifestRecord,
    root: &Path,
    layout: Layout,
) -> Result<ManifestEntry> {
    let permalink = Permalink::new(&record.source, layout).map_err(Error::ManifestSource)?;
    let published_at: Option<DateTime<Utc>> = match &record.published_at {
        None => None,
        Some(value) => Some(date::parse(value).map_err(|err| Error::ManifestDate {
            source_id: record.source.clone(),
            err,
        })?),
    };

    Ok(ManifestEntry {
        path: root.join(&record.source),
        permalink,
        metadata: Metadata {
            title: record.title,
            published_at,
            description: record.description,
            tags: Some(tag::normalize(record.tags)),
        },
        source_id: record.source,
    })
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a missing, unreadable, or invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "could not find {} in `{}` or any parent directory",
        CONFIG_FILE_NAMES.join(", "),
        .0.display()
    )]
    NotFound(PathBuf),

    #[error("reading configuration file `{}`: {err}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("decoding configuration file `{}`: {message}", .path.display())]
    Decode { path: PathBuf, message: String },

    #[error("missing required configuration field `{0}`")]
    MissingField(&'static str),

    #[error("site settings are given both at the top level and in the `site` table")]
    AmbiguousSite,

    #[error("invalid site url `{value}`: {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("manifest entry `{source_id}`: {err}")]
    ManifestDate {
        source_id: String,
        #[source]
        err: date::Error,
    },

    #[error("manifest entry: {0}")]
    ManifestSource(#[source] InvalidFileNameError),
}
