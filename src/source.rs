//! Post discovery. A [`Discover`] implementation decides *which* documents make
//! up the site and in what order; everything from parsing onward is shared.
//! Two strategies exist: scanning the posts directory ([`DirectorySource`])
//! and reading the configuration's post manifest ([`ManifestSource`]).

use crate::config::{Config, ManifestEntry};
use crate::post::Metadata;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";

/// One post source document awaiting parsing.
#[derive(Clone, Debug, PartialEq)]
pub struct Source {
    /// The stable identifier of the document; see [`crate::post::Post::source_id`].
    pub id: String,

    /// Where to read the document from.
    pub path: PathBuf,

    /// Metadata supplied from outside the document. It takes precedence over
    /// the document's own front matter.
    pub overrides: Metadata,
}

/// Produces the ordered list of post sources for a build.
pub trait Discover {
    fn discover(&self) -> Result<Vec<Source>>;
}

/// Picks the discovery strategy for `config`: the manifest when the
/// configuration carries one, the posts directory otherwise.
pub fn for_config(config: &Config) -> Box<dyn Discover + '_> {
    match &config.manifest {
        Some(entries) => Box::new(ManifestSource::new(entries)),
        None => Box::new(DirectorySource::new(&config.posts_source_directory)),
    }
}

/// Discovers every `*.md` file directly inside a directory. Files are
/// returned in file-name order so discovery order doesn't depend on the
/// file system.
pub struct DirectorySource<'a> {
    directory: &'a Path,
}

impl<'a> DirectorySource<'a> {
    pub fn new(directory: &'a Path) -> DirectorySource<'a> {
        DirectorySource { directory }
    }
}

impl Discover for DirectorySource<'_> {
    fn discover(&self) -> Result<Vec<Source>> {
        let mut sources = Vec::new();
        for result in WalkDir::new(self.directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = result.map_err(|err| Error::ListDirectory {
                path: self.directory.to_owned(),
                err,
            })?;
            let path = entry.path();
            let is_markdown = path
                .extension()
                .map_or(false, |ext| ext == MARKDOWN_EXTENSION);
            if !entry.file_type().is_file() || !is_markdown {
                continue;
            }

            let id = entry
                .file_name()
                .to_str()
                .ok_or_else(|| Error::NonUtf8FileName(path.to_owned()))?
                .to_owned();
            sources.push(Source {
                id,
                path: path.to_owned(),
                overrides: Metadata::default(),
            });
        }
        Ok(sources)
    }
}

/// Discovers the posts listed in the configuration's manifest, in manifest
/// order.
pub struct ManifestSource<'a> {
    entries: &'a [ManifestEntry],
}

impl<'a> ManifestSource<'a> {
    pub fn new(entries: &'a [ManifestEntry]) -> ManifestSource<'a> {
        ManifestSource { entries }
    }
}

impl Discover for ManifestSource<'_> {
    fn discover(&self) -> Result<Vec<Source>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| Source {
                id: entry.source_id.clone(),
                path: entry.path.clone(),
                overrides: entry.metadata.clone(),
            })
            .collect())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to enumerate post sources.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("listing posts directory `{}`: {err}", .path.display())]
    ListDirectory {
        path: PathBuf,
        #[source]
        err: walkdir::Error,
    },

    #[error("post file name {0:?} is not valid UTF-8")]
    NonUtf8FileName(PathBuf),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Layout;
    use crate::url::Permalink;
    use std::fs;

    #[test]
    fn test_directory_source_lists_markdown_in_name_order() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "").unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested.md")).unwrap();
        fs::write(dir.path().join("nested.md").join("c.md"), "").unwrap();

        let sources = DirectorySource::new(dir.path()).discover()?;
        let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(vec!["a.md", "b.md"], ids);
        assert_eq!(dir.path().join("a.md"), sources[0].path);
        assert_eq!(Metadata::default(), sources[0].overrides);
        Ok(())
    }

    #[test]
    fn test_directory_source_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("posts");
        match DirectorySource::new(&missing).discover() {
            Err(Error::ListDirectory { path, .. }) => assert_eq!(missing, path),
            other => panic!("expected a listing error, got {:?}", other),
        }
    }

    #[test]
    fn test_manifest_source_keeps_manifest_order_and_metadata() -> Result<()> {
        let entry = |source: &str, title: &str| ManifestEntry {
            source_id: source.to_owned(),
            path: PathBuf::from("/project").join(source),
            permalink: Permalink::new(source, Layout::Root).unwrap(),
            metadata: Metadata {
                title: Some(title.to_owned()),
                ..Metadata::default()
            },
        };
        let entries = vec![entry("z.md", "Zed"), entry("a.md", "Ay")];

        let sources = ManifestSource::new(&entries).discover()?;
        let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(vec!["z.md", "a.md"], ids);
        assert_eq!(Some("Zed".to_owned()), sources[0].overrides.title);
        assert_eq!(PathBuf::from("/project/a.md"), sources[1].path);
        Ok(())
    }
}
