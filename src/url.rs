//! URL and output-file-name derivation. Everything here is a pure function of
//! its arguments so that a post's location never depends on build order or
//! on other posts.

use crate::config::Layout;
use std::fmt;
use std::path::Path;
use url::Url;

const MARKDOWN_EXTENSION: &str = "md";
const HTML_EXTENSION: &str = "html";

/// The file name the feed is written to, relative to the output root and to
/// the site URL.
pub const FEED_FILE_NAME: &str = "feed.rss";

/// Where a post lands: the file name in its output directory and the
/// root-relative URL it is served from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Permalink {
    /// `<stem>.html`
    pub file_name: String,

    /// `/<stem>.html` for [`Layout::Root`], `/posts/<stem>.html` for
    /// [`Layout::Posts`].
    pub url: String,
}

impl Permalink {
    /// Derives the permalink for the post whose source identifier is
    /// `source_id` (e.g. `hello.md` or `drafts/hello.md`). Only the file stem
    /// is significant.
    pub fn new(source_id: &str, layout: Layout) -> Result<Permalink, InvalidFileNameError> {
        let stem = Path::new(source_id)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| InvalidFileNameError(source_id.to_owned()))?;

        let file_name = format!("{}.{}", stem, HTML_EXTENSION);
        let url = match layout.posts_directory() {
            Some(dir) => format!("/{}/{}", dir, file_name),
            None => format!("/{}", file_name),
        };
        Ok(Permalink { file_name, url })
    }

    /// Resolves the permalink against the site's base URL, yielding the
    /// absolute form used in the feed.
    pub fn absolute(&self, site_url: &Url) -> Result<Url, url::ParseError> {
        site_url.join(self.url.trim_start_matches('/'))
    }
}

/// Returns `url` with a trailing slash on its path, so that joining relative
/// paths onto it appends rather than replacing the last segment.
pub fn canonicalize(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// The absolute URL of the feed for a site rooted at `site_url`.
pub fn feed_url(site_url: &Url) -> Result<Url, url::ParseError> {
    site_url.join(FEED_FILE_NAME)
}

/// Rewrites intra-site links inside post bodies: a relative link to another
/// post's Markdown source (`other.md`, `./other.md#intro`) becomes that
/// post's permalink URL. Everything else passes through untouched.
pub struct Converter {
    layout: Layout,
}

impl Converter {
    pub fn new(layout: Layout) -> Converter {
        Converter { layout }
    }

    /// Converts a link destination. Returns `None` when the destination should
    /// be left as-is.
    pub fn convert(&self, destination: &str) -> Option<String> {
        if destination.is_empty()
            || destination.starts_with('/')
            || destination.starts_with('#')
            || Url::parse(destination).is_ok()
        {
            return None;
        }

        let (path, fragment) = match destination.find('#') {
            Some(i) => destination.split_at(i),
            None => (destination, ""),
        };
        let is_markdown = Path::new(path)
            .extension()
            .map_or(false, |ext| ext == MARKDOWN_EXTENSION);
        if !is_markdown {
            return None;
        }

        Permalink::new(path, self.layout)
            .ok()
            .map(|permalink| format!("{}{}", permalink.url, fragment))
    }
}

/// Returned when a source identifier has no usable UTF-8 file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFileNameError(pub String);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {}
