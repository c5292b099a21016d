//! Loading of the page templates. [`Templates`] is built once per build and
//! handed to the [`crate::write::Writer`] explicitly, so separate builds (and
//! tests) never share template state.

use gtmpl::Template;
use std::io;
use std::path::{Path, PathBuf};

/// Renders single post pages.
pub const POST_TEMPLATE: &str = "post.html";

/// Renders the main index and every tag page.
pub const INDEX_TEMPLATE: &str = "index.html";

/// Optional shared definitions (`{{define "..."}}` blocks) prepended to both
/// page templates.
pub const BASE_TEMPLATE: &str = "base.html";

/// The parsed page templates.
pub struct Templates {
    pub post: Template,
    pub index: Template,
}

impl Templates {
    /// Loads `post.html` and `index.html` from `dir`, each prefixed with
    /// `base.html` when that file exists.
    pub fn load(dir: &Path) -> Result<Templates> {
        let base = dir.join(BASE_TEMPLATE);
        let with_base = |name: &str| -> Vec<PathBuf> {
            let mut files = Vec::with_capacity(2);
            if base.is_file() {
                files.push(base.clone());
            }
            files.push(dir.join(name));
            files
        };

        Ok(Templates {
            post: parse_template(POST_TEMPLATE, with_base(POST_TEMPLATE).iter())?,
            index: parse_template(INDEX_TEMPLATE, with_base(INDEX_TEMPLATE).iter())?,
        })
    }

    /// Builds templates from in-memory sources.
    pub fn from_sources(post: &str, index: &str) -> Result<Templates> {
        Ok(Templates {
            post: parse_source(POST_TEMPLATE, post)?,
            index: parse_source(INDEX_TEMPLATE, index)?,
        })
    }
}

// Loads the template file contents, concatenates them, and parses the result
// into a single template.
fn parse_template<P: AsRef<Path>>(
    name: &str,
    template_files: impl Iterator<Item = P>,
) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        let template_file = template_file.as_ref();
        let text = std::fs::read_to_string(template_file).map_err(|err| Error::OpenTemplateFile {
            path: template_file.to_owned(),
            err,
        })?;
        contents.push_str(&text);
        contents.push(' ');
    }
    parse_source(name, &contents)
}

fn parse_source(name: &str, contents: &str) -> Result<Template> {
    let mut template = Template::default();
    template
        .parse(contents)
        .map_err(|e| Error::ParseTemplate {
            name: name.to_owned(),
            message: e.to_string(),
        })?;
    Ok(template)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a template that couldn't be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("opening template file `{}`: {err}", .path.display())]
    OpenTemplateFile {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("parsing template `{name}`: {message}")]
    ParseTemplate { name: String, message: String },
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_missing_template_names_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(POST_TEMPLATE), "{{.post.title}}").unwrap();
        match Templates::load(dir.path()) {
            Err(Error::OpenTemplateFile { path, .. }) => {
                assert_eq!(dir.path().join(INDEX_TEMPLATE), path)
            }
            Err(err) => panic!("expected a missing index template, got {}", err),
            Ok(_) => panic!("expected a missing index template"),
        }
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Templates::from_sources("{{.post.title", "ok"),
            Err(Error::ParseTemplate { .. })
        ));
    }
}
