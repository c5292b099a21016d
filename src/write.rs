use crate::config::Config;
use crate::post::PostSet;
use crate::tag::TagIndex;
use crate::theme::Templates;
use crate::value;
use gtmpl::{Context, Template, Value};
use std::io;
use std::path::{Path, PathBuf};

/// Responsible for templating and writing the HTML pages of a site: one page
/// per post, the main index, and one index page per tag. Every write
/// overwrites whatever was there before.
pub struct Writer<'a> {
    /// The parsed page templates.
    pub templates: &'a Templates,

    /// The resolved site configuration. Supplies the site settings handed to
    /// every template and the output directories.
    pub config: &'a Config,
}

impl Writer<'_> {
    /// Writes one page per post using the post template. Returns the number
    /// of pages written.
    pub fn write_posts(&self, posts: &PostSet) -> Result<usize> {
        let directory = self.config.posts_output_directory();
        for post in posts.iter() {
            self.write_page(
                &self.templates.post,
                value::post_page(&self.config.site, post),
                &directory.join(&post.permalink.file_name),
            )?;
        }
        Ok(posts.len())
    }

    /// Writes the main index page, listing every post newest first.
    pub fn write_index(&self, posts: &PostSet) -> Result<()> {
        let site = &self.config.site;
        self.write_page(
            &self.templates.index,
            value::index_page(site, &site.title, &site.description, None, posts.iter()),
            &self.config.output_directory.join("index.html"),
        )
    }

    /// Writes one index page per tag using the index template. Returns the
    /// number of pages written.
    pub fn write_tags(&self, tags: &TagIndex) -> Result<usize> {
        let directory = self.config.tags_output_directory();
        for group in tags.iter() {
            let title = format!("Posts tagged \"{}\"", group.tag.name);
            self.write_page(
                &self.templates.index,
                value::index_page(
                    &self.config.site,
                    &title,
                    &title,
                    Some(group.tag),
                    group.posts.iter().copied(),
                ),
                &directory.join(group.tag.file_name()),
            )?;
        }
        Ok(tags.len())
    }

    /// Applies `template` to `value` and writes the result to `path`,
    /// creating the parent directory if needed.
    fn write_page(&self, template: &Template, value: Value, path: &Path) -> Result<()> {
        let template_error = |message: String| Error::Template {
            path: path.to_owned(),
            message,
        };
        let context = Context::from(value).map_err(|e| template_error(e.to_string()))?;
        let html = template
            .render(&context)
            .map_err(|e| template_error(e.to_string()))?;

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|err| Error::Io {
                path: dir.to_owned(),
                err,
            })?;
        }
        std::fs::write(path, html).map_err(|err| Error::Io {
            path: path.to_owned(),
            err,
        })?;
        tracing::debug!("wrote {}", path.display());
        Ok(())
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error during templating.
    #[error("rendering `{}`: {message}", .path.display())]
    Template { path: PathBuf, message: String },

    /// An error writing the output files.
    #[error("writing `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Format;
    use crate::post::test::post;
    use std::fs;

    const POST: &str = "<h1>{{.post.title}}</h1>{{.post.html}}<footer>{{.site.title}}</footer>";
    const INDEX: &str = "<h1>{{.title}}</h1><ul>{{range .posts}}<li><a href=\"{{.url}}\">{{.title}}</a></li>{{end}}</ul>";

    fn config(output: &Path, layout: &str) -> Config {
        Config::parse(
            &format!(
                "title = \"Blog & Co\"\ndescription = \"D\"\nurl = \"https://ex.com/\"\nlayout = \"{}\"\n",
                layout
            ),
            Format::Toml,
            Path::new("/unused"),
            Some(output),
        )
        .unwrap()
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_write_posts_in_posts_layout() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "posts");
        let templates = Templates::from_sources(POST, INDEX).unwrap();
        let posts = PostSet::new(vec![post("hello.md", "2023-01-01", &[])]);

        let writer = Writer {
            templates: &templates,
            config: &config,
        };
        assert_eq!(1, writer.write_posts(&posts)?);
        assert_eq!(
            "<h1>HELLO.MD</h1><p>hello.md</p><footer>Blog &amp; Co</footer>",
            read(dir.path().join("posts").join("hello.html"))
        );
        Ok(())
    }

    #[test]
    fn test_write_index_and_tags() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), "root");
        let templates = Templates::from_sources(POST, INDEX).unwrap();
        let posts = PostSet::new(vec![
            post("old.md", "2023-01-01", &["go"]),
            post("new.md", "2023-02-01", &[]),
        ]);

        let writer = Writer {
            templates: &templates,
            config: &config,
        };
        writer.write_index(&posts)?;
        assert_eq!(
            "<h1>Blog &amp; Co</h1><ul><li><a href=\"/new.html\">NEW.MD</a></li><li><a href=\"/old.html\">OLD.MD</a></li></ul>",
            read(dir.path().join("index.html"))
        );

        assert_eq!(1, writer.write_tags(&TagIndex::new(&posts))?);
        assert_eq!(
            "<h1>Posts tagged &quot;go&quot;</h1><ul><li><a href=\"/old.html\">OLD.MD</a></li></ul>",
            read(dir.path().join("tags").join("go.html"))
        );
        Ok(())
    }
}
