//! Support for creating RSS feeds from a [`PostSet`].

use crate::config::Site;
use crate::date;
use crate::post::PostSet;
use rss::extension::atom::{AtomExtension, Link};
use rss::{CategoryBuilder, Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use std::io;
use std::path::{Path, PathBuf};

const GENERATOR: &str = concat!("scriptorium ", env!("CARGO_PKG_VERSION"));

/// Creates the feed for `posts` and writes it to `path`.
pub fn write_feed(site: &Site, posts: &PostSet, path: &Path) -> Result<()> {
    let xml = feed(site, posts)?.to_string();
    std::fs::write(path, xml).map_err(|err| Error::Io {
        path: path.to_owned(),
        err,
    })
}

/// Builds the RSS channel. The channel's `pubDate` and `lastBuildDate` are
/// the publication date of the newest post, so the feed only changes when the
/// content does. The channel links to its own location with an
/// `atom:link rel="self"`. Fails with [`Error::EmptyPostSet`] when there are
/// no posts to take that date from.
pub fn feed(site: &Site, posts: &PostSet) -> Result<Channel> {
    let newest = posts.newest().ok_or(Error::EmptyPostSet)?;
    let last_pub_date = date::to_rfc3339(&newest.published_at);

    Ok(ChannelBuilder::default()
        .title(site.title.clone())
        .link(site.url.to_string())
        .description(site.description.clone())
        .pub_date(Some(last_pub_date.clone()))
        .last_build_date(Some(last_pub_date))
        .generator(Some(GENERATOR.to_owned()))
        .atom_ext(Some(self_link(site)))
        .items(feed_items(site, posts)?)
        .build())
}

fn self_link(site: &Site) -> AtomExtension {
    let mut link = Link::default();
    link.set_href(site.feed_url.to_string());
    link.set_rel("self");
    link.set_mime_type(Some("application/rss+xml".to_owned()));

    let mut atom = AtomExtension::default();
    atom.set_links(vec![link]);
    atom
}

fn feed_items(site: &Site, posts: &PostSet) -> Result<Vec<Item>> {
    let mut items: Vec<Item> = Vec::with_capacity(posts.len());

    for post in posts.iter() {
        let link = post
            .permalink
            .absolute(&site.url)
            .map_err(|err| Error::Url {
                source_id: post.source_id.clone(),
                err,
            })?
            .to_string();

        items.push(
            ItemBuilder::default()
                .title(Some(post.title.clone()))
                .link(Some(link.clone()))
                .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
                .description(post.description.clone())
                .pub_date(Some(date::to_rfc3339(&post.published_at)))
                .categories(
                    post.tags
                        .iter()
                        .map(|tag| CategoryBuilder::default().name(tag.name.clone()).build())
                        .collect::<Vec<_>>(),
                )
                .build(),
        );
    }
    Ok(items)
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when there are no posts: the feed's freshness date is the
    /// newest post's date, which doesn't exist.
    #[error("the feed needs at least one post to take its publication date from")]
    EmptyPostSet,

    /// Returned when a post's permalink can't be made absolute.
    #[error("building the feed link for post `{source_id}`: {err}")]
    Url {
        source_id: String,
        #[source]
        err: url::ParseError,
    },

    /// Returned when the feed file can't be written.
    #[error("writing feed `{}`: {err}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::post;
    use url::Url;

    fn site() -> Site {
        Site {
            title: "Blog".to_owned(),
            description: "D".to_owned(),
            url: Url::parse("https://ex.com/").unwrap(),
            feed_url: Url::parse("https://ex.com/feed.rss").unwrap(),
        }
    }

    #[test]
    fn test_freshness_is_newest_post() -> Result<()> {
        let posts = PostSet::new(vec![
            post("jan.md", "2023-01-01", &["go"]),
            post("feb.md", "2023-02-01", &[]),
        ]);
        let channel = feed(&site(), &posts)?;

        assert_eq!(Some("2023-02-01T00:00:00Z"), channel.last_build_date());
        assert_eq!(Some("2023-02-01T00:00:00Z"), channel.pub_date());
        assert_eq!("https://ex.com/", channel.link());

        let links: Vec<Option<&str>> = channel.items().iter().map(|i| i.link()).collect();
        assert_eq!(
            vec![Some("https://ex.com/feb.html"), Some("https://ex.com/jan.html")],
            links
        );
        assert_eq!(Some("2023-01-01T00:00:00Z"), channel.items()[1].pub_date());
        assert_eq!("go", channel.items()[1].categories()[0].name());
        Ok(())
    }

    #[test]
    fn test_self_link() -> Result<()> {
        let channel = feed(&site(), &PostSet::new(vec![post("a.md", "2023-01-01", &[])]))?;
        let links = channel.atom_ext().map(|atom| atom.links()).unwrap_or_default();
        assert_eq!(1, links.len());
        assert_eq!("https://ex.com/feed.rss", links[0].href());
        assert_eq!("self", links[0].rel());

        let xml = channel.to_string();
        assert!(xml.contains("atom:link"));
        assert!(xml.contains("href=\"https://ex.com/feed.rss\""));
        Ok(())
    }

    #[test]
    fn test_empty_post_set() {
        assert!(matches!(
            feed(&site(), &PostSet::new(Vec::new())),
            Err(Error::EmptyPostSet)
        ));
    }

    #[test]
    fn test_xml_shape() -> Result<()> {
        let mut p = post("a.md", "2023-03-04T05:06:07+01:00", &[]);
        p.title = "Fish & Chips".to_owned();
        p.description = Some("Tasty".to_owned());
        let xml = feed(&site(), &PostSet::new(vec![p]))?.to_string();

        assert!(xml.contains("<rss version=\"2.0\""));
        assert!(xml.contains("<lastBuildDate>2023-03-04T04:06:07Z</lastBuildDate>"));
        assert!(xml.contains("<title>Fish &amp; Chips</title>"));
        assert!(xml.contains("Tasty"));
        Ok(())
    }

    #[test]
    fn test_write_feed() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.rss");
        write_feed(&site(), &PostSet::new(vec![post("a.md", "2023-01-01", &[])]), &path)?;
        assert!(std::fs::read_to_string(&path).unwrap().contains("<item>"));
        Ok(())
    }
}
