//! Conversions from site data into template [`Value`]s. Text that came from
//! configuration or front matter is HTML-escaped on the way in because the
//! template engine prints strings verbatim; post bodies are already HTML and
//! pass through untouched.

use crate::config::Site;
use crate::date;
use crate::post::Post;
use crate::tag::Tag;
use gtmpl::Value;
use pulldown_cmark::escape::escape_html;
use std::collections::HashMap;

/// HTML-escapes `text` for use in element content or a quoted attribute.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a `String` can't fail.
    let _ = escape_html(&mut escaped, text);
    escaped
}

fn text(s: &str) -> Value {
    Value::String(escape(s))
}

fn trusted(s: &str) -> Value {
    Value::String(s.to_owned())
}

impl From<&Site> for Value {
    /// Converts the [`Site`] settings into an object with fields `title`,
    /// `description`, `url`, and `feed_url`.
    fn from(site: &Site) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), text(&site.title));
        m.insert("description".to_owned(), text(&site.description));
        m.insert("url".to_owned(), text(site.url.as_str()));
        m.insert("feed_url".to_owned(), text(site.feed_url.as_str()));
        Value::Object(m)
    }
}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into objects with fields `name`, `slug`, and `url`.
    fn from(t: &Tag) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), text(&t.name));
        m.insert("slug".to_owned(), text(&t.slug));
        m.insert("url".to_owned(), text(&t.url()));
        Value::Object(m)
    }
}

impl From<&Post> for Value {
    /// Converts a [`Post`] into an object. `html` holds the full body and
    /// `summary` the part above the fold; both are raw HTML. `date` is the
    /// RFC-3339 timestamp, `published` the human-readable one, and
    /// `description` is nil when the post has none.
    fn from(post: &Post) -> Value {
        let (summary, summarized) = post.summary();

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("title".to_owned(), text(&post.title));
        m.insert("date".to_owned(), trusted(&date::to_rfc3339(&post.published_at)));
        m.insert("published".to_owned(), trusted(&date::to_display(&post.published_at)));
        m.insert(
            "description".to_owned(),
            match &post.description {
                Some(description) => text(description),
                None => Value::Nil,
            },
        );
        m.insert(
            "tags".to_owned(),
            Value::Array(post.tags.iter().map(Value::from).collect()),
        );
        m.insert("url".to_owned(), text(&post.permalink.url));
        m.insert("file_name".to_owned(), text(&post.permalink.file_name));
        m.insert("html".to_owned(), trusted(&post.body));
        m.insert("summary".to_owned(), trusted(summary));
        m.insert("summarized".to_owned(), Value::Bool(summarized));
        Value::Object(m)
    }
}

/// The data for a post page: `post` and `site`.
pub fn post_page(site: &Site, post: &Post) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("post".to_owned(), Value::from(post));
    m.insert("site".to_owned(), Value::from(site));
    Value::Object(m)
}

/// The data for an index page (the main index or a tag page): `title`,
/// `description`, `feed_url`, `posts`, `site`, and `tag` (nil on the main
/// index).
pub fn index_page<'a>(
    site: &Site,
    title: &str,
    description: &str,
    tag: Option<&Tag>,
    posts: impl Iterator<Item = &'a Post>,
) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), text(title));
    m.insert("description".to_owned(), text(description));
    m.insert("feed_url".to_owned(), text(site.feed_url.as_str()));
    m.insert("posts".to_owned(), Value::Array(posts.map(Value::from).collect()));
    m.insert("site".to_owned(), Value::from(site));
    m.insert(
        "tag".to_owned(),
        match tag {
            Some(tag) => Value::from(tag),
            None => Value::Nil,
        },
    );
    Value::Object(m)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test::post;

    fn field<'v>(value: &'v Value, key: &str) -> &'v Value {
        match value {
            Value::Object(m) => &m[key],
            _ => panic!("not an object"),
        }
    }

    fn string(value: &Value) -> &str {
        match value {
            Value::String(s) => s,
            _ => panic!("not a string"),
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            "Tom &amp; &quot;Jerry&quot; &lt;3",
            escape("Tom & \"Jerry\" <3")
        );
    }

    #[test]
    fn test_post_text_is_escaped_but_body_is_not() {
        let mut p = post("p.md", "2023-02-01", &["c&c"]);
        p.title = "<script>".to_owned();
        p.body = "<p>fine</p>".to_owned();
        let value = Value::from(&p);

        assert_eq!("&lt;script&gt;", string(field(&value, "title")));
        assert_eq!("<p>fine</p>", string(field(&value, "html")));
        assert_eq!("2023-02-01T00:00:00Z", string(field(&value, "date")));
        assert_eq!("February 1, 2023", string(field(&value, "published")));
        assert!(matches!(field(&value, "description"), Value::Nil));
        match field(&value, "tags") {
            Value::Array(tags) => {
                assert_eq!("c&amp;c", string(field(&tags[0], "name")));
                assert_eq!("/tags/c-c.html", string(field(&tags[0], "url")));
            }
            _ => panic!("tags should be an array"),
        }
    }

    #[test]
    fn test_index_page_keeps_post_order() {
        let posts = vec![
            post("new.md", "2023-02-01", &[]),
            post("old.md", "2023-01-01", &[]),
        ];
        let site = Site {
            title: "Blog".to_owned(),
            description: "D".to_owned(),
            url: url::Url::parse("https://ex.com/").unwrap(),
            feed_url: url::Url::parse("https://ex.com/feed.rss").unwrap(),
        };
        let value = index_page(&site, "Blog", "D", None, posts.iter());

        assert_eq!("https://ex.com/feed.rss", string(field(&value, "feed_url")));
        assert!(matches!(field(&value, "tag"), Value::Nil));
        match field(&value, "posts") {
            Value::Array(items) => {
                let urls: Vec<&str> = items.iter().map(|i| string(field(i, "url"))).collect();
                assert_eq!(vec!["/new.html", "/old.html"], urls);
            }
            _ => panic!("posts should be an array"),
        }
    }
}
