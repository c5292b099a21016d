use crate::url::Converter as LinkConverter;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Converts a post's markdown body to HTML. Relative links to other posts'
/// markdown sources are rewritten to those posts' permalinks by
/// `link_converter`.
pub fn to_html(markdown: &str, link_converter: &LinkConverter) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let event_converter = EventConverter { link_converter };
    let mut body = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(
        &mut body,
        Parser::new_ext(markdown, options).map(|ev| event_converter.convert(ev)),
    );
    body
}

struct EventConverter<'a> {
    link_converter: &'a LinkConverter,
}

impl<'a> EventConverter<'a> {
    fn convert_tag<'b>(&self, tag: Tag<'b>) -> Tag<'b> {
        match tag {
            // Links from one post to another are written against the source
            // tree (`other.md`) and must point at the output (`/other.html`).
            Tag::Link(link_type, url, title) => match self.link_converter.convert(&url) {
                Some(converted) => {
                    Tag::Link(link_type, CowStr::Boxed(converted.into_boxed_str()), title)
                }
                None => Tag::Link(link_type, url, title),
            },
            _ => tag,
        }
    }

    fn convert<'b>(&self, ev: Event<'b>) -> Event<'b> {
        match ev {
            Event::Start(tag) => Event::Start(self.convert_tag(tag)),
            Event::End(tag) => Event::End(self.convert_tag(tag)),
            _ => ev,
        }
    }
}
