//! The library code for the `scriptorium` static blog generator. A build is a
//! one-way pipeline:
//!
//! 1. Loading the configuration ([`crate::config`])
//! 2. Discovering post sources, either by scanning the posts directory or
//!    from the configuration's post manifest ([`crate::source`])
//! 3. Parsing each source's metadata block and markdown body into a
//!    [`post::Post`] ([`crate::parser`])
//! 4. Sorting the posts newest first into a [`post::PostSet`], which every
//!    later step reads and none modifies
//! 5. Writing post pages, the index page, and one page per tag
//!    ([`crate::write`]), then the RSS feed ([`crate::feed`])
//! 6. Copying the static assets ([`crate::assets`])
//!
//! [`build::build_site`] runs steps 2 through 6. Each build regenerates every
//! output file from its sources; nothing is cached between runs.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod assets;
pub mod build;
pub mod config;
pub mod date;
pub mod feed;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod source;
pub mod tag;
pub mod theme;
pub mod url;
pub mod value;
pub mod write;
