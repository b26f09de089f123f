//! `folio` - self-hosted single-page portfolio site
//!
//! The page content comes from a YAML site file. The interactive state of
//! every open page (active section, mobile menu, typewriter, cursor) lives
//! in a server-side [`view::PageView`]; a small page script forwards DOM
//! events to it and applies the state it returns. The same view engine can
//! be driven headlessly over NDJSON on stdin/stdout.

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod render;
pub mod server;
pub mod session;
pub mod transport;
pub mod view;
