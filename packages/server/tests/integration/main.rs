mod common;

mod api;
mod feed;
mod ingest;
