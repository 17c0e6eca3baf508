pub(crate) mod bios;
pub(crate) mod cache;
pub(crate) mod catalog;
pub(crate) mod config;
pub(crate) mod connection;
pub(crate) mod download;
pub(crate) mod scan;
pub(crate) mod sync;
