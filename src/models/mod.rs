//! Data models shared by the scanner, the catalog and the engines.

pub mod catalog;
pub mod config;
pub mod probe;
pub mod report;
pub mod scan;
