//! ccrm-tools library - offline data preparation and store maintenance
//!
//! The pipeline for bringing an external export into the CRM is:
//! `clean` (raw export to cleaned records), `prepare-import` (wrap as the
//! import body), optionally `extract-single` for a dry run, then `push`.

pub mod cleaning;
pub mod maintenance;
pub mod push;
pub mod staging;
