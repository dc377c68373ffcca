//! neutronote-web — browser front end for the neutroNote lab notebook.
//!
//! Serves the split-view timeline (create panel on the left, chronological
//! entries on the right), the reduced-data browsing API used by the create
//! panel, and the kernel control API.

pub mod config;
pub mod flash;
pub mod handlers;
pub mod router;
pub mod state;
pub mod templates;
