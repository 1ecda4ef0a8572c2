//! Dashboard module
//!
//! Provides the overview page with monthly income, project counts, and the
//! recent activity feed.

mod cards;
mod handlers;
mod metrics;

pub use handlers::get_dashboard_page;
