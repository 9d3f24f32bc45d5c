//! HTTP API handlers
//!
//! Each submodule exposes a `*_routes()` builder merged by `build_router`.

pub mod calendar;
pub mod daily_sessions;
pub mod events;
pub mod external_crm;
pub mod health;
pub mod prospection;
pub mod scheduling;
pub mod subcollections;
pub mod suggestions;

pub use calendar::calendar_routes;
pub use daily_sessions::daily_session_routes;
pub use events::event_routes;
pub use external_crm::external_crm_routes;
pub use health::health_routes;
pub use prospection::prospection_routes;
pub use scheduling::scheduling_routes;
pub use subcollections::subcollection_routes;
pub use suggestions::suggestion_routes;
