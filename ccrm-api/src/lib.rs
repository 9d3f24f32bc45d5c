//! ccrm-api library - HTTP service for the call-center CRM
//!
//! Route handlers are thin adapters: they validate the request body, call a
//! service from `services`, and wrap the result in the JSON envelope.

use axum::Router;
use ccrm_common::config::{DuplicatePolicy, SchedulingConfig};
use ccrm_common::events::EventBus;
use ccrm_common::models::SessionChannel;
use ccrm_common::DocumentStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod extract;
pub mod services;

pub use error::{ApiError, ApiResult};

use services::{
    CalendarService, ContactService, DailySessionService, DuplicateDetectionService,
    ExternalCrmService, ProspectionService, SchedulingService, StepService, SuggestionService,
};

/// Default broadcast capacity of the event bus
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Document store handle (opened once by main)
    pub store: DocumentStore,
    /// Event bus feeding `/api/events`
    pub events: EventBus,
    pub duplicates: DuplicatePolicy,
    pub scheduling: SchedulingConfig,
}

impl AppState {
    /// Create new application state with default policies
    pub fn new(store: DocumentStore, events: EventBus) -> Self {
        Self {
            store,
            events,
            duplicates: DuplicatePolicy::default(),
            scheduling: SchedulingConfig::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn with_scheduling(mut self, config: SchedulingConfig) -> Self {
        self.scheduling = config;
        self
    }

    pub fn external_crm(&self) -> ExternalCrmService {
        ExternalCrmService::new(self.store.clone(), self.events.clone(), self.duplicates.clone())
    }

    pub fn duplicate_detection(&self) -> DuplicateDetectionService {
        DuplicateDetectionService::new(self.store.clone(), self.duplicates.clone())
    }

    pub fn suggestions(&self) -> SuggestionService {
        SuggestionService::new(self.store.clone(), self.events.clone())
    }

    pub fn daily_sessions(&self, channel: SessionChannel) -> DailySessionService {
        DailySessionService::new(self.store.clone(), self.events.clone(), channel)
    }

    pub fn prospection(&self) -> ProspectionService {
        ProspectionService::new(self.store.clone())
    }

    pub fn contacts(&self) -> ContactService {
        ContactService::new(self.store.clone())
    }

    pub fn steps(&self) -> StepService {
        StepService::new(self.store.clone(), self.events.clone())
    }

    pub fn calendar(&self) -> CalendarService {
        CalendarService::new(self.store.clone())
    }

    pub fn scheduling_service(&self) -> SchedulingService {
        SchedulingService::new(self.store.clone(), self.events.clone(), self.scheduling.clone())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::event_routes())
        .merge(api::external_crm_routes())
        .merge(api::suggestion_routes())
        .merge(api::daily_session_routes())
        .merge(api::prospection_routes())
        .merge(api::subcollection_routes())
        .merge(api::calendar_routes())
        .merge(api::scheduling_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
