//! Collection names

pub const CALL_CENTERS: &str = "callCenters";
pub const PROSPECTS: &str = "prospects";
pub const SUGGESTIONS: &str = "suggestions";
pub const DAILY_CALL_SESSIONS: &str = "dailyCallSessions";
pub const DAILY_WHATSAPP_SESSIONS: &str = "dailyWhatsAppSessions";
pub const CALENDAR_EVENTS: &str = "calendarEvents";
pub const SCHEDULED_TASKS: &str = "scheduledTasks";

/// Subcollection names under call centers and prospects
pub const CONTACTS: &str = "contacts";
pub const STEPS: &str = "steps";
pub const CALLS: &str = "calls";
