pub mod analytics_service;
pub mod calendar;
pub mod draft_service;
pub mod lead_service;
pub mod mail;
pub mod product_service;
pub mod storage;
pub mod user_service;
pub mod username_service;
pub mod webinar_service;
