// Core promotion module - debounced tier-promotion announcements.

pub mod promotion_debouncer;
pub mod promotion_service;
pub mod template_registry;

pub use promotion_debouncer::PromotionDebouncer;
pub use promotion_service::*;
pub use template_registry::{Template, TemplateRegistry};
