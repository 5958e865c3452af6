pub mod auth_service;
pub mod contact_history_service;
pub mod customer_service;
pub mod deal_service;
pub mod guards;
pub mod health_service;
pub mod pipeline_service;
pub mod task_service;
