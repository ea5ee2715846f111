pub mod adjustment_service;
pub mod auth;
pub mod crm_service;
pub mod dashboard_service;
pub mod operation_service;
pub mod receivables_service;
