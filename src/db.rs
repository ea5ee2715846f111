pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod operations_repo;
pub use operations_repo::OperationsRepository;
pub mod ledger_repo;
pub use ledger_repo::LedgerRepository;
pub mod adjustment_repo;
pub use adjustment_repo::AdjustmentRepository;

pub mod receivables_store;
pub use receivables_store::{PgReceivablesStore, ReceivablesStore};

#[cfg(test)]
pub mod mock_store;
#[cfg(test)]
pub use mock_store::MockReceivablesStore;
