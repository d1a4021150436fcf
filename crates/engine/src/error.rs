use cardsort_core::CoreError;
use cardsort_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("no catalog loaded")]
    NoCatalog,

    #[error("missing selection: {0}")]
    MissingSelection(String),

    #[error("set has no parallels: {set}")]
    NoParallels { set: String },

    #[error("no parallel selected")]
    MissingParallel,

    #[error("product not found: {0}")]
    UnknownProduct(String),

    #[error("set not found: {0}")]
    UnknownSet(String),

    #[error("card not found: {0}")]
    UnknownCard(String),

    #[error("parallel not available: {0}")]
    UnknownParallel(String),

    #[error("unknown {kind} tag: {name}")]
    UnknownTag { kind: String, name: String },

    #[error("quantity {quantity} outside 1..={max}")]
    InvalidQuantity { quantity: u32, max: u32 },

    #[error("session is {actual}, expected {expected}")]
    InvalidSessionState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("capture sheet belongs to a session that has ended")]
    StaleSessionCapture,

    #[error("nothing to export")]
    EmptyLedger,
}
