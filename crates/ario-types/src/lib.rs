//! ario-types: Validated Values for the ar.io Registry Client
//!
//! Every cache lookup and every historical pin depends on the exact textual
//! and ordering semantics of the values defined here, so each of them is
//! correct by construction.
//!
//! ## Key Components
//!
//! - `TransactionId`: 43-character Arweave transaction id (contract address)
//! - `SortKey`: order-preserving position of an interaction in a contract log
//! - `EvaluationOptions` / `EvaluationPoint`: latest, block height or sort key

pub mod error;
pub mod evaluation;
pub mod sort_key;
pub mod transaction_id;

pub use error::{Result, ValidationError};
pub use evaluation::{EvalTo, EvaluationOptions, EvaluationPoint};
pub use sort_key::SortKey;
pub use transaction_id::{TransactionId, ARWEAVE_TX_PATTERN};
