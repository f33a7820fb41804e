//! ario-core: Registry Query Facade
//!
//! Read-only access to the ar.io registry contract (gateways, ArNS names,
//! auctions, epochs, observers, distributions) as of the latest state, a
//! block height or a sort key.
//!
//! ```ignore
//! let ario = ArIo::from_config(&ArIoConfig::from_env())?;
//! let gateway = ario
//!     .get_gateway("1H7WZIWhzwTH9FIcnuMqYkTsoyv1OTfGa_amvuYwrgo", &EvaluationOptions::at_block_height(1_377_100))
//!     .await?;
//! ```

pub mod config;
pub mod contract_state;
pub mod epoch;
pub mod facade;
pub mod obs;
pub mod telemetry;

pub use config::ArIoConfig;
pub use contract_state::{
    ArNSRecord, Auction, AuctionSettings, EpochDistributions, EpochObservations, Gateway,
    GatewaySettings, GatewayStats, GatewayStatus, RegistrationType, RegistryState, ReservedName,
    VaultData, WalletAddress, WeightedObserver,
};
pub use epoch::{EpochInfo, EpochSchedule, EPOCH_BLOCK_LENGTH, EPOCH_DISTRIBUTION_DELAY};
pub use facade::ArIo;
pub use telemetry::{init_tracing, LogFormat, Logger, TelemetryError, TracingLogger};

pub use ario_state::{
    AbortController, AbortSignal, EvalTo, EvaluationOptions, EvaluationPoint, SortKey, StateError,
    StateResult, TransactionId, ValidationError,
};
