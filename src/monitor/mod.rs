pub mod change_detector;
pub mod history;
pub mod models;
pub mod scheduler;
pub mod source;
pub mod store;

pub use models::{
    CheckOutcome, CheckReport, CheckTrigger, ConfigPatch, DeliveryStatus, MonitorConfig,
    MonitorStatus, NotifierKind, RoundKey, RoundRecord, SchedulerState,
};
pub use scheduler::{MonitorError, MonitorScheduler};
pub use source::{FetchError, HttpRoundSource, RoundSource};
pub use store::{ConfigStore, SeenStateStore, StoreError};
