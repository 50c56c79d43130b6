pub mod bus;
pub mod types;

pub use crate::bus::{ChangeBus, ChangeSignal, ChangeSubscription};
pub use crate::types::{ChangeKind, ChangeNotification, Collection};
