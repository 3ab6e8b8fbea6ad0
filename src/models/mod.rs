pub mod assessment;
pub mod attachment;

pub use assessment::{Assessment, Shift};
pub use attachment::{AttachmentType, InventoryRecord, Location, Transaction, TransactionType};
