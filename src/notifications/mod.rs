pub mod delivery;
pub mod error;
pub mod lark;
pub mod transport;

pub use delivery::CardDelivery;
pub use error::{NotifyError, NotifyResult};
pub use lark::LarkClient;
pub use transport::{ApiReply, CardTransport};
