pub mod message;
pub mod room;
pub mod seller;

pub use message::{Message, MessageDto, MessageKind};
pub use room::{Room, RoomDto, RoomStatus};
pub use seller::Seller;
