pub mod chat_service;
pub mod room_service;

pub use chat_service::ChatService;
pub use room_service::RoomService;
