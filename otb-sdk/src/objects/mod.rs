pub mod booking;
pub mod notifications;
pub mod seance;
pub mod ws;

pub use booking::{BookSeatRequest, OccupiedSeatsResponse, SeatOccupancy, TicketResponse, TicketStatus};
pub use notifications::NotificationPayload;
pub use seance::{AddSeanceRequest, CancelSeanceRequest, SeanceResponse, SeanceStatus, UpdateSeanceRequest};
pub use ws::{WsCloseCode, WsServerMessage};
