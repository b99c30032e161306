pub mod article;
pub mod ticket;
pub mod user;

pub use article::{ArticleChanges, KbArticle, NewArticle};
pub use ticket::{DashboardStats, Ticket, TicketMessage, TicketWithMessages};
pub use user::{NewUser, User, UserSummary};
