// handlers/staff/mod.rs - Staff handlers (bearer token + live staff flag required)
//
// Every route here sits behind `staff_auth_middleware`, which puts a
// `StaffUser` into the request extensions.

pub mod articles;  // /staff/kb/articles[/:id[/publish]]
pub mod dashboard; // GET /staff/dashboard
pub mod tickets;   // /staff/tickets[/:id[/messages]]

pub use articles::{create_article, delete_article, get_article, list_articles, publish_article, update_article};
pub use dashboard::dashboard;
pub use tickets::{add_message, list_tickets, update_ticket};
