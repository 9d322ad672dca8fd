// Core infrastructure modules
pub mod email; // Outbound email collaborator
pub mod middleware; // ViewerContext middleware and guards
pub mod security; // Password hashing and bearer tokens
pub mod sqlite_database; // Connection pool and schema
pub mod viewer; // Request-scoped viewer context

pub use email::{EmailSender, LogEmailSender, OutgoingEmail, RecordingEmailSender};
pub use security::{Claims, SecurityService};
pub use sqlite_database::SqliteDatabase;
pub use viewer::{AuthState, Viewer, ViewerContext};
