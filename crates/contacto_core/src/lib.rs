pub mod domain;
pub mod ports;

pub use domain::{
    Category, NewSubmission, OutgoingEmail, ResponseStatus, ResponseUpdate, Submission, User,
    UserCredentials,
};
pub use ports::{ClassificationService, DatabaseService, MailService, PortError, PortResult};
