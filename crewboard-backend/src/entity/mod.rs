pub mod comment;
pub mod favorite;
pub mod project;
pub mod recruit;
pub mod stored_file;
pub mod verification_code;

pub use comment::Entity as Comment;
pub use favorite::Entity as Favorite;
pub use project::Entity as Project;
pub use recruit::Entity as Recruit;
pub use stored_file::Entity as StoredFile;
pub use verification_code::Entity as VerificationCode;
