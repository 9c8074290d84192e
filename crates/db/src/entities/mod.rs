//! Database entities.

pub mod answer;
pub mod company;
pub mod company_invitation;
pub mod company_member;
pub mod notification;
pub mod question;
pub mod quiz;
pub mod quiz_result;
pub mod user;
pub mod user_request;

pub use answer::Entity as Answer;
pub use company::Entity as Company;
pub use company_invitation::Entity as CompanyInvitation;
pub use company_member::Entity as CompanyMember;
pub use notification::Entity as Notification;
pub use question::Entity as Question;
pub use quiz::Entity as Quiz;
pub use quiz_result::Entity as QuizResult;
pub use user::Entity as User;
pub use user_request::Entity as UserRequest;
