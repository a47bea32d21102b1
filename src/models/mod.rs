mod company;
mod item;
mod user;

pub use company::{Company, NewCompany, UpdateCompany};
pub use item::{Item, NewItem, UpdateItem};
pub use user::{NewUser, Role, UpdateUser, User};
