mod account;
mod credential;
mod entry;
mod ledger;
mod money;
mod user;

pub use account::*;
pub use credential::*;
pub use entry::*;
pub use ledger::*;
pub use money::*;
pub use user::*;
