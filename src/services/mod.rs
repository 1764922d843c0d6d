pub mod account;
pub use account::{AccountError, AccountService, AccountUpdate};

pub mod authenticator;
pub use authenticator::{AuthError, Authenticator};

pub mod bootstrap;
pub mod password;
