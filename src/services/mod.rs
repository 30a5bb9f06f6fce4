pub mod auth_service;
pub use auth_service::{AuthError, AuthService, LoginResult, Registration};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod item_service;
pub use item_service::{ItemError, ItemService, NewItem, StatusCounts};

pub mod item_service_impl;
pub use item_service_impl::SeaOrmItemService;

pub mod token;
pub use token::{Claims, IssuedToken, TokenError, TokenIssuer};
