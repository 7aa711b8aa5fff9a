//! Stateless access/refresh token handling.

pub mod claims;
pub mod clock;
pub mod error;
pub mod issuer;

pub use claims::{AccessClaims, Claims, RefreshClaims, TokenKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TokenError;
pub use issuer::{TokenIssuer, TokenPair};
