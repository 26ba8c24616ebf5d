//! Auth Adapter - 会话令牌握手与缓存

mod fixed_token;
mod signer;
mod token_manager;

pub use fixed_token::FixedTokenProvider;
pub use signer::{client_user_id, new_trace_id, signature_date, RequestSigner};
pub use token_manager::{jwt_expiry, SessionTokenManager, TokenManagerConfig};
