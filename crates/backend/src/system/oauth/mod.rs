//! OAuth-мост Amazon: ссылка на согласие продавца и обработка редиректа
//! с authorization code.

pub mod flow;
pub mod state;

pub use flow::{build_consent_url, complete_authorization, redirect_uri, OAuthCallback, OAuthError};
pub use state::OAuthStateStore;
