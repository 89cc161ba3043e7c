//! Registration, log in, bearer token authentication and password resets.

mod forgot_password;
mod log_in;
mod mailer;
mod middleware;
mod register_user;
mod token;

pub use forgot_password::{
    ForgotPasswordForm, MessageResponse, PASSWORD_RESET_MESSAGE, PasswordResetState,
    RESET_REQUESTED_MESSAGE, ResetPasswordForm, request_password_reset_endpoint,
    reset_password_endpoint,
};
pub use log_in::{AccessToken, LogInForm, LoginState, log_in_endpoint};
pub use mailer::{LogMailer, Mailer};
pub use middleware::auth_guard;
pub use register_user::{RegisterForm, register_user_endpoint};
pub use token::{
    ACCESS_TOKEN_DURATION, Claims, RESET_TOKEN_DURATION, TokenKeys, TokenPurpose, decode_token,
    encode_token,
};

#[cfg(test)]
pub(crate) use mailer::test_mailer;
