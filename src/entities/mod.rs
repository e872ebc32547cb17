pub mod airdrop_winner;
pub mod mini_app;
pub mod prelude;
pub mod token_claim;
pub mod user_eligibility;
pub mod user_login;
