#![allow(unused_imports)]

pub use super::airdrop_winner::Entity as AirdropWinner;
pub use super::mini_app::Entity as MiniApp;
pub use super::token_claim::Entity as TokenClaim;
pub use super::user_eligibility::Entity as UserEligibility;
pub use super::user_login::Entity as UserLogin;
