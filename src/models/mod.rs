pub mod airdrop;
pub mod directory;
