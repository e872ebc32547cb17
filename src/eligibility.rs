//! Airdrop eligibility state machine.
//!
//! A user qualifies for the one-time claim after both a spin and a share.
//! Flags only ever move from false to true; eligibility is the conjunction
//! of the two. The decision logic is pure so the state-machine invariants
//! can be tested without a database.

use anyhow::{Result, anyhow};
use serde::Deserialize;

pub const MAX_WALLET_ADDRESS_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EligibilityAction {
    Spin,
    Share,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibilityFlags {
    pub has_spun: bool,
    pub has_shared: bool,
}

impl EligibilityFlags {
    /// Apply an action. Flags are monotonic: an already-set flag stays set.
    pub fn apply(self, action: EligibilityAction) -> Self {
        match action {
            EligibilityAction::Spin => Self {
                has_spun: true,
                ..self
            },
            EligibilityAction::Share => Self {
                has_shared: true,
                ..self
            },
        }
    }

    pub fn is_eligible(self) -> bool {
        self.has_spun && self.has_shared
    }
}

/// Whether a claim may proceed, given the user's eligibility record.
/// A prior claim is caught separately by the unique constraint on the claim
/// table, so `Approved` means "eligible, go attempt the insert".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimDecision {
    Approved,
    NoRecord,
    NotEligible,
}

pub fn decide_claim(record: Option<EligibilityFlags>) -> ClaimDecision {
    match record {
        None => ClaimDecision::NoRecord,
        Some(flags) if flags.is_eligible() => ClaimDecision::Approved,
        Some(_) => ClaimDecision::NotEligible,
    }
}

/// Normalize an EVM wallet address to lowercase `0x` + 40 hex characters.
pub fn sanitize_wallet_address(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Wallet address cannot be empty"));
    }
    if trimmed.len() > MAX_WALLET_ADDRESS_LEN {
        return Err(anyhow!(
            "Wallet address exceeds {MAX_WALLET_ADDRESS_LEN} character limit"
        ));
    }
    let hex_part = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| anyhow!("Wallet address must start with 0x"))?;
    let bytes = hex::decode(hex_part)
        .map_err(|err| anyhow!("Wallet address is not valid hex: {err}"))?;
    if bytes.len() != 20 {
        return Err(anyhow!(
            "Wallet address must be 20 bytes, got {}",
            bytes.len()
        ));
    }
    Ok(format!("0x{}", hex_part.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_monotonic() {
        let flags = EligibilityFlags::default()
            .apply(EligibilityAction::Spin)
            .apply(EligibilityAction::Spin)
            .apply(EligibilityAction::Share)
            .apply(EligibilityAction::Spin);
        assert!(flags.has_spun);
        assert!(flags.has_shared);
    }

    #[test]
    fn eligibility_requires_both_actions() {
        let none = EligibilityFlags::default();
        assert!(!none.is_eligible());
        assert!(!none.apply(EligibilityAction::Spin).is_eligible());
        assert!(!none.apply(EligibilityAction::Share).is_eligible());
        assert!(
            none.apply(EligibilityAction::Spin)
                .apply(EligibilityAction::Share)
                .is_eligible()
        );
        assert!(
            none.apply(EligibilityAction::Share)
                .apply(EligibilityAction::Spin)
                .is_eligible()
        );
    }

    #[test]
    fn claim_decisions() {
        assert_eq!(decide_claim(None), ClaimDecision::NoRecord);
        assert_eq!(
            decide_claim(Some(EligibilityFlags::default())),
            ClaimDecision::NotEligible
        );
        let partial = EligibilityFlags::default().apply(EligibilityAction::Spin);
        assert_eq!(decide_claim(Some(partial)), ClaimDecision::NotEligible);
        let full = partial.apply(EligibilityAction::Share);
        assert_eq!(decide_claim(Some(full)), ClaimDecision::Approved);
    }

    #[test]
    fn action_parsing() {
        let spin: EligibilityAction = serde_json::from_str("\"spin\"").unwrap();
        assert_eq!(spin, EligibilityAction::Spin);
        let share: EligibilityAction = serde_json::from_str("\"share\"").unwrap();
        assert_eq!(share, EligibilityAction::Share);
        assert!(serde_json::from_str::<EligibilityAction>("\"vote\"").is_err());
    }

    #[test]
    fn wallet_address_sanitization() {
        let canonical =
            sanitize_wallet_address("0xAAD86A4FE9557297DDD0B073D3D32EF8A407188B").unwrap();
        assert_eq!(canonical, "0xaad86a4fe9557297ddd0b073d3d32ef8a407188b");

        assert!(sanitize_wallet_address("").is_err());
        assert!(sanitize_wallet_address("aad86a4fe9557297ddd0b073d3d32ef8a407188b").is_err());
        assert!(sanitize_wallet_address("0x1234").is_err());
        assert!(sanitize_wallet_address("0xzzd86a4fe9557297ddd0b073d3d32ef8a407188b").is_err());
    }
}
