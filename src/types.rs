//! Core types and data structures for the devnet memecoin workflow.

use nonempty::{nonempty, NonEmpty};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// Lamports (or base units at 9 decimals) per whole unit.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// An immutable catalog entry describing a token the workflow can create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDefinition {
    /// Stable identifier (e.g. "doge")
    pub id: String,
    /// Display name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
}

impl TokenDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

/// The fixed set of token definitions, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCatalog(NonEmpty<TokenDefinition>);

impl TokenCatalog {
    pub fn new(definitions: NonEmpty<TokenDefinition>) -> Self {
        Self(definitions)
    }

    /// The default memecoin catalog.
    pub fn memecoins() -> Self {
        Self(nonempty![
            TokenDefinition::new("doge", "Solana Doge", "SDOGE"),
            TokenDefinition::new("pepe", "Pepe on Solana", "PEPE"),
            TokenDefinition::new("shib", "Shiba Inu SOL", "SHIB"),
        ])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenDefinition> {
        self.0.iter()
    }

    /// Fresh, unminted instances for every definition.
    pub fn instantiate(&self) -> Vec<TokenInstance> {
        self.0.iter().cloned().map(TokenInstance::from).collect()
    }
}

impl Default for TokenCatalog {
    fn default() -> Self {
        Self::memecoins()
    }
}

/// A catalog entry together with its on-ledger state as observed this session.
///
/// The mint moves one way, from absent to assigned. The balance is the last
/// successfully observed value, or absent if nothing was ever observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInstance {
    definition: TokenDefinition,
    mint: Option<Pubkey>,
    balance: Option<f64>,
}

impl From<TokenDefinition> for TokenInstance {
    fn from(definition: TokenDefinition) -> Self {
        Self {
            definition,
            mint: None,
            balance: None,
        }
    }
}

impl TokenInstance {
    pub fn definition(&self) -> &TokenDefinition {
        &self.definition
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn symbol(&self) -> &str {
        &self.definition.symbol
    }

    pub fn mint(&self) -> Option<Pubkey> {
        self.mint
    }

    pub fn is_minted(&self) -> bool {
        self.mint.is_some()
    }

    pub fn balance(&self) -> Option<f64> {
        self.balance
    }

    /// Assign the mint created for this token. Returns `false` and leaves the
    /// instance untouched if a mint was already assigned.
    pub fn assign_mint(&mut self, mint: Pubkey) -> bool {
        if self.mint.is_some() {
            return false;
        }
        self.mint = Some(mint);
        true
    }

    /// Record a freshly observed balance.
    pub fn set_balance(&mut self, balance: f64) {
        self.balance = Some(balance);
    }

    /// Fold a later copy of the same token into this one.
    ///
    /// A mint is only ever assigned, never cleared. A balance is taken only
    /// when it was observed against the mint this instance now holds.
    pub fn merge_from(&mut self, other: &TokenInstance) {
        if let Some(mint) = other.mint {
            self.assign_mint(mint);
        }
        if let Some(balance) = other.balance {
            if other.mint.is_some() && other.mint == self.mint {
                self.balance = Some(balance);
            }
        }
    }
}

/// Merge `updated` into `current` by token id. Entries not present in
/// `current` are ignored.
pub fn merge_tokens(current: &mut [TokenInstance], updated: &[TokenInstance]) {
    for token in updated {
        if let Some(slot) = current.iter_mut().find(|t| t.id() == token.id()) {
            slot.merge_from(token);
        }
    }
}

/// Convert a raw ledger amount into a human-scaled quantity.
pub fn to_ui_amount(raw: u64, scale: u64) -> f64 {
    if scale == 0 {
        return raw as f64;
    }
    raw as f64 / scale as f64
}

/// Shorten an address for display: first and last seven characters.
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 14 {
        return address.to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 7..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memecoin_catalog() {
        let catalog = TokenCatalog::memecoins();
        assert_eq!(catalog.len(), 3);
        let symbols: Vec<&str> = catalog.iter().map(|d| d.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["SDOGE", "PEPE", "SHIB"]);

        let instances = catalog.instantiate();
        assert!(instances.iter().all(|t| !t.is_minted() && t.balance().is_none()));
    }

    #[test]
    fn test_mint_is_assigned_once() {
        let mut token = TokenInstance::from(TokenDefinition::new("doge", "Solana Doge", "SDOGE"));
        let first = Pubkey::new_unique();
        let second = Pubkey::new_unique();

        assert!(token.assign_mint(first));
        assert!(!token.assign_mint(second));
        assert_eq!(token.mint(), Some(first));
    }

    #[test]
    fn test_stale_copy_never_clears_mint() {
        let mut current = TokenCatalog::memecoins().instantiate();
        let stale = current.clone();

        let mint = Pubkey::new_unique();
        current[1].assign_mint(mint);

        let mut refreshed = stale;
        refreshed[0].assign_mint(Pubkey::new_unique());
        refreshed[0].set_balance(3.0);
        merge_tokens(&mut current, &refreshed);

        assert_eq!(current[1].mint(), Some(mint));
        assert!(current[0].is_minted());
        assert_eq!(current[0].balance(), Some(3.0));
        assert!(!current[2].is_minted());
    }

    #[test]
    fn test_balance_for_other_mint_is_ignored() {
        let mut token = TokenInstance::from(TokenDefinition::new("pepe", "Pepe", "PEPE"));
        token.assign_mint(Pubkey::new_unique());

        let mut other = TokenInstance::from(TokenDefinition::new("pepe", "Pepe", "PEPE"));
        other.assign_mint(Pubkey::new_unique());
        other.set_balance(7.0);

        token.merge_from(&other);
        assert_eq!(token.balance(), None);
    }

    #[test]
    fn test_ui_amount_scaling() {
        assert_eq!(to_ui_amount(1_000_000_000, LAMPORTS_PER_SOL), 1.0);
        assert_eq!(to_ui_amount(250_000_000, LAMPORTS_PER_SOL), 0.25);
        assert_eq!(to_ui_amount(42, 0), 42.0);
    }

    #[test]
    fn test_shorten_address() {
        let address = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
        assert_eq!(shorten_address(address), "9xQeWvG...PusVFin");
        assert_eq!(shorten_address("short"), "short");
    }
}
