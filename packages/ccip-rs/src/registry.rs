//! Chain selector registry
//!
//! Maps 64-bit chain selectors to their chain family, name and testnet flag.
//! A [`ChainRegistry`] is an immutable value: build it once at startup and pass
//! it by reference to the normalizer, hashers and proof calculator.
//!
//! # Environment Variable Schema
//!
//! ```text
//! CCIP_CHAINS_COUNT=2                       # Number of extra chains
//! CCIP_CHAIN_1_SELECTOR=3478487238524512106 # Chain selector (u64)
//! CCIP_CHAIN_1_FAMILY=evm                   # evm | svm | aptos | sui | ton
//! CCIP_CHAIN_1_NAME=arbitrum-sepolia        # optional, default chain_1
//! CCIP_CHAIN_1_TESTNET=true                 # optional, default false
//! ```
//!
//! Chains declared through the environment are layered over the built-in
//! table; an entry with a known selector replaces the built-in one.

use eyre::{eyre, Result as EyreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CcipError, Result};
use crate::types::ChainFamily;

/// Registry entry for one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub selector: u64,
    pub family: ChainFamily,
    pub name: String,
    #[serde(default)]
    pub testnet: bool,
}

impl ChainInfo {
    pub fn new(selector: u64, family: ChainFamily, name: &str, testnet: bool) -> Self {
        Self {
            selector,
            family,
            name: name.to_string(),
            testnet,
        }
    }
}

// ============================================================================
// Built-in Chains
// ============================================================================

const BUILTIN_CHAINS: &[(u64, ChainFamily, &str, bool)] = &[
    // EVM
    (5009297550715157269, ChainFamily::Evm, "ethereum-mainnet", false),
    (4949039107694359620, ChainFamily::Evm, "ethereum-mainnet-arbitrum-1", false),
    (3734403246176062136, ChainFamily::Evm, "ethereum-mainnet-optimism-1", false),
    (15971525489660198786, ChainFamily::Evm, "ethereum-mainnet-base-1", false),
    (6433500567565415381, ChainFamily::Evm, "avalanche-mainnet", false),
    (11344663589394136015, ChainFamily::Evm, "binance_smart_chain-mainnet", false),
    (4051577828743386545, ChainFamily::Evm, "polygon-mainnet", false),
    (16015286601757825753, ChainFamily::Evm, "ethereum-testnet-sepolia", true),
    (3478487238524512106, ChainFamily::Evm, "ethereum-testnet-sepolia-arbitrum-1", true),
    (10344971235874465080, ChainFamily::Evm, "ethereum-testnet-sepolia-base-1", true),
    (14767482510784806043, ChainFamily::Evm, "avalanche-testnet-fuji", true),
    // SVM
    (124615329519749607, ChainFamily::Svm, "solana-mainnet", false),
    (16423721717087811551, ChainFamily::Svm, "solana-devnet", true),
    // Aptos
    (4741433654826277614, ChainFamily::Aptos, "aptos-mainnet", false),
    (743186221051783445, ChainFamily::Aptos, "aptos-testnet", true),
    // Sui
    (17529533435026248318, ChainFamily::Sui, "sui-mainnet", false),
    (9762610643973837292, ChainFamily::Sui, "sui-testnet", true),
    // TON
    (16448340667252469081, ChainFamily::Ton, "ton-mainnet", false),
    (1399300952838017768, ChainFamily::Ton, "ton-testnet", true),
];

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainInfo>,
    by_selector: HashMap<u64, usize>,
    by_name: HashMap<String, usize>,
}

impl ChainRegistry {
    /// Create a registry, rejecting duplicate selectors or names
    pub fn new(chains: Vec<ChainInfo>) -> Result<Self> {
        let mut by_selector = HashMap::with_capacity(chains.len());
        let mut by_name = HashMap::with_capacity(chains.len());

        for (idx, chain) in chains.iter().enumerate() {
            if chain.name.is_empty() {
                return Err(CcipError::InvalidRegistry {
                    reason: format!("chain {} has an empty name", chain.selector),
                });
            }
            if by_selector.insert(chain.selector, idx).is_some() {
                return Err(CcipError::InvalidRegistry {
                    reason: format!("duplicate chain selector {}", chain.selector),
                });
            }
            if by_name.insert(chain.name.clone(), idx).is_some() {
                return Err(CcipError::InvalidRegistry {
                    reason: format!("duplicate chain name '{}'", chain.name),
                });
            }
        }

        Ok(Self {
            chains,
            by_selector,
            by_name,
        })
    }

    /// Well-known mainnet and testnet chains
    pub fn builtin() -> Self {
        let chains = BUILTIN_CHAINS
            .iter()
            .map(|(selector, family, name, testnet)| {
                ChainInfo::new(*selector, *family, name, *testnet)
            })
            .collect::<Vec<_>>();

        let by_selector = chains
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.selector, idx))
            .collect();
        let by_name = chains
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.name.clone(), idx))
            .collect();

        Self {
            chains,
            by_selector,
            by_name,
        }
    }

    /// Parse a JSON list of [`ChainInfo`]
    pub fn from_json(json: &str) -> Result<Self> {
        let chains: Vec<ChainInfo> =
            serde_json::from_str(json).map_err(|e| CcipError::InvalidRegistry {
                reason: format!("invalid chain list: {}", e),
            })?;
        Self::new(chains)
    }

    /// Layer `extra` over this registry; entries with a known selector replace
    /// the existing one
    pub fn with_chains(&self, extra: Vec<ChainInfo>) -> Result<Self> {
        let mut chains: Vec<ChainInfo> = self
            .chains
            .iter()
            .filter(|c| !extra.iter().any(|e| e.selector == c.selector))
            .cloned()
            .collect();
        chains.extend(extra);
        Self::new(chains)
    }

    /// Built-in chains plus any declared through `CCIP_CHAIN_{N}_*` variables
    pub fn from_env() -> EyreResult<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`ChainRegistry::from_env`] with an explicit variable lookup
    pub fn from_env_with<F>(lookup: F) -> EyreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let builtin = Self::builtin();

        let count: usize = match lookup("CCIP_CHAINS_COUNT") {
            Some(s) => s
                .trim()
                .parse()
                .map_err(|_| eyre!("Invalid CCIP_CHAINS_COUNT: {} (must be a number)", s))?,
            None => return Ok(builtin),
        };

        let mut extra = Vec::with_capacity(count);
        for i in 1..=count {
            let prefix = format!("CCIP_CHAIN_{}", i);

            let selector: u64 = lookup(&format!("{}_SELECTOR", prefix))
                .ok_or_else(|| eyre!("Missing {}_SELECTOR", prefix))?
                .trim()
                .parse()
                .map_err(|_| eyre!("Invalid {}_SELECTOR: must be a u64", prefix))?;

            let family: ChainFamily = lookup(&format!("{}_FAMILY", prefix))
                .ok_or_else(|| eyre!("Missing {}_FAMILY", prefix))?
                .parse::<ChainFamily>()
                .map_err(|e| eyre!("Invalid {}_FAMILY: {}", prefix, e))?;

            let name =
                lookup(&format!("{}_NAME", prefix)).unwrap_or_else(|| format!("chain_{}", i));

            let testnet: bool = lookup(&format!("{}_TESTNET", prefix))
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(false);

            extra.push(ChainInfo {
                selector,
                family,
                name,
                testnet,
            });
        }

        let registry = builtin.with_chains(extra)?;
        tracing::debug!(
            chains = registry.len(),
            extra = count,
            "Loaded chain registry from environment"
        );
        Ok(registry)
    }

    pub fn get(&self, selector: u64) -> Option<&ChainInfo> {
        self.by_selector.get(&selector).map(|idx| &self.chains[*idx])
    }

    pub fn by_name(&self, name: &str) -> Option<&ChainInfo> {
        self.by_name.get(name).map(|idx| &self.chains[*idx])
    }

    /// Chain family of a selector
    pub fn family_of(&self, selector: u64) -> Result<ChainFamily> {
        self.get(selector)
            .map(|c| c.family)
            .ok_or(CcipError::UnknownChainSelector { selector })
    }

    pub fn chains(&self) -> &[ChainInfo] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
