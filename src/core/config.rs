//! Engine configuration: operating companies, their ledgers, the designated
//! carrier and the retry budget.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::retry::RetryPolicy;
use super::types::normalize_tax_id;

/// One operating company whose payables are recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyConfig {
    /// Short code used in ledger keys and logs (e.g. "EH").
    pub code: String,
    /// Registered legal name, as it appears in `xNome` of outgoing documents.
    pub legal_name: String,
    /// CNPJ, formatted or bare.
    pub tax_id: String,
    /// Ledger document id per calendar year.
    #[serde(default)]
    pub ledgers: BTreeMap<i32, String>,
}

/// The freight carrier whose waybills are dated through its billing portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierConfig {
    /// Case-insensitive fragment of the emitter name.
    pub name_fragment: String,
    /// Emitter CNPJs that identify the carrier regardless of name.
    #[serde(default)]
    pub tax_ids: Vec<String>,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            name_fragment: "BRASPRESS".into(),
            tax_ids: Vec::new(),
        }
    }
}

/// Retry budget for rate-limited ledger calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per ledger call.
    pub max_attempts: u32,
    /// Seconds to wait after a rate-limit response.
    pub cooldown_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cooldown_secs: 30,
        }
    }
}

impl RetrySettings {
    /// The runtime retry policy.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.cooldown_secs))
    }
}

fn default_description_suffix() -> String {
    " (Bot)".into()
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The operating companies (recipients of the payables).
    pub companies: Vec<CompanyConfig>,
    /// The designated carrier.
    #[serde(default)]
    pub carrier: CarrierConfig,
    /// Emitter-name or file-name fragments whose documents are never recorded.
    #[serde(default)]
    pub excluded_emitters: Vec<String>,
    /// Appended to the emitter name in the row description.
    #[serde(default = "default_description_suffix")]
    pub description_suffix: String,
    /// Retry budget for ledger calls.
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            companies: Vec::new(),
            carrier: CarrierConfig::default(),
            excluded_emitters: Vec::new(),
            description_suffix: default_description_suffix(),
            retry: RetrySettings::default(),
        }
    }
}

impl EngineConfig {
    /// Check the configuration for inconsistencies.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.companies.is_empty() {
            return Err(LedgerError::Config(
                "at least one company must be configured".into(),
            ));
        }
        let mut seen = HashSet::new();
        for company in &self.companies {
            if company.code.trim().is_empty() {
                return Err(LedgerError::Config("company code must not be empty".into()));
            }
            let tax_id = normalize_tax_id(&company.tax_id);
            if tax_id.is_empty() {
                return Err(LedgerError::Config(format!(
                    "company {} has no tax id",
                    company.code
                )));
            }
            if !seen.insert(tax_id) {
                return Err(LedgerError::Config(format!(
                    "tax id of company {} is configured twice",
                    company.code
                )));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(LedgerError::Config("retry.max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// The company whose CNPJ equals `tax_id`.
    pub fn company_by_tax_id(&self, tax_id: &str) -> Option<&CompanyConfig> {
        let wanted = normalize_tax_id(tax_id);
        if wanted.is_empty() {
            return None;
        }
        self.companies
            .iter()
            .find(|c| normalize_tax_id(&c.tax_id) == wanted)
    }

    /// Whether `tax_id` belongs to one of the operating companies.
    pub fn is_own_tax_id(&self, tax_id: &str) -> bool {
        self.company_by_tax_id(tax_id).is_some()
    }

    /// Whether `name` is the legal name of one of the operating companies.
    pub fn is_own_name(&self, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty()
            && self
                .companies
                .iter()
                .any(|c| c.legal_name.trim().eq_ignore_ascii_case(name))
    }

    /// Whether the emitter is the designated carrier.
    pub fn is_designated_carrier(&self, emitter_name: &str, emitter_tax_id: &str) -> bool {
        let fragment = self.carrier.name_fragment.trim();
        if !fragment.is_empty() && contains_ignore_case(emitter_name, fragment) {
            return true;
        }
        let tax_id = normalize_tax_id(emitter_tax_id);
        !tax_id.is_empty()
            && self
                .carrier
                .tax_ids
                .iter()
                .any(|t| normalize_tax_id(t) == tax_id)
    }

    /// The configured exclusion fragment contained in `text`, if any.
    pub fn excluded_fragment(&self, text: &str) -> Option<&str> {
        self.excluded_emitters
            .iter()
            .map(|f| f.trim())
            .find(|f| !f.is_empty() && contains_ignore_case(text, f))
    }

    /// Parse a JSON configuration and validate it.
    #[cfg(feature = "config")]
    pub fn from_json_str(json: &str) -> Result<Self, LedgerError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| LedgerError::Config(format!("invalid JSON configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_uppercase().contains(&needle.to_uppercase())
}

/// Builder for [`EngineConfig`].
///
/// # Example
///
/// ```
/// use nfe_ledger::core::EngineConfigBuilder;
///
/// let config = EngineConfigBuilder::new()
///     .company("EH", "ELETRONICA HORIZONTE LTDA", "11.111.111/0001-11")
///     .ledger("EH", 2025, "sheet-eh-2025")
///     .build()
///     .unwrap();
/// assert!(config.is_own_tax_id("11111111000111"));
/// ```
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Start from the defaults (no companies, BRASPRESS as carrier).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operating company.
    pub fn company(
        mut self,
        code: impl Into<String>,
        legal_name: impl Into<String>,
        tax_id: impl Into<String>,
    ) -> Self {
        self.config.companies.push(CompanyConfig {
            code: code.into(),
            legal_name: legal_name.into(),
            tax_id: tax_id.into(),
            ledgers: BTreeMap::new(),
        });
        self
    }

    /// Register the ledger document of `company` for `year`.
    ///
    /// Unknown company codes are ignored; [`build`](Self::build) does not
    /// complain about them.
    pub fn ledger(mut self, company: &str, year: i32, document_id: impl Into<String>) -> Self {
        if let Some(c) = self.config.companies.iter_mut().find(|c| c.code == company) {
            c.ledgers.insert(year, document_id.into());
        }
        self
    }

    /// Set the name fragment identifying the designated carrier.
    pub fn carrier_name(mut self, fragment: impl Into<String>) -> Self {
        self.config.carrier.name_fragment = fragment.into();
        self
    }

    /// Identify the designated carrier by CNPJ as well.
    pub fn carrier_tax_id(mut self, tax_id: impl Into<String>) -> Self {
        self.config.carrier.tax_ids.push(tax_id.into());
        self
    }

    /// Never record documents whose emitter or file name contains `fragment`.
    pub fn exclude_emitter(mut self, fragment: impl Into<String>) -> Self {
        self.config.excluded_emitters.push(fragment.into());
        self
    }

    /// Set the suffix appended to descriptions.
    pub fn description_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.description_suffix = suffix.into();
        self
    }

    /// Set the retry budget.
    pub fn retry(mut self, max_attempts: u32, cooldown_secs: u64) -> Self {
        self.config.retry = RetrySettings {
            max_attempts,
            cooldown_secs,
        };
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<EngineConfig, LedgerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
