//! Work lines: a principal product priced together with its optional accessories

use serde::{Deserialize, Serialize};

use super::data::ProductCostSnapshot;
use crate::profile::ProfileId;

const PRINCIPAL_KEY_PREFIX: &str = "principal-";
const OPTIONAL_KEY_PREFIX: &str = "opcional-";

/// Role of a priced item within its line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemRole {
    Principal,
    Optional,
}

/// Result-map key for a principal item
pub fn principal_key(code: &str) -> String {
    format!("{}{}", PRINCIPAL_KEY_PREFIX, code)
}

/// Result-map key for an optional item
pub fn optional_key(code: &str) -> String {
    format!("{}{}", OPTIONAL_KEY_PREFIX, code)
}

/// A principal product plus the optionals selected for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkLine {
    pub principal: ProductCostSnapshot,

    #[serde(default)]
    pub optionals: Vec<ProductCostSnapshot>,

    /// Profile applied to this line instead of the batch default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id_override: Option<ProfileId>,
}

impl WorkLine {
    pub fn new(principal: ProductCostSnapshot) -> Self {
        Self {
            principal,
            optionals: Vec::new(),
            profile_id_override: None,
        }
    }

    pub fn with_optional(mut self, optional: ProductCostSnapshot) -> Self {
        self.optionals.push(optional);
        self
    }

    pub fn with_profile(mut self, profile_id: impl Into<ProfileId>) -> Self {
        self.profile_id_override = Some(profile_id.into());
        self
    }

    /// Line identity: the principal's catalog code
    pub fn line_id(&self) -> &str {
        &self.principal.code
    }

    /// Profile this line is priced with, given the batch default
    pub fn effective_profile_id<'a>(&'a self, default_profile_id: &'a str) -> &'a str {
        self.profile_id_override
            .as_deref()
            .unwrap_or(default_profile_id)
    }

    /// Every item of the line with its result key, principal first
    pub fn items(&self) -> impl Iterator<Item = (String, ItemRole, &ProductCostSnapshot)> + '_ {
        std::iter::once((
            principal_key(&self.principal.code),
            ItemRole::Principal,
            &self.principal,
        ))
        .chain(
            self.optionals
                .iter()
                .map(|o| (optional_key(&o.code), ItemRole::Optional, o)),
        )
    }

    /// Result keys owned by this line
    pub fn item_keys(&self) -> Vec<String> {
        self.items().map(|(key, _, _)| key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> WorkLine {
        WorkLine::new(ProductCostSnapshot::new("TR-200", 100_000.0))
            .with_optional(ProductCostSnapshot::new("CAB-1", 8_000.0))
            .with_optional(ProductCostSnapshot::new("GPS-2", 2_500.0))
    }

    #[test]
    fn test_item_keys() {
        assert_eq!(
            line().item_keys(),
            vec!["principal-TR-200", "opcional-CAB-1", "opcional-GPS-2"]
        );
    }

    #[test]
    fn test_item_roles() {
        let roles: Vec<_> = line().items().map(|(_, role, _)| role).collect();
        assert_eq!(
            roles,
            vec![ItemRole::Principal, ItemRole::Optional, ItemRole::Optional]
        );
    }

    #[test]
    fn test_effective_profile() {
        let plain = line();
        assert_eq!(plain.effective_profile_id("default"), "default");

        let overridden = line().with_profile("agro");
        assert_eq!(overridden.effective_profile_id("default"), "agro");
        assert_eq!(overridden.line_id(), "TR-200");
    }

    #[test]
    fn test_deserialize_without_optionals() {
        let json = r#"{"principal":{"code":"X1","originalFactoryCostEUR":5000.0,"quotationDate":"2024-02-01"}}"#;
        let line: WorkLine = serde_json::from_str(json).unwrap();
        assert!(line.optionals.is_empty());
        assert!(line.profile_id_override.is_none());
        assert_eq!(line.principal.quotation_year().unwrap(), 2024);
    }
}
