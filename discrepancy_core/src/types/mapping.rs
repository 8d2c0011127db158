use serde::{Deserialize, Serialize};

use super::NameKey;

/// A human-approved carrier name to payroll name correspondence, scoped to
/// one employer account.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NameMapping {
    pub carrier_last_name: String,
    pub carrier_first_name: String,
    pub payroll_last_name: String,
    pub payroll_first_name: String,
    #[serde(default)]
    pub account_scope: String,
}

impl NameMapping {
    pub fn carrier_key(&self) -> NameKey {
        NameKey::new(&self.carrier_last_name, &self.carrier_first_name)
    }

    pub fn payroll_key(&self) -> NameKey {
        NameKey::new(&self.payroll_last_name, &self.payroll_first_name)
    }
}

/// A newly approved pairing that the caller should persist as a [`NameMapping`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MappingCandidate {
    pub carrier_last_name: String,
    pub carrier_first_name: String,
    pub payroll_last_name: String,
    pub payroll_first_name: String,
}

impl MappingCandidate {
    pub fn scoped(self, account: &str) -> NameMapping {
        NameMapping {
            carrier_last_name: self.carrier_last_name,
            carrier_first_name: self.carrier_first_name,
            payroll_last_name: self.payroll_last_name,
            payroll_first_name: self.payroll_first_name,
            account_scope: account.to_string(),
        }
    }
}
