//! Preset questions offered as shortcuts.
//!
//! A preset submits its canonical phrasing through the normal pipeline, so it
//! is classified exactly like typed input.

use std::fmt;
use std::str::FromStr;

use crm_types::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    TopAccounts,
    RecentOpportunities,
    OpportunitiesByStage,
    Contacts,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::TopAccounts,
        Preset::RecentOpportunities,
        Preset::OpportunitiesByStage,
        Preset::Contacts,
    ];

    /// Short name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Preset::TopAccounts => "top-accounts",
            Preset::RecentOpportunities => "recent-opportunities",
            Preset::OpportunitiesByStage => "opportunities-by-stage",
            Preset::Contacts => "contacts",
        }
    }

    /// Text submitted on the user's behalf.
    pub fn phrasing(&self) -> &'static str {
        match self {
            Preset::TopAccounts => "Show me top accounts",
            Preset::RecentOpportunities => "Show me recent opportunities",
            Preset::OpportunitiesByStage => "Show opportunities by stage",
            Preset::Contacts => "List contacts",
        }
    }

    /// Intent the phrasing classifies to under the keyword rules.
    pub fn intent(&self) -> Intent {
        match self {
            Preset::TopAccounts => Intent::TopAccounts,
            Preset::RecentOpportunities => Intent::RecentOpportunities,
            Preset::OpportunitiesByStage => Intent::OpportunityByStage,
            Preset::Contacts => Intent::Contacts,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Preset::ALL
            .iter()
            .copied()
            .find(|p| p.name() == normalized)
            .ok_or_else(|| {
                let names: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}
