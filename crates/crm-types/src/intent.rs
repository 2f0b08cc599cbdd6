//! The closed set of user intents.
//!
//! Every per-intent table (download name, title, response text) is an
//! exhaustive match, so adding a variant forces every table to be updated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Accounts ranked by closed opportunity amount.
    TopAccounts,
    /// Most recently created opportunities.
    RecentOpportunities,
    /// Opportunity count and amount grouped by stage.
    OpportunityByStage,
    /// Same grouping as `OpportunityByStage`, rendered as a chart.
    OpportunityStageChart,
    /// Largest opportunities by amount, rendered as a chart.
    OpportunityAmountChart,
    /// Recently created contacts.
    Contacts,
    /// A SOQL statement supplied verbatim by the user.
    CustomQuery,
    /// Nothing matched.
    #[default]
    Unknown,
}

impl Intent {
    /// Every intent, in declaration order.
    pub const ALL: [Intent; 8] = [
        Intent::TopAccounts,
        Intent::RecentOpportunities,
        Intent::OpportunityByStage,
        Intent::OpportunityStageChart,
        Intent::OpportunityAmountChart,
        Intent::Contacts,
        Intent::CustomQuery,
        Intent::Unknown,
    ];

    /// Wire/display name for this intent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::TopAccounts => "top_accounts",
            Intent::RecentOpportunities => "recent_opportunities",
            Intent::OpportunityByStage => "opportunity_by_stage",
            Intent::OpportunityStageChart => "opportunity_stage_chart",
            Intent::OpportunityAmountChart => "opportunity_amount_chart",
            Intent::Contacts => "contacts",
            Intent::CustomQuery => "custom_query",
            Intent::Unknown => "unknown",
        }
    }

    /// Returns true if the intent is backed by a canonical query template.
    pub fn has_template(&self) -> bool {
        !matches!(self, Intent::CustomQuery | Intent::Unknown)
    }

    /// File name offered for the CSV download of this intent's results.
    pub fn file_name(&self) -> &'static str {
        match self {
            Intent::TopAccounts => "top_accounts.csv",
            Intent::RecentOpportunities => "recent_opportunities.csv",
            Intent::OpportunityByStage | Intent::OpportunityStageChart => {
                "opportunities_by_stage.csv"
            }
            Intent::OpportunityAmountChart => "top_opportunities.csv",
            Intent::Contacts => "contacts.csv",
            Intent::CustomQuery | Intent::Unknown => "query_results.csv",
        }
    }

    /// Title shown above the rendered result.
    pub fn title(&self) -> &'static str {
        match self {
            Intent::TopAccounts => "Top Accounts by Opportunity Amount",
            Intent::RecentOpportunities => "Recent Opportunities",
            Intent::OpportunityByStage => "Opportunities by Stage",
            Intent::OpportunityStageChart => "Opportunities by Stage Chart",
            Intent::OpportunityAmountChart => "Top Opportunities by Amount",
            Intent::Contacts => "Contact Information",
            Intent::CustomQuery => "Custom Query Results",
            Intent::Unknown => "Query Results",
        }
    }

    /// Assistant text announcing the result.
    pub fn response_text(&self) -> &'static str {
        match self {
            Intent::TopAccounts => "Here are the top accounts by opportunity amount:",
            Intent::RecentOpportunities => "Here are the most recent opportunities:",
            Intent::OpportunityByStage => "Here's a breakdown of opportunities by stage:",
            Intent::OpportunityStageChart => "Here's a chart showing opportunities by stage:",
            Intent::OpportunityAmountChart => {
                "Here's a chart showing top opportunities by amount:"
            }
            Intent::Contacts => "Here are the recent contacts:",
            Intent::CustomQuery => "Here are the results for your custom query:",
            Intent::Unknown => "Here are the results:",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == normalized)
            .ok_or_else(|| format!("unrecognized intent: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_round_trips_through_from_str() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown_tag() {
        assert!("revenue_forecast".parse::<Intent>().is_err());
        assert_eq!(" Contacts ".parse::<Intent>().unwrap(), Intent::Contacts);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Intent::OpportunityStageChart).unwrap();
        assert_eq!(json, "\"opportunity_stage_chart\"");
        let decoded: Intent = serde_json::from_str("\"top_accounts\"").unwrap();
        assert_eq!(decoded, Intent::TopAccounts);
    }

    #[test]
    fn test_file_names() {
        assert_eq!(Intent::TopAccounts.file_name(), "top_accounts.csv");
        assert_eq!(Intent::CustomQuery.file_name(), "query_results.csv");
        assert_eq!(Intent::Unknown.file_name(), "query_results.csv");
        assert_eq!(
            Intent::OpportunityStageChart.file_name(),
            Intent::OpportunityByStage.file_name()
        );
    }

    #[test]
    fn test_has_template() {
        assert!(Intent::Contacts.has_template());
        assert!(!Intent::CustomQuery.has_template());
        assert!(!Intent::Unknown.has_template());
    }
}
