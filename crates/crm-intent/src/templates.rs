//! Canonical SOQL per intent.
//!
//! Templates are static: the same intent always executes the same query.

use crm_types::Intent;

const TOP_ACCOUNTS: &str = "SELECT AccountId, Account.Name, SUM(Amount) totalAmount \
FROM Opportunity \
WHERE IsClosed = true \
GROUP BY AccountId, Account.Name \
ORDER BY SUM(Amount) DESC \
LIMIT 5";

const RECENT_OPPORTUNITIES: &str = "SELECT Id, Name, Amount, StageName, CloseDate, Account.Name \
FROM Opportunity \
ORDER BY CreatedDate DESC \
LIMIT 10";

const OPPORTUNITIES_BY_STAGE: &str =
    "SELECT StageName, COUNT(Id) opportunityCount, SUM(Amount) totalAmount \
FROM Opportunity \
GROUP BY StageName \
ORDER BY SUM(Amount) DESC";

const OPPORTUNITY_AMOUNTS: &str = "SELECT Name, Amount, CloseDate \
FROM Opportunity \
WHERE Amount != null \
ORDER BY Amount DESC \
LIMIT 10";

const CONTACTS: &str = "SELECT Id, Name, Email, Phone, Account.Name \
FROM Contact \
ORDER BY CreatedDate DESC \
LIMIT 10";

/// Canonical query for an intent, `None` for `CustomQuery` and `Unknown`.
pub fn template(intent: Intent) -> Option<&'static str> {
    match intent {
        Intent::TopAccounts => Some(TOP_ACCOUNTS),
        Intent::RecentOpportunities => Some(RECENT_OPPORTUNITIES),
        Intent::OpportunityByStage | Intent::OpportunityStageChart => Some(OPPORTUNITIES_BY_STAGE),
        Intent::OpportunityAmountChart => Some(OPPORTUNITY_AMOUNTS),
        Intent::Contacts => Some(CONTACTS),
        Intent::CustomQuery | Intent::Unknown => None,
    }
}

/// All templated intents with their queries, in declaration order.
pub fn all_templates() -> Vec<(Intent, &'static str)> {
    Intent::ALL
        .iter()
        .filter_map(|intent| template(*intent).map(|q| (*intent, q)))
        .collect()
}
