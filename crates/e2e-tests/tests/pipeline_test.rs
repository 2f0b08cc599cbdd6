//! End-to-end pipeline tests for the CRM assistant.
//!
//! Full login -> classify -> query -> flatten -> present pipeline against
//! HTTP mocks of Salesforce and Gemini.

use pretty_assertions::assert_eq;
use serde_json::json;

use crm_intent::template;
use crm_service::{ChartKind, PresentationEvent};
use crm_types::{Intent, Role};
use e2e_tests::{contact_records, top_account_records, TestHarness};

/// "Show me top accounts" with no classifier: rule 1, the fixed template,
/// one explanatory message, one render, and top_accounts.csv.
#[tokio::test]
async fn test_top_accounts_rule_based() {
    let harness = TestHarness::start().await;
    let top_accounts = template(Intent::TopAccounts).unwrap();
    harness.mount_query(top_accounts, top_account_records()).await;

    let mut conversation = harness.logged_in(false).await;
    assert!(!conversation.session().classifier_available());

    let outcome = conversation.submit("Show me top accounts").await.unwrap();

    assert_eq!(outcome.classification.intent, Intent::TopAccounts);
    assert_eq!(outcome.classification.query.as_deref(), Some(top_accounts));

    let assistant = outcome.assistant_messages();
    assert_eq!(assistant.len(), 1);
    assert_eq!(
        assistant[0].content,
        "Finding the top accounts by opportunity amount\n\nHere are the top accounts by opportunity amount:"
    );

    let renders: Vec<_> = outcome.events.iter().filter(|e| e.is_render()).collect();
    assert_eq!(renders.len(), 1);
    match renders[0] {
        PresentationEvent::RenderChart { chart, title, .. } => {
            assert_eq!(title, "Top Accounts by Opportunity Amount");
            assert_eq!(chart.kind, ChartKind::HorizontalBar);
            let labels: Vec<_> = chart.bars.iter().map(|b| b.label.as_str()).collect();
            assert_eq!(labels, vec!["Globex", "Acme", "Initech"]);
        }
        other => panic!("expected a chart, got {other:?}"),
    }

    let (file_name, csv) = outcome.download().unwrap();
    assert_eq!(file_name, "top_accounts.csv");
    assert!(csv.starts_with("AccountId,Name,totalAmount\n001A,Acme,250000.0\n"));

    // Welcome, user, assistant.
    let roles: Vec<_> = conversation.session().messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
}

/// Nested relationships are flattened and metadata dropped before rendering.
#[tokio::test]
async fn test_contacts_flattened() {
    let harness = TestHarness::start().await;
    harness
        .mount_query(template(Intent::Contacts).unwrap(), contact_records())
        .await;

    let mut conversation = harness.logged_in(false).await;
    let outcome = conversation.submit("List contacts").await.unwrap();

    let table = outcome.table().unwrap();
    assert_eq!(table.columns(), &["Id", "Name", "Email", "Phone", "Account.Name"]);
    assert!(!table.has_column("Account"));
    assert!(!table.has_column("attributes"));
    assert_eq!(table.rows()[1]["Account.Name"], json!("Globex"));
    assert!(matches!(
        outcome.events.iter().find(|e| e.is_render()),
        Some(PresentationEvent::RenderTable { .. })
    ));
    assert_eq!(outcome.download().unwrap().0, "contacts.csv");
}

/// A literal SOQL statement runs verbatim.
#[tokio::test]
async fn test_custom_query_runs_verbatim() {
    let harness = TestHarness::start().await;
    let soql = "SELECT Id, Name FROM Account WHERE Industry = 'Energy'";
    harness
        .mount_query(soql, vec![json!({"attributes": {"type": "Account"}, "Id": "001A", "Name": "Acme"})])
        .await;

    let mut conversation = harness.logged_in(false).await;
    let outcome = conversation.submit(soql).await.unwrap();

    assert_eq!(outcome.classification.intent, Intent::CustomQuery);
    assert_eq!(outcome.classification.query.as_deref(), Some(soql));
    assert_eq!(outcome.table().unwrap().len(), 1);
    assert_eq!(outcome.download().unwrap().0, "query_results.csv");
}

/// With a model available, the AI reply drives the query, even a custom one
/// under a named intent.
#[tokio::test]
async fn test_ai_assisted_turn() {
    let harness = TestHarness::start().await;
    harness.mount_model("gemini-pro").await;
    let soql = "SELECT Name, Amount, CloseDate FROM Opportunity WHERE Amount > 100000 ORDER BY Amount DESC LIMIT 3";
    harness
        .mount_classification(
            "gemini-pro",
            &format!(
                "```json\n{}\n```",
                json!({
                    "intent": "opportunity_amount_chart",
                    "query": soql,
                    "explanation": "Charting the largest open deals"
                })
            ),
        )
        .await;
    harness
        .mount_query(
            soql,
            vec![
                json!({"Name": "Renewal", "Amount": 150000, "CloseDate": "2024-06-30"}),
                json!({"Name": "Expansion", "Amount": 300000, "CloseDate": "2024-07-15"}),
            ],
        )
        .await;

    let mut conversation = harness.logged_in(true).await;
    assert!(conversation.session().classifier_available());
    assert_eq!(conversation.classifier().describe(), "ai-assisted (gemini-pro)");
    assert!(conversation.session().messages()[0]
        .content
        .contains("natural language"));

    let outcome = conversation
        .submit("chart my biggest deals over 100k")
        .await
        .unwrap();
    assert_eq!(outcome.classification.intent, Intent::OpportunityAmountChart);
    assert_eq!(
        outcome.assistant_messages()[0].content,
        "Charting the largest open deals\n\nHere's a chart showing top opportunities by amount:"
    );
    match outcome.events.iter().find(|e| e.is_render()) {
        Some(PresentationEvent::RenderChart { chart, .. }) => {
            assert_eq!(chart.bars[0].label, "Expansion");
        }
        other => panic!("expected a chart, got {other:?}"),
    }
    assert_eq!(outcome.download().unwrap().0, "top_opportunities.csv");
}

/// Several turns accumulate in order; clearing keeps the login.
#[tokio::test]
async fn test_multi_turn_transcript() {
    let harness = TestHarness::start().await;
    harness
        .mount_query(template(Intent::Contacts).unwrap(), contact_records())
        .await;

    let mut conversation = harness.logged_in(false).await;
    conversation.submit("List contacts").await.unwrap();
    conversation.submit("what's the weather").await.unwrap();
    assert_eq!(conversation.session().messages().len(), 5);

    conversation.clear_history();
    assert!(conversation.session().messages().is_empty());
    assert!(conversation.session().is_authenticated());
    conversation.submit("List contacts").await.unwrap();
    assert_eq!(conversation.session().messages().len(), 2);
}
