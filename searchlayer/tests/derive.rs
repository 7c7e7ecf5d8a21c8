use searchlayer::{memory::InMemoryClient, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[model(identity = "Ticket")]
struct Ticket {
    #[model(primary_key)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    title: String,
    priority: i64,
    #[serde(rename = "tagList")]
    tags: Vec<String>,
    estimate: Option<f64>,
    urgent: bool,
    #[model(foreign_key)]
    owner: Option<String>,
    #[model(skip)]
    #[serde(default)]
    notes: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Model)]
#[serde(rename_all = "camelCase")]
struct Sprint {
    #[model(primary_key)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    story_points: i64,
    #[serde(rename = "goal")]
    sprint_goal: String,
}

fn ticket(title: &str, priority: i64) -> Ticket {
    Ticket {
        id: None,
        title: title.to_string(),
        priority,
        tags: vec!["hardware".to_string()],
        estimate: Some(1.5),
        urgent: priority > 3,
        owner: None,
        notes: serde_json::Value::Null,
    }
}

#[test]
fn test_derived_schema() {
    let schema = Ticket::schema();

    assert_eq!(Ticket::identity(), "Ticket");
    assert_eq!(schema.primary_key(), "id");
    assert_eq!(schema.declared_type("id"), Some(AttributeType::String));
    assert_eq!(schema.declared_type("title"), Some(AttributeType::String));
    assert_eq!(schema.declared_type("priority"), Some(AttributeType::Integer));
    assert_eq!(schema.declared_type("tagList"), Some(AttributeType::Array));
    assert_eq!(schema.declared_type("estimate"), Some(AttributeType::Float));
    assert_eq!(schema.declared_type("urgent"), Some(AttributeType::Boolean));
    assert!(schema.get("owner").is_some_and(|attribute| attribute.foreign_key));
    assert_eq!(schema.get("notes"), None);
    assert_eq!(Ticket::definition().normalize().identity(), "ticket");
}

#[tokio::test]
async fn test_typed_collection_round_trip() {
    let store = SearchStore::new(InMemoryClient::builder().build().await.unwrap(), "app");
    let tickets = store.typed_collection::<Ticket>();

    let inserted = tickets
        .insert(vec![ticket("Printer on fire", 5), ticket("Broken chair", 2)])
        .await
        .unwrap();

    assert_eq!(inserted.len(), 2);
    assert!(inserted.iter().all(|ticket| ticket.id.is_some()));

    let urgent = tickets
        .find(&Criteria::builder().filter(Where::eq("urgent", true)).build())
        .await
        .unwrap();
    assert_eq!(urgent.len(), 1);
    assert_eq!(urgent[0].title, "Printer on fire");
    assert_eq!(urgent[0].tags, vec!["hardware".to_string()]);

    let updated = tickets
        .update(
            &Criteria::builder().filter(Where::eq("title", "Broken chair")).build(),
            Record::from_iter([("priority".to_string(), json!("4"))]),
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].priority, 4);

    let destroyed = tickets
        .destroy(&Criteria::builder().filter(Where::gte("priority", 4)).build())
        .await
        .unwrap();
    assert_eq!(destroyed.len(), 2);
    assert_eq!(tickets.count(&Criteria::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_typed_insert_one_and_paginate() {
    let store = SearchStore::new(InMemoryClient::new(), "app");
    let tickets = store.typed_collection::<Ticket>();

    let first = tickets.insert_one(&ticket("First", 1)).await.unwrap();
    tickets.insert_one(&ticket("Second", 2)).await.unwrap();
    tickets.insert_one(&ticket("Third", 3)).await.unwrap();

    let found = tickets
        .find(&Criteria::builder().filter(Where::eq("id", first.id.clone().unwrap())).build())
        .await
        .unwrap();
    assert_eq!(found, vec![first]);

    let page = tickets
        .paginate(
            &Criteria::builder().sort("priority", SortDirection::Asc).build(),
            PaginationParams::new(1, 2),
        )
        .await
        .unwrap();

    assert_eq!(page.count, 3);
    assert_eq!(page.items.iter().map(|ticket| ticket.priority).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(page.next_page, Some(2));
    assert_eq!(page.previous_page, None);
}

#[tokio::test]
async fn test_rename_all_names_attributes_like_serde() {
    let schema = Sprint::schema();

    assert_eq!(schema.declared_type("storyPoints"), Some(AttributeType::Integer));
    assert_eq!(schema.declared_type("goal"), Some(AttributeType::String));
    assert_eq!(schema.declared_type("story_points"), None);

    let store = SearchStore::new(InMemoryClient::new(), "app");
    let sprints = store.typed_collection::<Sprint>();
    sprints
        .insert(vec![
            Sprint { id: None, story_points: 8, sprint_goal: "ship".to_string() },
            Sprint { id: None, story_points: 3, sprint_goal: "polish".to_string() },
        ])
        .await
        .unwrap();

    let large = sprints
        .find(&Criteria::from_value(json!({ "where": { "storyPoints": { ">": "5" } } })).unwrap())
        .await
        .unwrap();

    assert_eq!(large.len(), 1);
    assert_eq!(large[0].sprint_goal, "ship");
}
