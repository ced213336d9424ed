//! Integration tests for `SqliteStore` and the resolver running on top of it,
//! against an in-memory database.

use std::sync::Arc;

use consent_core::{
  Error as CoreError,
  admin::{CategorySeed, CookieSeed},
  caller::Caller,
  catalog::{Category, NewCategory, NewCookie},
  decision::{ConsentStatus, DecisionInput, NewDecision},
  person::NewPerson,
  policy::{Field, FieldPolicy},
  service::{Capture, Chevron, ConsentResolver, ServiceError},
  store::ConsentStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn resolver() -> ConsentResolver<SqliteStore> {
  ConsentResolver::new(Arc::new(store().await))
}

fn category(name: &str) -> NewCategory {
  NewCategory {
    name:            name.into(),
    description:     format!("{name} cookies"),
    mandatory:       false,
    default_value:   false,
    additional_info: None,
  }
}

async fn add_category_with_cookies<S: ConsentStore>(
  s: &S,
  name: &str,
  cookies: &[&str],
) -> Category {
  let category = s.add_category(category(name)).await.unwrap();
  for cookie in cookies {
    s.add_cookie(NewCookie {
      category_id: category.category_id,
      name:        (*cookie).into(),
      description: None,
    })
    .await
    .unwrap();
  }
  category
}

fn submit(category: &Category, value: &str) -> DecisionInput {
  DecisionInput { category_id: category.category_id, value: value.into() }
}

fn member(account_id: &str) -> Caller {
  Caller::Member { account_id: account_id.into() }
}

async fn count_people(s: &SqliteStore) -> i64 {
  s.conn
    .call(|conn| {
      Ok(conn.query_row("SELECT COUNT(*) FROM people", [], |row| row.get(0))?)
    })
    .await
    .unwrap()
}

// ─── People ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_person_by_browser() {
  let s = store().await;
  let person = s.create_person(NewPerson::anonymous("b-1")).await.unwrap();
  assert_eq!(person.account_id, None);

  let found = s.find_person_by_browser("b-1").await.unwrap().unwrap();
  assert_eq!(found, person);

  let by_id = s.get_person(person.person_id).await.unwrap();
  assert_eq!(by_id, Some(person));
}

#[tokio::test]
async fn find_person_missing_returns_none() {
  let s = store().await;
  assert!(s.find_person_by_browser("nobody").await.unwrap().is_none());
  assert!(s.find_person_by_account("nobody").await.unwrap().is_none());
  assert!(s.get_person(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn ambiguous_browser_lookup_returns_none() {
  let s = store().await;
  s.create_person(NewPerson::anonymous("shared")).await.unwrap();
  s.create_person(NewPerson::anonymous("shared")).await.unwrap();

  assert!(s.find_person_by_browser("shared").await.unwrap().is_none());
}

#[tokio::test]
async fn find_person_by_account() {
  let s = store().await;
  let person = s
    .create_person(NewPerson::for_account("acc-1", "b-1"))
    .await
    .unwrap();

  let found = s.find_person_by_account("acc-1").await.unwrap().unwrap();
  assert_eq!(found.person_id, person.person_id);
  assert_eq!(found.browser_id.as_deref(), Some("b-1"));
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn categories_keep_catalog_order() {
  let s = store().await;
  for name in ["Necessary", "Marketing", "Analytics"] {
    s.add_category(category(name)).await.unwrap();
  }

  let all = s.list_categories().await.unwrap();
  let names: Vec<_> = all.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["Necessary", "Marketing", "Analytics"]);
  let positions: Vec<_> = all.iter().map(|c| c.position).collect();
  assert_eq!(positions, [0, 1, 2]);
}

#[tokio::test]
async fn category_fields_roundtrip() {
  let s = store().await;
  let input = NewCategory {
    name:            "Necessary".into(),
    description:     "Required for the site to work".into(),
    mandatory:       true,
    default_value:   true,
    additional_info: Some("Cannot be turned off".into()),
  };
  let created = s.add_category(input).await.unwrap();

  let fetched = s.get_category(created.category_id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert!(fetched.mandatory);
  assert!(fetched.default_value);
  assert_eq!(fetched.additional_info.as_deref(), Some("Cannot be turned off"));
}

#[tokio::test]
async fn list_cookies_filters_by_category() {
  let s = store().await;
  let marketing = add_category_with_cookies(&s, "Marketing", &["_fbp", "ads"]).await;
  let analytics = add_category_with_cookies(&s, "Analytics", &["_ga"]).await;

  let all = s.list_cookies(None).await.unwrap();
  assert_eq!(all.len(), 3);

  let only = s
    .list_cookies(Some(&[marketing.category_id]))
    .await
    .unwrap();
  let names: Vec<_> = only.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["_fbp", "ads"]);

  let both = s
    .list_cookies(Some(&[marketing.category_id, analytics.category_id]))
    .await
    .unwrap();
  assert_eq!(both.len(), 3);

  assert!(s.list_cookies(Some(&[])).await.unwrap().is_empty());
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_and_list_decisions() {
  let s = store().await;
  let person = s.create_person(NewPerson::anonymous("b-1")).await.unwrap();
  let marketing = s.add_category(category("Marketing")).await.unwrap();
  let analytics = s.add_category(category("Analytics")).await.unwrap();

  let recorded = s
    .record_decisions(vec![
      NewDecision {
        person_id:       person.person_id,
        category_id:     marketing.category_id,
        status:          Some(ConsentStatus::Declined),
        capture_source:  Some("community".into()),
        capture_channel: Some("web".into()),
      },
      NewDecision {
        person_id:       person.person_id,
        category_id:     analytics.category_id,
        status:          None,
        capture_source:  None,
        capture_channel: None,
      },
    ])
    .await
    .unwrap();
  assert_eq!(recorded.len(), 2);

  let all = s.decisions_for_person(person.person_id, None).await.unwrap();
  assert_eq!(all, recorded);
  assert_eq!(all[0].status, Some(ConsentStatus::Declined));
  assert_eq!(all[1].status, None);

  let filtered = s
    .decisions_for_person(person.person_id, Some(&[analytics.category_id]))
    .await
    .unwrap();
  assert_eq!(filtered.len(), 1);
  assert_eq!(filtered[0].category_id, analytics.category_id);
}

#[test]
fn status_column_uses_lowercase_names() {
  use crate::{
    Error,
    encode::{decode_status, encode_status},
  };

  assert_eq!(encode_status(Some(ConsentStatus::Agreed)), Some("agreed"));
  assert_eq!(encode_status(Some(ConsentStatus::Declined)), Some("declined"));
  assert_eq!(encode_status(None), None);
  assert_eq!(
    decode_status(Some("declined")).unwrap(),
    Some(ConsentStatus::Declined)
  );
  assert!(matches!(
    decode_status(Some("maybe")),
    Err(Error::UnknownStatus(s)) if s == "maybe"
  ));
}

#[tokio::test]
async fn record_empty_batch() {
  let s = store().await;
  assert!(s.record_decisions(Vec::new()).await.unwrap().is_empty());
}

// ─── Resolver: person resolution ─────────────────────────────────────────────

#[tokio::test]
async fn guest_with_unknown_browser_creates_one_person() {
  let r = resolver().await;

  let first = r.resolve_person(&Caller::Guest, "b-1").await.unwrap().unwrap();
  assert_eq!(first.browser_id.as_deref(), Some("b-1"));
  assert_eq!(first.account_id, None);

  let again = r.resolve_person(&Caller::Guest, "b-1").await.unwrap().unwrap();
  assert_eq!(again.person_id, first.person_id);

  // A second row would make the lookup ambiguous.
  let found = r.store().find_person_by_browser("b-1").await.unwrap();
  assert_eq!(found.map(|p| p.person_id), Some(first.person_id));
}

#[tokio::test]
async fn member_with_linked_person_creates_nothing() {
  let r = resolver().await;
  let existing = r
    .store()
    .create_person(NewPerson::for_account("acc-1", "old-browser"))
    .await
    .unwrap();

  let resolved = r
    .resolve_person(&member("acc-1"), "new-browser")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(resolved.person_id, existing.person_id);
  assert!(
    r.store()
      .find_person_by_browser("new-browser")
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn member_without_person_gets_linked_person() {
  let r = resolver().await;

  let person = r
    .resolve_person(&member("acc-2"), "b-2")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(person.account_id.as_deref(), Some("acc-2"));
  assert_eq!(person.browser_id.as_deref(), Some("b-2"));

  let by_account = r.store().find_person_by_account("acc-2").await.unwrap();
  assert_eq!(by_account.map(|p| p.person_id), Some(person.person_id));
}

#[tokio::test]
async fn browser_match_wins_over_account() {
  let r = resolver().await;
  let anonymous = r
    .store()
    .create_person(NewPerson::anonymous("b-3"))
    .await
    .unwrap();
  r.store()
    .create_person(NewPerson::for_account("acc-3", "elsewhere"))
    .await
    .unwrap();

  let resolved = r
    .resolve_person(&member("acc-3"), "b-3")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(resolved.person_id, anonymous.person_id);
}

#[tokio::test]
async fn service_caller_gets_anonymous_person() {
  let r = resolver().await;
  let caller = Caller::Service { name: "sync".into() };

  let person = r.resolve_person(&caller, "b-4").await.unwrap().unwrap();
  assert_eq!(person.account_id, None);
}

#[tokio::test]
async fn empty_browser_id_resolves_nothing() {
  let r = resolver().await;
  assert!(r.resolve_person(&Caller::Guest, "").await.unwrap().is_none());
  assert!(!r.verify_browser_id(&Caller::Guest, "").await.unwrap());
  assert!(r.store().find_person_by_browser("").await.unwrap().is_none());
}

#[tokio::test]
async fn denied_person_fields_are_dropped_on_create() {
  let policy = FieldPolicy {
    member: [Field::PersonAccountId].into_iter().collect(),
    ..FieldPolicy::default()
  };
  let r = resolver().await.with_policy(Arc::new(policy));

  let person = r
    .resolve_person(&member("acc-5"), "b-5")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(person.account_id, None);
  assert_eq!(person.browser_id.as_deref(), Some("b-5"));
}

#[tokio::test]
async fn unaddressable_person_is_not_created() {
  let policy = FieldPolicy {
    guest: [Field::PersonBrowserId].into_iter().collect(),
    member: [Field::PersonAccountId, Field::PersonBrowserId]
      .into_iter()
      .collect(),
    ..FieldPolicy::default()
  };
  let r = resolver().await.with_policy(Arc::new(policy));

  for _ in 0..3 {
    assert!(r.resolve_person(&Caller::Guest, "b-6").await.unwrap().is_none());
    assert!(!r.verify_browser_id(&Caller::Guest, "b-6").await.unwrap());
    assert!(
      r.resolve_person(&member("acc-6"), "b-6")
        .await
        .unwrap()
        .is_none()
    );
  }
  assert_eq!(count_people(r.store()).await, 0);
}

// ─── Resolver: consent check ─────────────────────────────────────────────────

#[tokio::test]
async fn consent_requires_a_decision_for_every_category() {
  let r = resolver().await;
  let necessary = add_category_with_cookies(r.store(), "Necessary", &[]).await;
  let marketing = add_category_with_cookies(r.store(), "Marketing", &[]).await;
  let analytics = add_category_with_cookies(r.store(), "Analytics", &[]).await;

  assert!(!r.verify_browser_id(&Caller::Guest, "b-1").await.unwrap());

  r.record_decisions(
    &Caller::Guest,
    "b-1",
    &[submit(&necessary, "true"), submit(&marketing, "false")],
  )
  .await
  .unwrap();
  assert!(!r.verify_browser_id(&Caller::Guest, "b-1").await.unwrap());

  r.record_decisions(&Caller::Guest, "b-1", &[submit(&analytics, "false")])
    .await
    .unwrap();
  // Coverage counts, not acceptance: two declines still pass.
  assert!(r.verify_browser_id(&Caller::Guest, "b-1").await.unwrap());
}

#[tokio::test]
async fn repeated_decisions_on_one_category_count_towards_coverage() {
  let r = resolver().await;
  let marketing = add_category_with_cookies(r.store(), "Marketing", &[]).await;
  add_category_with_cookies(r.store(), "Analytics", &[]).await;

  assert!(!r.verify_browser_id(&Caller::Guest, "b-1").await.unwrap());
  r.record_decisions(
    &Caller::Guest,
    "b-1",
    &[submit(&marketing, "false"), submit(&marketing, "true")],
  )
  .await
  .unwrap();

  // Two rows for Marketing, none for Analytics: the count still matches.
  assert!(r.verify_browser_id(&Caller::Guest, "b-1").await.unwrap());
}

#[tokio::test]
async fn decisions_outside_the_filter_are_not_counted() {
  let s = store().await;
  let marketing = add_category_with_cookies(&s, "Marketing", &[]).await;
  let analytics = add_category_with_cookies(&s, "Analytics", &[]).await;
  let person = s.create_person(NewPerson::anonymous("b-1")).await.unwrap();

  s.record_decisions(
    [&marketing, &marketing, &analytics]
      .into_iter()
      .map(|c| NewDecision {
        person_id:       person.person_id,
        category_id:     c.category_id,
        status:          Some(ConsentStatus::Agreed),
        capture_source:  None,
        capture_channel: None,
      })
      .collect(),
  )
  .await
  .unwrap();

  let filter = [analytics.category_id];
  let counted = s
    .decisions_for_person(person.person_id, Some(filter.as_slice()))
    .await
    .unwrap();
  assert_eq!(counted.len(), 1);
  assert!(counted.iter().all(|d| d.category_id == analytics.category_id));
}

#[tokio::test]
async fn empty_catalog_counts_as_consented() {
  let r = resolver().await;
  assert!(r.verify_browser_id(&Caller::Guest, "b-1").await.unwrap());
}

// ─── Resolver: cookies to drop ───────────────────────────────────────────────

#[tokio::test]
async fn declined_categories_cookies_are_blocked() {
  let r = resolver().await;
  let marketing =
    add_category_with_cookies(r.store(), "Marketing", &["_fbp", "ads_id"]).await;
  let analytics = add_category_with_cookies(r.store(), "Analytics", &["_ga"]).await;
  add_category_with_cookies(r.store(), "Preferences", &["lang"]).await;

  r.resolve_person(&Caller::Guest, "b-1").await.unwrap();
  r.record_decisions(
    &Caller::Guest,
    "b-1",
    &[submit(&marketing, "false"), submit(&analytics, "true")],
  )
  .await
  .unwrap();

  let mut blocked = r.cookies_to_drop("b-1").await.unwrap();
  blocked.sort();
  assert_eq!(blocked, ["_fbp", "ads_id"]);
}

#[tokio::test]
async fn unknown_browser_blocks_nothing() {
  let r = resolver().await;
  add_category_with_cookies(r.store(), "Marketing", &["_fbp"]).await;
  assert!(r.cookies_to_drop("nobody").await.unwrap().is_empty());
  assert!(r.cookies_to_drop("").await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_declines_do_not_duplicate_cookies() {
  let r = resolver().await;
  let marketing = add_category_with_cookies(r.store(), "Marketing", &["_fbp"]).await;

  r.resolve_person(&Caller::Guest, "b-1").await.unwrap();
  for _ in 0..2 {
    r.record_decisions(&Caller::Guest, "b-1", &[submit(&marketing, "false")])
      .await
      .unwrap();
  }
  assert_eq!(r.cookies_to_drop("b-1").await.unwrap(), ["_fbp"]);
}

// ─── Resolver: prompt data ───────────────────────────────────────────────────

#[tokio::test]
async fn prompt_data_for_empty_catalog() {
  let r = resolver().await;
  assert!(r.cookie_data().await.unwrap().is_empty());
}

#[tokio::test]
async fn prompt_data_single_category_is_expanded() {
  let r = resolver().await;
  add_category_with_cookies(r.store(), "Necessary", &["session"]).await;

  let prompt = r.cookie_data().await.unwrap();
  assert_eq!(prompt.len(), 1);
  assert!(prompt[0].expanded);
  assert_eq!(prompt[0].chevron, Chevron::Down);
  assert_eq!(prompt[0].cookies.len(), 1);
}

#[tokio::test]
async fn prompt_data_only_first_category_is_expanded() {
  let r = resolver().await;
  let necessary = add_category_with_cookies(r.store(), "Necessary", &["session"]).await;
  add_category_with_cookies(r.store(), "Marketing", &["_fbp", "ads_id"]).await;
  add_category_with_cookies(r.store(), "Analytics", &[]).await;

  let prompt = r.cookie_data().await.unwrap();
  let names: Vec<_> = prompt.iter().map(|p| p.name.as_str()).collect();
  assert_eq!(names, ["Necessary", "Marketing", "Analytics"]);

  assert_eq!(prompt[0].category_id, necessary.category_id);
  assert_eq!(prompt[0].description, "Necessary cookies");
  assert!(prompt[0].expanded);
  assert_eq!(prompt[0].chevron, Chevron::Down);
  for p in &prompt[1..] {
    assert!(!p.expanded);
    assert_eq!(p.chevron, Chevron::Right);
  }

  let cookie_names: Vec<_> =
    prompt[1].cookies.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(cookie_names, ["_fbp", "ads_id"]);
  assert!(prompt[2].cookies.is_empty());
}

// ─── Resolver: recording ─────────────────────────────────────────────────────

#[tokio::test]
async fn prompt_values_map_to_statuses() {
  let r = resolver().await;
  let a = add_category_with_cookies(r.store(), "A", &[]).await;
  let b = add_category_with_cookies(r.store(), "B", &[]).await;
  let c = add_category_with_cookies(r.store(), "C", &[]).await;
  let person = r.resolve_person(&Caller::Guest, "b-1").await.unwrap().unwrap();

  let ok = r
    .record_decisions(
      &Caller::Guest,
      "b-1",
      &[submit(&a, "true"), submit(&b, "false"), submit(&c, "yes")],
    )
    .await
    .unwrap();
  assert!(ok);

  let history = r.decision_history(person.person_id).await.unwrap();
  let statuses: Vec<_> = history.iter().map(|d| d.status).collect();
  assert_eq!(
    statuses,
    [Some(ConsentStatus::Agreed), Some(ConsentStatus::Declined), None]
  );
  assert!(history.iter().all(|d| d.capture_source.as_deref() == Some("community")));
  assert!(history.iter().all(|d| d.capture_channel.as_deref() == Some("web")));
}

#[tokio::test]
async fn recording_for_unknown_browser_fails() {
  let r = resolver().await;
  let a = add_category_with_cookies(r.store(), "A", &[]).await;

  let err = r
    .record_decisions(&Caller::Guest, "nobody", &[submit(&a, "true")])
    .await
    .unwrap_err();
  assert!(matches!(err, ServiceError::Domain(CoreError::PersonNotFound(ref b)) if b == "nobody"));
}

#[tokio::test]
async fn unknown_category_rejects_the_whole_batch() {
  let r = resolver().await;
  let a = add_category_with_cookies(r.store(), "A", &[]).await;
  let person = r.resolve_person(&Caller::Guest, "b-1").await.unwrap().unwrap();
  let missing = Uuid::new_v4();

  let err = r
    .record_decisions(
      &Caller::Guest,
      "b-1",
      &[
        submit(&a, "true"),
        DecisionInput { category_id: missing, value: "true".into() },
      ],
    )
    .await
    .unwrap_err();
  assert!(matches!(err, ServiceError::Domain(CoreError::CategoryNotFound(id)) if id == missing));

  let history = r.decision_history(person.person_id).await.unwrap();
  assert!(history.is_empty());
}

#[tokio::test]
async fn denied_decision_fields_are_dropped_silently() {
  let policy = FieldPolicy {
    guest: [Field::DecisionCaptureSource].into_iter().collect(),
    ..FieldPolicy::default()
  };
  let r = resolver()
    .await
    .with_policy(Arc::new(policy))
    .with_capture(Capture {
      source:  Some("members".into()),
      channel: Some("banner".into()),
    });
  let a = add_category_with_cookies(r.store(), "A", &[]).await;
  let person = r.resolve_person(&Caller::Guest, "b-1").await.unwrap().unwrap();

  assert!(
    r.record_decisions(&Caller::Guest, "b-1", &[submit(&a, "true")])
      .await
      .unwrap()
  );

  let history = r.decision_history(person.person_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].status, Some(ConsentStatus::Agreed));
  assert_eq!(history[0].capture_source, None);
  assert_eq!(history[0].capture_channel.as_deref(), Some("banner"));
}

// ─── Admin ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_cookie_to_unknown_category_fails() {
  let r = resolver().await;
  let missing = Uuid::new_v4();
  let err = r
    .add_cookie(NewCookie {
      category_id: missing,
      name:        "_ga".into(),
      description: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, ServiceError::Domain(CoreError::CategoryNotFound(id)) if id == missing));
}

#[tokio::test]
async fn seeding_skips_existing_categories() {
  let r = resolver().await;
  let seed = CategorySeed {
    category: category("Analytics"),
    cookies:  vec![CookieSeed { name: "_ga".into(), description: None }],
  };

  assert!(r.seed_category(seed.clone()).await.unwrap().is_some());
  assert!(r.seed_category(seed).await.unwrap().is_none());

  assert_eq!(r.categories().await.unwrap().len(), 1);
  assert_eq!(r.store().list_cookies(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn history_for_unknown_person_fails() {
  let r = resolver().await;
  let err = r.decision_history(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, ServiceError::Domain(CoreError::UnknownPerson(_))));
}
