//! Field-level access policy applied to every record before it is written.
//!
//! A policy decides, per caller and per field, whether the caller may set
//! that field on a new record. Fields the caller may not set are cleared
//! silently; the write still goes ahead without them.

use std::collections::HashSet;

use serde::Deserialize;

use crate::{
  caller::{Caller, CallerKind},
  decision::NewDecision,
  person::NewPerson,
};

/// An optional field on a record created by the resolver.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
  PersonAccountId,
  PersonBrowserId,
  DecisionStatus,
  DecisionCaptureSource,
  DecisionCaptureChannel,
}

pub trait AccessPolicy: Send + Sync {
  /// Whether `caller` may set `field` on a newly created record.
  fn can_create(&self, caller: &Caller, field: Field) -> bool;
}

/// Permits every field for every caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
  fn can_create(&self, _caller: &Caller, _field: Field) -> bool { true }
}

/// A deny-list of fields per caller kind, usually read from configuration.
///
/// ```toml
/// [policy]
/// guest = ["decision_capture_source"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldPolicy {
  #[serde(default)]
  pub guest:   HashSet<Field>,
  #[serde(default)]
  pub service: HashSet<Field>,
  #[serde(default)]
  pub member:  HashSet<Field>,
}

impl FieldPolicy {
  fn denied(&self, kind: CallerKind) -> &HashSet<Field> {
    match kind {
      CallerKind::Guest => &self.guest,
      CallerKind::Service => &self.service,
      CallerKind::Member => &self.member,
    }
  }
}

impl AccessPolicy for FieldPolicy {
  fn can_create(&self, caller: &Caller, field: Field) -> bool {
    !self.denied(caller.kind()).contains(&field)
  }
}

// ─── Redaction ───────────────────────────────────────────────────────────────

/// A write payload whose optional fields can be stripped by a policy.
pub trait Redact {
  /// Clear every populated field `caller` may not create. Returns the fields
  /// that were dropped.
  fn redact<P: AccessPolicy + ?Sized>(
    &mut self,
    policy: &P,
    caller: &Caller,
  ) -> Vec<Field>;
}

fn strip<T, P: AccessPolicy + ?Sized>(
  slot: &mut Option<T>,
  field: Field,
  policy: &P,
  caller: &Caller,
  dropped: &mut Vec<Field>,
) {
  if slot.is_some() && !policy.can_create(caller, field) {
    *slot = None;
    dropped.push(field);
  }
}

impl Redact for NewPerson {
  fn redact<P: AccessPolicy + ?Sized>(
    &mut self,
    policy: &P,
    caller: &Caller,
  ) -> Vec<Field> {
    let mut dropped = Vec::new();
    strip(&mut self.account_id, Field::PersonAccountId, policy, caller, &mut dropped);
    strip(&mut self.browser_id, Field::PersonBrowserId, policy, caller, &mut dropped);
    dropped
  }
}

impl Redact for NewDecision {
  fn redact<P: AccessPolicy + ?Sized>(
    &mut self,
    policy: &P,
    caller: &Caller,
  ) -> Vec<Field> {
    let mut dropped = Vec::new();
    strip(&mut self.status, Field::DecisionStatus, policy, caller, &mut dropped);
    strip(
      &mut self.capture_source,
      Field::DecisionCaptureSource,
      policy,
      caller,
      &mut dropped,
    );
    strip(
      &mut self.capture_channel,
      Field::DecisionCaptureChannel,
      policy,
      caller,
      &mut dropped,
    );
    dropped
  }
}
