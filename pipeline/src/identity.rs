// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Author identity resolution against the TwiBot-22 label table
//!
//! The lookup table is built once per run and never mutated afterwards, so a
//! single `&IdentityTable` can be shared by every worker. Resolution is a pure
//! function of the inputs: exact user id first, then normalized username,
//! otherwise unresolved. Unresolved authors keep a null label.

use crate::datasets::{AccountRecord, LabelRecord};
use crate::records::{AuthorIdentity, BotLabel, MatchSource, SourceDataset, UnresolvedReason};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdEntry {
    Labeled(BotLabel),
    /// The label table disagrees with itself for this id
    Conflicting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HandleEntry {
    Unique(String),
    /// Several distinct accounts share this handle
    Shared,
}

/// Normalize a platform user id
///
/// Strips the TwiBot-22 `u` prefix and the `.0` suffix spreadsheets add to
/// numeric ids. Returns `None` for empty or placeholder values.
pub fn normalize_user_id(raw: &str) -> Option<String> {
    let mut id = raw.trim();
    if id.is_empty() || matches!(id.to_lowercase().as_str(), "nan" | "null" | "none") {
        return None;
    }
    if let Some(rest) = id.strip_prefix('u').or_else(|| id.strip_prefix('U')) {
        if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
            id = rest;
        }
    }
    if let Some(rest) = id.strip_suffix(".0") {
        if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
            id = rest;
        }
    }
    Some(id.to_string())
}

/// Normalize a screen name: trim, drop a leading `@`, lowercase
pub fn normalize_username(raw: &str) -> Option<String> {
    let name = raw.trim().trim_start_matches('@').to_lowercase();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Read-only lookup from ids and handles to bot/human labels
#[derive(Debug, Clone, Default)]
pub struct IdentityTable {
    by_id: HashMap<String, IdEntry>,
    by_username: HashMap<String, HandleEntry>,
}

impl IdentityTable {
    pub fn build(accounts: &[AccountRecord], labels: &[LabelRecord]) -> Self {
        let mut by_id: HashMap<String, IdEntry> = HashMap::new();
        for record in labels {
            let Some(id) = normalize_user_id(&record.user_id) else {
                continue;
            };
            by_id
                .entry(id)
                .and_modify(|entry| {
                    if *entry != IdEntry::Labeled(record.label) {
                        *entry = IdEntry::Conflicting;
                    }
                })
                .or_insert(IdEntry::Labeled(record.label));
        }

        let mut by_username: HashMap<String, HandleEntry> = HashMap::new();
        for account in accounts {
            let (Some(id), Some(name)) = (
                account.user_id.as_deref().and_then(normalize_user_id),
                account.username.as_deref().and_then(normalize_username),
            ) else {
                continue;
            };
            by_username
                .entry(name)
                .and_modify(|entry| {
                    if *entry != HandleEntry::Unique(id.clone()) {
                        *entry = HandleEntry::Shared;
                    }
                })
                .or_insert(HandleEntry::Unique(id));
        }

        let conflicting = by_id.values().filter(|e| **e == IdEntry::Conflicting).count();
        let shared = by_username.values().filter(|e| **e == HandleEntry::Shared).count();
        tracing::info!(
            "Identity table: {} labeled ids ({} conflicting), {} handles ({} shared)",
            by_id.len(),
            conflicting,
            by_username.len(),
            shared
        );

        Self { by_id, by_username }
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Resolve a post author to an identity
    ///
    /// All current sources are Twitter exports sharing one id space, so the
    /// source dataset only feeds the debug log.
    pub fn resolve(&self, source: SourceDataset, user_id: Option<&str>, username: Option<&str>) -> AuthorIdentity {
        let id = user_id.and_then(normalize_user_id);
        let handle = username.and_then(normalize_username);

        if let Some(id) = &id {
            match self.by_id.get(id) {
                Some(IdEntry::Labeled(label)) => {
                    return AuthorIdentity {
                        user_id: Some(id.clone()),
                        bot_label: Some(*label),
                        source: MatchSource::ExactId,
                    };
                }
                Some(IdEntry::Conflicting) => {
                    tracing::debug!("{}: conflicting labels for user {}", source, id);
                    return AuthorIdentity::unresolved(Some(id.clone()), UnresolvedReason::Ambiguous);
                }
                None => {}
            }
        }

        let fallback_key = id.clone().or_else(|| handle.as_ref().map(|h| format!("@{}", h)));

        let Some(handle) = handle else {
            let reason = if id.is_some() {
                UnresolvedReason::NoMatch
            } else {
                UnresolvedReason::MissingId
            };
            return AuthorIdentity::unresolved(fallback_key, reason);
        };

        match self.by_username.get(&handle) {
            // The handle belongs to another account than the one that posted
            Some(HandleEntry::Unique(matched_id)) if id.as_ref().is_some_and(|own| own != matched_id) => {
                tracing::debug!("{}: handle @{} belongs to user {}, not the posting id", source, handle, matched_id);
                AuthorIdentity::unresolved(fallback_key, UnresolvedReason::Ambiguous)
            }
            Some(HandleEntry::Unique(matched_id)) => match self.by_id.get(matched_id) {
                Some(IdEntry::Labeled(label)) => AuthorIdentity {
                    user_id: Some(id.unwrap_or_else(|| matched_id.clone())),
                    bot_label: Some(*label),
                    source: MatchSource::Username,
                },
                Some(IdEntry::Conflicting) => {
                    AuthorIdentity::unresolved(fallback_key, UnresolvedReason::Ambiguous)
                }
                None => AuthorIdentity::unresolved(fallback_key, UnresolvedReason::NoMatch),
            },
            Some(HandleEntry::Shared) => {
                tracing::debug!("{}: handle @{} maps to several accounts", source, handle);
                AuthorIdentity::unresolved(fallback_key, UnresolvedReason::Ambiguous)
            }
            None => {
                let reason = if id.is_some() {
                    UnresolvedReason::NoMatch
                } else {
                    UnresolvedReason::MissingId
                };
                AuthorIdentity::unresolved(fallback_key, reason)
            }
        }
    }
}

/// Tally of identity resolution outcomes, one entry per emitted post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub exact_id: usize,
    pub username: usize,
    pub missing_id: usize,
    pub no_match: usize,
    pub ambiguous: usize,
}

impl MatchStats {
    pub fn record(&mut self, source: MatchSource) {
        match source {
            MatchSource::ExactId => self.exact_id += 1,
            MatchSource::Username => self.username += 1,
            MatchSource::Unresolved(UnresolvedReason::MissingId) => self.missing_id += 1,
            MatchSource::Unresolved(UnresolvedReason::NoMatch) => self.no_match += 1,
            MatchSource::Unresolved(UnresolvedReason::Ambiguous) => self.ambiguous += 1,
        }
    }

    pub fn resolved(&self) -> usize {
        self.exact_id + self.username
    }

    pub fn unresolved(&self) -> usize {
        self.missing_id + self.no_match + self.ambiguous
    }

    pub fn total(&self) -> usize {
        self.resolved() + self.unresolved()
    }

    pub fn match_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.resolved() as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> IdentityTable {
        let accounts = vec![
            AccountRecord { user_id: Some("u1".into()), username: Some("Alice".into()) },
            AccountRecord { user_id: Some("u2".into()), username: Some("bob".into()) },
            AccountRecord { user_id: Some("u3".into()), username: Some("twin".into()) },
            AccountRecord { user_id: Some("u4".into()), username: Some("twin".into()) },
            AccountRecord { user_id: Some("u5".into()), username: Some("flipflop".into()) },
        ];
        let labels = vec![
            LabelRecord { user_id: "u1".into(), label: BotLabel::Human },
            LabelRecord { user_id: "u2".into(), label: BotLabel::Bot },
            LabelRecord { user_id: "u3".into(), label: BotLabel::Bot },
            LabelRecord { user_id: "u4".into(), label: BotLabel::Human },
            LabelRecord { user_id: "u5".into(), label: BotLabel::Bot },
            LabelRecord { user_id: "u5".into(), label: BotLabel::Human },
        ];
        IdentityTable::build(&accounts, &labels)
    }

    #[test]
    fn test_normalize_user_id() {
        assert_eq!(normalize_user_id("u12345"), Some("12345".to_string()));
        assert_eq!(normalize_user_id(" 12345.0 "), Some("12345".to_string()));
        assert_eq!(normalize_user_id("user"), Some("user".to_string()));
        assert_eq!(normalize_user_id("nan"), None);
        assert_eq!(normalize_user_id(""), None);
    }

    #[test]
    fn test_exact_id_takes_priority() {
        let table = table();
        // Handle points at a different account, id wins
        let identity = table.resolve(SourceDataset::CoAid, Some("2"), Some("alice"));

        assert_eq!(identity.bot_label, Some(BotLabel::Bot));
        assert_eq!(identity.source, MatchSource::ExactId);
        assert_eq!(identity.user_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_handle_of_other_account_is_ambiguous() {
        let accounts = vec![
            AccountRecord { user_id: Some("u1".into()), username: Some("alice".into()) },
            AccountRecord { user_id: Some("u999".into()), username: Some("zed".into()) },
        ];
        let labels = vec![LabelRecord { user_id: "u1".into(), label: BotLabel::Bot }];
        let table = IdentityTable::build(&accounts, &labels);

        let with_handle = table.resolve(SourceDataset::CoAid, Some("999"), Some("alice"));
        let without_handle = table.resolve(SourceDataset::CoAid, Some("999"), None);

        assert_eq!(with_handle.bot_label, None);
        assert_eq!(with_handle.source, MatchSource::Unresolved(UnresolvedReason::Ambiguous));
        assert_eq!(with_handle.user_id.as_deref(), Some("999"));
        assert_eq!(without_handle.bot_label, None);
    }

    #[test]
    fn test_username_fallback() {
        let table = table();
        let identity = table.resolve(SourceDataset::CoAid, None, Some("@ALICE"));

        assert_eq!(identity.bot_label, Some(BotLabel::Human));
        assert_eq!(identity.source, MatchSource::Username);
        assert_eq!(identity.user_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_unmatched_author_keeps_null_label() {
        let table = table();
        let identity = table.resolve(SourceDataset::CoAid, Some("999"), Some("stranger"));

        assert_eq!(identity.bot_label, None);
        assert_eq!(identity.source, MatchSource::Unresolved(UnresolvedReason::NoMatch));
        assert_eq!(identity.user_id.as_deref(), Some("999"));
    }

    #[test]
    fn test_missing_fields_are_unresolved_not_errors() {
        let table = table();
        let identity = table.resolve(SourceDataset::CoAid, Some("nan"), None);

        assert_eq!(identity.bot_label, None);
        assert_eq!(identity.source, MatchSource::Unresolved(UnresolvedReason::MissingId));
        assert_eq!(identity.user_id, None);
    }

    #[test]
    fn test_shared_handle_is_ambiguous() {
        let table = table();
        let identity = table.resolve(SourceDataset::CoAid, None, Some("twin"));

        assert_eq!(identity.bot_label, None);
        assert_eq!(identity.source, MatchSource::Unresolved(UnresolvedReason::Ambiguous));
        assert_eq!(identity.user_id.as_deref(), Some("@twin"));
    }

    #[test]
    fn test_conflicting_labels_are_ambiguous() {
        let table = table();
        let identity = table.resolve(SourceDataset::CoAid, Some("u5"), None);

        assert_eq!(identity.bot_label, None);
        assert_eq!(identity.source, MatchSource::Unresolved(UnresolvedReason::Ambiguous));
    }

    #[test]
    fn test_match_stats() {
        let table = table();
        let mut stats = MatchStats::default();
        for (id, name) in [(Some("1"), None), (None, Some("bob")), (Some("404"), None), (None, Some("twin"))] {
            stats.record(table.resolve(SourceDataset::Synthetic, id, name).source);
        }

        assert_eq!(stats.exact_id, 1);
        assert_eq!(stats.username, 1);
        assert_eq!(stats.no_match, 1);
        assert_eq!(stats.ambiguous, 1);
        assert_eq!(stats.unresolved(), 2);
        assert!((stats.match_rate() - 0.5).abs() < 1e-9);
    }
}
