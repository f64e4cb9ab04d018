//! Usage statistics.

use crate::error::Result;
use crate::store::HistoryStore;
use chatvault_core::{Conversation, OwnerId, Platform};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregates over one owner's conversations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageStats {
    pub total_conversations: usize,
    pub total_messages: usize,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub by_platform: Vec<PlatformUsage>,
    pub by_model: Vec<ModelUsage>,
    /// Ordered by (year, month).
    pub monthly_usage: Vec<MonthlyUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformUsage {
    pub platform: Platform,
    pub count: usize,
    pub tokens: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelUsage {
    pub model: String,
    pub count: usize,
    pub tokens: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyUsage {
    pub year: i32,
    pub month: u32,
    pub conversations: usize,
    pub tokens: u64,
    pub cost: f64,
}

#[derive(Default)]
struct Bucket {
    count: usize,
    tokens: u64,
    cost: f64,
}

impl Bucket {
    fn add(&mut self, conversation: &Conversation) {
        self.count += 1;
        self.tokens += conversation.total_tokens;
        self.cost += conversation.total_cost;
    }
}

impl UsageStats {
    /// Aggregate conversation totals. Months are keyed by creation date.
    pub fn collect<'a>(
        conversations: impl IntoIterator<Item = &'a Conversation>,
        total_messages: usize,
    ) -> Self {
        let mut stats = UsageStats {
            total_messages,
            ..Default::default()
        };
        let mut platforms: BTreeMap<Platform, Bucket> = BTreeMap::new();
        let mut models: BTreeMap<String, Bucket> = BTreeMap::new();
        let mut months: BTreeMap<(i32, u32), Bucket> = BTreeMap::new();

        for conversation in conversations {
            stats.total_conversations += 1;
            stats.total_tokens += conversation.total_tokens;
            stats.total_cost += conversation.total_cost;

            platforms.entry(conversation.platform).or_default().add(conversation);
            models
                .entry(conversation.model.clone())
                .or_default()
                .add(conversation);
            let created = conversation.created_at;
            months
                .entry((created.year(), created.month()))
                .or_default()
                .add(conversation);
        }

        stats.by_platform = platforms
            .into_iter()
            .map(|(platform, b)| PlatformUsage {
                platform,
                count: b.count,
                tokens: b.tokens,
                cost: b.cost,
            })
            .collect();
        stats.by_model = models
            .into_iter()
            .map(|(model, b)| ModelUsage {
                model,
                count: b.count,
                tokens: b.tokens,
                cost: b.cost,
            })
            .collect();
        stats.monthly_usage = months
            .into_iter()
            .map(|((year, month), b)| MonthlyUsage {
                year,
                month,
                conversations: b.count,
                tokens: b.tokens,
                cost: b.cost,
            })
            .collect();
        stats
    }
}

impl HistoryStore {
    /// Usage statistics for one owner.
    pub async fn usage_stats(&self, owner: &OwnerId) -> Result<UsageStats> {
        self.read(|state| {
            let owned: Vec<&Conversation> = state
                .conversations
                .values()
                .filter(|c| &c.owner == owner)
                .collect();
            let messages = state
                .messages
                .values()
                .filter(|m| state.message_owner(m) == Some(owner))
                .count();
            Ok(UsageStats::collect(owned, messages))
        })
        .await
    }
}
