//! Community message repository.
//!
//! Threads are one level deep: root messages have no parent and replies point
//! at a root. Soft-deleted rows never leave this repository through a read.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{
    CommunityMessage, MessageReport, User,
    community_message::{self, Column},
    message_report::{self, DEFAULT_REASON},
    user,
};
use crate::error::classify;
use chrono::Utc;
use community_common::{AppError, AppResult, config::PaginationConfig};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query for one page of a thread level.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u64,
    /// Page size. Falls back to the configured default.
    #[validate(range(min = 1))]
    pub limit: Option<u64>,
    /// `None` lists root messages, `Some(id)` lists direct replies to `id`.
    #[validate(range(min = 1))]
    pub parent_id: Option<i32>,
}

const fn default_page() -> u64 {
    1
}

impl Default for ListMessagesQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: None,
            parent_id: None,
        }
    }
}

impl ListMessagesQuery {
    /// Root messages on the given page.
    #[must_use]
    pub const fn roots(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit: Some(limit),
            parent_id: None,
        }
    }

    /// Direct replies to `parent_id` on the given page.
    #[must_use]
    pub const fn replies(parent_id: i32, page: u64, limit: u64) -> Self {
        Self {
            page,
            limit: Some(limit),
            parent_id: Some(parent_id),
        }
    }
}

/// Input for creating a message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageInput {
    /// Message body, stored as given.
    pub content: String,
    /// Posting user.
    #[validate(range(min = 1))]
    pub author_id: i32,
    /// Message being replied to, `None` for a root message.
    #[validate(range(min = 1))]
    pub parent_id: Option<i32>,
}

/// Input for reporting a message.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportMessageInput {
    /// Reported message. Deleted messages can be reported.
    #[validate(range(min = 1))]
    pub message_id: i32,
    /// Reporting user.
    #[validate(range(min = 1))]
    pub reporter_id: i32,
    /// Empty or missing reasons are stored as [`DEFAULT_REASON`].
    pub reason: Option<String>,
}

/// A message joined with its author's public fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageWithAuthor {
    /// The message row, flattened into the serialized object.
    #[serde(flatten)]
    pub message: community_message::Model,
    /// Public fields of the author, serialized as `user`.
    #[serde(rename = "user")]
    pub author: user::Model,
}

/// A listed message with its author and the number of visible replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSummary {
    /// The message row, flattened into the serialized object.
    #[serde(flatten)]
    pub message: community_message::Model,
    /// Public fields of the author, serialized as `user`.
    #[serde(rename = "user")]
    pub author: user::Model,
    /// Non-deleted direct replies.
    pub reply_count: u64,
}

/// One page of a thread level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Newest first.
    pub messages: Vec<MessageSummary>,
    /// Non-deleted messages at this level, ignoring pagination.
    pub total_count: u64,
}

/// A message with its direct replies, oldest reply first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageThread {
    /// The message row, flattened into the serialized object.
    #[serde(flatten)]
    pub message: community_message::Model,
    /// Public fields of the author, serialized as `user`.
    #[serde(rename = "user")]
    pub author: user::Model,
    /// Non-deleted direct replies.
    pub replies: Vec<MessageWithAuthor>,
}

#[derive(Debug, FromQueryResult)]
struct ReplyCount {
    parent_id: i32,
    reply_count: i64,
}

/// Repository for community messages and their reports.
#[derive(Clone)]
pub struct CommunityMessageRepository {
    db: Arc<DatabaseConnection>,
    pagination: PaginationConfig,
}

impl CommunityMessageRepository {
    /// Create a new community message repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            pagination: PaginationConfig::default(),
        }
    }

    /// Use configured page size limits instead of the defaults.
    #[must_use]
    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// List one page of root messages or of replies to a message.
    pub async fn list_messages(&self, query: ListMessagesQuery) -> AppResult<MessagePage> {
        query.validate()?;
        let limit = query.limit.unwrap_or(self.pagination.default_limit);
        let offset = self.page_offset(query.page, limit)?;

        let total_count = visible_in_thread(query.parent_id)
            .count(self.db.as_ref())
            .await
            .map_err(classify)?;

        let rows = visible_in_thread(query.parent_id)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .find_also_related(User)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(classify)?;

        let ids: Vec<i32> = rows.iter().map(|(message, _)| message.id).collect();
        let reply_counts = self.count_visible_replies(&ids).await?;

        let messages = rows
            .into_iter()
            .map(|(message, author)| {
                let author = require_author(&message, author)?;
                let reply_count = reply_counts.get(&message.id).copied().unwrap_or(0);
                Ok(MessageSummary {
                    message,
                    author,
                    reply_count,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        tracing::debug!(
            parent_id = ?query.parent_id,
            page = query.page,
            limit,
            returned = messages.len(),
            total_count,
            "Listed community messages"
        );

        Ok(MessagePage {
            messages,
            total_count,
        })
    }

    /// Get a message with its direct replies.
    ///
    /// Deleted messages are reported as absent.
    pub async fn get_message_with_replies(
        &self,
        message_id: i32,
    ) -> AppResult<Option<MessageThread>> {
        ensure_id("message_id", message_id)?;

        let Some((message, author)) = CommunityMessage::find_by_id(message_id)
            .filter(Column::IsDeleted.eq(false))
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(classify)?
        else {
            return Ok(None);
        };
        let author = require_author(&message, author)?;

        let replies = visible_in_thread(Some(message_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .find_also_related(User)
            .all(self.db.as_ref())
            .await
            .map_err(classify)?
            .into_iter()
            .map(|(reply, author)| {
                let author = require_author(&reply, author)?;
                Ok(MessageWithAuthor {
                    message: reply,
                    author,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Some(MessageThread {
            message,
            author,
            replies,
        }))
    }

    /// Create a root message or a reply.
    pub async fn create_message(
        &self,
        input: CreateMessageInput,
    ) -> AppResult<community_message::Model> {
        input.validate()?;
        let now = Utc::now();

        let model = community_message::ActiveModel {
            content: Set(input.content),
            author_id: Set(input.author_id),
            parent_id: Set(input.parent_id),
            is_deleted: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let message = model.insert(self.db.as_ref()).await.map_err(classify)?;

        tracing::info!(
            message_id = message.id,
            author_id = message.author_id,
            parent_id = ?message.parent_id,
            "Created community message"
        );

        Ok(message)
    }

    /// Soft delete a message.
    ///
    /// Deleting an already deleted message succeeds again. No ownership check
    /// is made here.
    pub async fn delete_message(&self, id: i32) -> AppResult<community_message::Model> {
        ensure_id("id", id)?;

        let model = community_message::ActiveModel {
            id: Unchanged(id),
            is_deleted: Set(true),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let message = model.update(self.db.as_ref()).await.map_err(|e| match e {
            DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => {
                AppError::NotFound(format!("Message {id} not found"))
            }
            other => classify(other),
        })?;

        tracing::info!(message_id = id, "Soft deleted community message");

        Ok(message)
    }

    /// File a report against a message.
    ///
    /// Reports are never deduplicated and may target deleted messages.
    pub async fn report_message(
        &self,
        input: ReportMessageInput,
    ) -> AppResult<message_report::Model> {
        input.validate()?;

        let reason = input
            .reason
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| DEFAULT_REASON.to_string());

        let model = message_report::ActiveModel {
            message_id: Set(input.message_id),
            reporter_id: Set(input.reporter_id),
            reason: Set(reason),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let report = model.insert(self.db.as_ref()).await.map_err(classify)?;

        tracing::info!(
            report_id = report.id,
            message_id = report.message_id,
            reporter_id = report.reporter_id,
            "Message reported"
        );

        Ok(report)
    }

    /// List reports filed against a message, newest first.
    pub async fn list_reports(
        &self,
        message_id: i32,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<message_report::Model>> {
        ensure_id("message_id", message_id)?;
        self.ensure_limit(limit)?;
        let offset = ensure_offset(offset)?;

        MessageReport::find()
            .filter(message_report::Column::MessageId.eq(message_id))
            .order_by_desc(message_report::Column::CreatedAt)
            .order_by_desc(message_report::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(classify)
    }

    /// Count reports filed against a message.
    pub async fn count_reports(&self, message_id: i32) -> AppResult<u64> {
        ensure_id("message_id", message_id)?;

        MessageReport::find()
            .filter(message_report::Column::MessageId.eq(message_id))
            .count(self.db.as_ref())
            .await
            .map_err(classify)
    }

    /// Non-deleted reply counts keyed by parent id.
    async fn count_visible_replies(&self, parent_ids: &[i32]) -> AppResult<HashMap<i32, u64>> {
        if parent_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let counts = CommunityMessage::find()
            .select_only()
            .column(Column::ParentId)
            .column_as(Expr::col(Column::Id).count(), "reply_count")
            .filter(Column::ParentId.is_in(parent_ids.iter().copied()))
            .filter(Column::IsDeleted.eq(false))
            .group_by(Column::ParentId)
            .into_model::<ReplyCount>()
            .all(self.db.as_ref())
            .await
            .map_err(classify)?;

        Ok(counts
            .into_iter()
            .map(|c| (c.parent_id, u64::try_from(c.reply_count).unwrap_or(0)))
            .collect())
    }

    fn ensure_limit(&self, limit: u64) -> AppResult<()> {
        if limit == 0 || limit > self.pagination.max_limit {
            return Err(AppError::InvalidArgument(format!(
                "limit must be between 1 and {}",
                self.pagination.max_limit
            )));
        }
        Ok(())
    }

    fn page_offset(&self, page: u64, limit: u64) -> AppResult<u64> {
        self.ensure_limit(limit)?;
        let offset = page
            .checked_sub(1)
            .and_then(|p| p.checked_mul(limit))
            .ok_or_else(|| AppError::InvalidArgument(format!("page {page} is out of range")))?;
        ensure_offset(offset)
    }
}

/// Offsets are bound as signed 64-bit integers by the store.
fn ensure_offset(offset: u64) -> AppResult<u64> {
    i64::try_from(offset)
        .map(|_| offset)
        .map_err(|_| AppError::InvalidArgument(format!("offset {offset} is out of range")))
}

/// Non-deleted messages directly under `parent_id` (roots when `None`).
fn visible_in_thread(parent_id: Option<i32>) -> Select<CommunityMessage> {
    let parent = match parent_id {
        Some(id) => Column::ParentId.eq(id),
        None => Column::ParentId.is_null(),
    };

    CommunityMessage::find().filter(
        Condition::all()
            .add(parent)
            .add(Column::IsDeleted.eq(false)),
    )
}

fn ensure_id(name: &str, id: i32) -> AppResult<()> {
    if id < 1 {
        return Err(AppError::InvalidArgument(format!(
            "{name} must be a positive id, got {id}"
        )));
    }
    Ok(())
}

fn require_author(
    message: &community_message::Model,
    author: Option<user::Model>,
) -> AppResult<user::Model> {
    author.ok_or_else(|| {
        AppError::Internal(format!(
            "Author {} of message {} is missing",
            message.author_id, message.id
        ))
    })
}
