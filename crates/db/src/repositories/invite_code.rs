//! Invite code repository.

use std::sync::Arc;

use crate::entities::{InviteCode, invite_code, profile};
use grantdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait, sea_query::Expr,
};

/// Invite code repository for database operations.
#[derive(Clone)]
pub struct InviteCodeRepository {
    db: Arc<DatabaseConnection>,
}

impl InviteCodeRepository {
    /// Create a new invite code repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an invite by its code.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<invite_code::Model>> {
        InviteCode::find()
            .filter(invite_code::Column::Code.eq(code))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new invite code.
    pub async fn create(&self, model: invite_code::ActiveModel) -> AppResult<invite_code::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Consume one use of an invite and create the profile it admits.
    ///
    /// Both writes run in one transaction. Returns `None`, writing nothing,
    /// when the invite is already exhausted.
    pub async fn redeem(
        &self,
        invite_id: &str,
        profile: profile::ActiveModel,
    ) -> AppResult<Option<profile::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !consume(&txn, invite_id).await? {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(None);
        }

        let created = profile
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(created))
    }
}

/// Consume one use of an invite (single conditional UPDATE).
///
/// Returns `false` when the invite is already exhausted.
async fn consume<C: ConnectionTrait>(db: &C, id: &str) -> AppResult<bool> {
    let result = InviteCode::update_many()
        .col_expr(
            invite_code::Column::Uses,
            Expr::col(invite_code::Column::Uses).add(1),
        )
        .filter(invite_code::Column::Id.eq(id))
        .filter(Expr::col(invite_code::Column::Uses).lt(Expr::col(invite_code::Column::MaxUses)))
        .exec(db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(result.rows_affected > 0)
}
