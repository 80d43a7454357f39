//! Create `activity_log` table.
//!
//! Append-only: rows are written once by admin operations and never updated.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityLog::Table)
                    .if_not_exists()
                    .col(uuid(ActivityLog::Id).primary_key())
                    .col(uuid(ActivityLog::PerformedBy).not_null())
                    .col(
                        ColumnDef::new(ActivityLog::TargetUser)
                            .uuid()
                            .null(),
                    )
                    .col(string_len(ActivityLog::Action, 50).not_null())
                    .col(timestamp_with_time_zone(ActivityLog::Timestamp).not_null())
                    .col(ColumnDef::new(ActivityLog::Details).json_binary().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_log_performed_by")
                            .from(ActivityLog::Table, ActivityLog::PerformedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_log_target_user")
                            .from(ActivityLog::Table, ActivityLog::TargetUser)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ActivityLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ActivityLog { Table, Id, PerformedBy, TargetUser, Action, Timestamp, Details }

#[derive(DeriveIden)]
enum User { Table, Id }
