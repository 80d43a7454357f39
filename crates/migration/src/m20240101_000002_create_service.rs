//! Create `service` table with FK to `user`.
//!
//! Coordinates are plain WGS-84 doubles; distance math lives in the
//! application layer, so no GIS extension is required.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Service::Table)
                    .if_not_exists()
                    .col(uuid(Service::Id).primary_key())
                    .col(string_len(Service::Name, 100).not_null())
                    .col(string_len(Service::Category, 100).not_null())
                    .col(double(Service::Latitude).not_null())
                    .col(double(Service::Longitude).not_null())
                    .col(double(Service::Rating).not_null().default(0.0))
                    .col(ColumnDef::new(Service::Metadata).json_binary().null())
                    .col(uuid(Service::CreatedBy).not_null())
                    .col(timestamp_with_time_zone(Service::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Service::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_created_by")
                            .from(Service::Table, Service::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Service::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Service { Table, Id, Name, Category, Latitude, Longitude, Rating, Metadata, CreatedBy, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }
