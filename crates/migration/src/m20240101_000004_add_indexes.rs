use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Service: category filter for nearby search
        manager
            .create_index(
                Index::create()
                    .name("idx_service_category")
                    .table(Service::Table)
                    .col(Service::Category)
                    .to_owned(),
            )
            .await?;

        // Service: composite (latitude, longitude) for the bounding-box prefilter
        manager
            .create_index(
                Index::create()
                    .name("idx_service_lat_lng")
                    .table(Service::Table)
                    .col(Service::Latitude)
                    .col(Service::Longitude)
                    .to_owned(),
            )
            .await?;

        // ActivityLog: listing is always timestamp-descending
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_log_timestamp")
                    .table(ActivityLog::Table)
                    .col(ActivityLog::Timestamp)
                    .to_owned(),
            )
            .await?;

        // User: listing is always date_joined-descending
        manager
            .create_index(
                Index::create()
                    .name("idx_user_date_joined")
                    .table(User::Table)
                    .col(User::DateJoined)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_index(Index::drop().name("idx_service_category").table(Service::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_service_lat_lng").table(Service::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_activity_log_timestamp").table(ActivityLog::Table).to_owned()).await?;
        manager.drop_index(Index::drop().name("idx_user_date_joined").table(User::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Service { Table, Category, Latitude, Longitude }

#[derive(DeriveIden)]
enum ActivityLog { Table, Timestamp }

#[derive(DeriveIden)]
enum User { Table, DateJoined }
