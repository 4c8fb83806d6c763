use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(
            m20240101_000001_create_metric_samples_table::Migration,
        )]
    }
}

mod m20240101_000001_create_metric_samples_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_metric_samples_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create metric_samples table aligned with entities::metric_sample Model
            manager
                .create_table(
                    Table::create()
                        .table(MetricSamples::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MetricSamples::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MetricSamples::MetricName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MetricSamples::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MetricSamples::Value).double().not_null())
                        .to_owned(),
                )
                .await?;

            // Series reads filter by name and time range
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_metric_samples_name_recorded_at")
                        .table(MetricSamples::Table)
                        .col(MetricSamples::MetricName)
                        .col(MetricSamples::RecordedAt)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MetricSamples::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum MetricSamples {
        Table,
        Id,
        MetricName,
        RecordedAt,
        Value,
    }
}
