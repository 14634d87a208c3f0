use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(
            Table::create()
                .table(Users::Table)
                .if_not_exists()
                .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Users::Name).string().not_null())
                .col(ColumnDef::new(Users::Role).string_len(20).not_null())
                .col(
                    ColumnDef::new(Users::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .extra("DEFAULT NOW()".to_string())
                )
                .to_owned()
        ).await?;

        // A vendor row shares its id with the owning user
        manager.create_table(
            Table::create()
                .table(Vendors::Table)
                .if_not_exists()
                .col(ColumnDef::new(Vendors::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Vendors::Name).string().not_null())
                .col(
                    ColumnDef::new(Vendors::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .extra("DEFAULT NOW()".to_string())
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_vendor_user")
                        .from(Vendors::Table, Vendors::Id)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .to_owned()
        ).await?;

        manager.create_table(
            Table::create()
                .table(Staff::Table)
                .if_not_exists()
                .col(ColumnDef::new(Staff::Id).uuid().not_null().primary_key())
                .col(ColumnDef::new(Staff::UserId).uuid().not_null().unique_key())
                .col(ColumnDef::new(Staff::VendorId).uuid().null())
                .col(
                    ColumnDef::new(Staff::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null()
                        .extra("DEFAULT NOW()".to_string())
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_staff_user")
                        .from(Staff::Table, Staff::UserId)
                        .to(Users::Table, Users::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_staff_vendor")
                        .from(Staff::Table, Staff::VendorId)
                        .to(Vendors::Table, Vendors::Id)
                        .on_delete(ForeignKeyAction::SetNull)
                )
                .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Staff::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Vendors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Staff {
    Table,
    Id,
    UserId,
    VendorId,
    CreatedAt,
}
