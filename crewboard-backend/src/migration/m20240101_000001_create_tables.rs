use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create project table
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Project::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Project::Title).string().not_null())
                    .col(ColumnDef::new(Project::UserId).uuid().not_null())
                    .col(ColumnDef::new(Project::FileUrl).string())
                    .col(
                        ColumnDef::new(Project::Deadline)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Project::SoftSkill).text().not_null())
                    .col(ColumnDef::new(Project::ImportantQuestion).text().not_null())
                    .col(ColumnDef::new(Project::TechStack).json().not_null())
                    .col(ColumnDef::new(Project::Description).text().not_null())
                    .col(ColumnDef::new(Project::Position).string().not_null())
                    .col(ColumnDef::new(Project::Recruitment).string_len(15).not_null())
                    .col(
                        ColumnDef::new(Project::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Project::LastModified).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Project::ViewCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_user_id")
                    .table(Project::Table)
                    .col(Project::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Create recruit table
        manager
            .create_table(
                Table::create()
                    .table(Recruit::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Recruit::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Recruit::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Recruit::Position).string().not_null())
                    .col(ColumnDef::new(Recruit::CurrentCount).integer().not_null())
                    .col(ColumnDef::new(Recruit::TargetCount).integer().not_null())
                    .col(ColumnDef::new(Recruit::SortOrder).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recruit_project")
                            .from(Recruit::Table, Recruit::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create favorite table
        manager
            .create_table(
                Table::create()
                    .table(Favorite::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Favorite::UserId).uuid().not_null())
                    .col(ColumnDef::new(Favorite::ProjectId).uuid().not_null())
                    .col(
                        ColumnDef::new(Favorite::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(Favorite::UserId)
                            .col(Favorite::ProjectId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorite_project")
                            .from(Favorite::Table, Favorite::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create verification code table
        manager
            .create_table(
                Table::create()
                    .table(VerificationCode::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationCode::Email)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VerificationCode::Code).string().not_null())
                    .col(
                        ColumnDef::new(VerificationCode::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VerificationCode::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Favorite::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recruit::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(super) enum Project {
    Table,
    Id,
    Title,
    UserId,
    FileUrl,
    Deadline,
    SoftSkill,
    ImportantQuestion,
    TechStack,
    Description,
    Position,
    Recruitment,
    CreatedAt,
    LastModified,
    ViewCount,
}

#[derive(DeriveIden)]
enum Recruit {
    Table,
    Id,
    ProjectId,
    Position,
    CurrentCount,
    TargetCount,
    SortOrder,
}

#[derive(DeriveIden)]
enum Favorite {
    Table,
    UserId,
    ProjectId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VerificationCode {
    Table,
    Email,
    Code,
    CreatedAt,
}
