use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Accounts::Code).string().not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountType).string().not_null())
                    .col(ColumnDef::new(Accounts::SystemRole).string())
                    .col(
                        ColumnDef::new(Accounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-company-code")
                    .table(Accounts::Table)
                    .col(Accounts::CompanyId)
                    .col(Accounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contacts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contacts::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(Contacts::Name).string().not_null())
                    .col(ColumnDef::new(Contacts::ContactKind).string().not_null())
                    .col(
                        ColumnDef::new(Contacts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Contacts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Contacts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SalesTaxes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesTaxes::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SalesTaxes::CompanyId).uuid().not_null())
                    .col(ColumnDef::new(SalesTaxes::Name).string().not_null())
                    .col(
                        ColumnDef::new(SalesTaxes::RateFixed4)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SalesTaxes::AccountId).uuid())
                    .col(ColumnDef::new(SalesTaxes::ParentTaxId).uuid())
                    .col(
                        ColumnDef::new(SalesTaxes::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(SalesTaxes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SalesTaxes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales_taxes-account_id")
                            .from(SalesTaxes::Table, SalesTaxes::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales_taxes-parent_tax_id")
                            .from(SalesTaxes::Table, SalesTaxes::ParentTaxId)
                            .to(SalesTaxes::Table, SalesTaxes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales_taxes-parent")
                    .table(SalesTaxes::Table)
                    .col(SalesTaxes::ParentTaxId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::CompanyId).uuid().not_null())
                    .col(
                        ColumnDef::new(Transactions::TransactionType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Reference).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::TransactionDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::ContactId).uuid())
                    .col(
                        ColumnDef::new(Transactions::AmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::SubTotalCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Transactions::TaxAmountCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Transactions::BalanceCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(ColumnDef::new(Transactions::SourceTransactionId).uuid())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-contact_id")
                            .from(Transactions::Table, Transactions::ContactId)
                            .to(Contacts::Table, Contacts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-company-type-reference")
                    .table(Transactions::Table)
                    .col(Transactions::CompanyId)
                    .col(Transactions::TransactionType)
                    .col(Transactions::Reference)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-company-type-status")
                    .table(Transactions::Table)
                    .col(Transactions::CompanyId)
                    .col(Transactions::TransactionType)
                    .col(Transactions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LineItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LineItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LineItems::TransactionId).uuid().not_null())
                    .col(ColumnDef::new(LineItems::Description).string())
                    .col(
                        ColumnDef::new(LineItems::QuantityFixed4)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LineItems::UnitPriceCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LineItems::AmountCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LineItems::AccountId).uuid())
                    .col(ColumnDef::new(LineItems::SalesTaxId).uuid())
                    .col(ColumnDef::new(LineItems::ProductId).uuid())
                    .col(ColumnDef::new(LineItems::SourceTransactionId).uuid())
                    .col(
                        ColumnDef::new(LineItems::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LineItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-line_items-transaction_id")
                            .from(LineItems::Table, LineItems::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-line_items-account_id")
                            .from(LineItems::Table, LineItems::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-line_items-transaction")
                    .table(LineItems::Table)
                    .col(LineItems::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::TransactionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LedgerEntries::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::DebitCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::CreditCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(LedgerEntries::Memo).string())
                    .col(
                        ColumnDef::new(LedgerEntries::Position)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-transaction_id")
                            .from(LedgerEntries::Table, LedgerEntries::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_entries-account_id")
                            .from(LedgerEntries::Table, LedgerEntries::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-transaction")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_entries-account")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::AccountId)
                    .to_owned(),
            )
            .await?;

        // No foreign keys: either side may be deleted before the row is
        // cleaned up during reversal.
        manager
            .create_table(
                Table::create()
                    .table(PaymentApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentApplications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PaymentApplications::CompanyId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentApplications::PaymentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentApplications::InvoiceId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentApplications::AmountAppliedCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentApplications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payment_applications-payment")
                    .table(PaymentApplications::Table)
                    .col(PaymentApplications::PaymentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payment_applications-invoice")
                    .table(PaymentApplications::Table)
                    .col(PaymentApplications::InvoiceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentApplications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LineItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesTaxes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contacts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    CompanyId,
    Code,
    Name,
    AccountType,
    SystemRole,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Contacts {
    Table,
    Id,
    CompanyId,
    Name,
    ContactKind,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SalesTaxes {
    Table,
    Id,
    CompanyId,
    Name,
    RateFixed4,
    AccountId,
    ParentTaxId,
    Position,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    CompanyId,
    TransactionType,
    Reference,
    TransactionDate,
    ContactId,
    AmountCents,
    SubTotalCents,
    TaxAmountCents,
    BalanceCents,
    Status,
    Description,
    SourceTransactionId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum LineItems {
    Table,
    Id,
    TransactionId,
    Description,
    QuantityFixed4,
    UnitPriceCents,
    AmountCents,
    AccountId,
    SalesTaxId,
    ProductId,
    SourceTransactionId,
    Position,
    CreatedAt,
}

#[derive(Iden)]
enum LedgerEntries {
    Table,
    Id,
    TransactionId,
    AccountId,
    DebitCents,
    CreditCents,
    Memo,
    Position,
    CreatedAt,
}

#[derive(Iden)]
enum PaymentApplications {
    Table,
    Id,
    CompanyId,
    PaymentId,
    InvoiceId,
    AmountAppliedCents,
    CreatedAt,
}
