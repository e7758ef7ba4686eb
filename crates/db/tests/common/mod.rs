//! Shared fixture for repository integration tests.
//!
//! Tests run against in-memory SQLite through the portable migration; the
//! schema is identical to the Postgres deployment target.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tally_core::posting::{
    AccountResolver, ItemLine, PostingEngine, TransactionDraft, TransactionType,
};
use tally_db::entities::accounts::AccountKind;
use tally_db::entities::contacts::ContactKind;
use tally_db::entities::transactions;
use tally_db::migration::Migrator;
use tally_db::repositories::{
    AccountRepository, ContactRepository, CreateAccountInput, CreateContactInput,
    PaymentRepository, RecalculationService, ReversalEngine, SalesTaxRepository,
    TransactionRepository,
};
use tally_shared::types::{AccountId, CompanyId, ContactId, TransactionId};

/// A company with its chart of accounts and contacts set up.
pub struct Fixture {
    pub db: DatabaseConnection,
    pub company: CompanyId,
    pub receivable: AccountId,
    pub payable: AccountId,
    pub bank: AccountId,
    pub undeposited: AccountId,
    pub revenue: AccountId,
    pub expense: AccountId,
    pub gst_payable: AccountId,
    pub pst_payable: AccountId,
    pub customer: ContactId,
    pub vendor: ContactId,
    pub resolver: AccountResolver,
}

pub async fn setup() -> Fixture {
    let db = tally_db::connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None).await.expect("migration failed");

    let company = CompanyId::new();
    let accounts = AccountRepository::new(db.clone());
    let contacts = ContactRepository::new(db.clone());

    let create = |code: &str, name: &str, kind: AccountKind, role| CreateAccountInput {
        company_id: company,
        code: code.to_string(),
        name: name.to_string(),
        kind,
        system_role: role,
    };

    use tally_core::posting::AccountRole;
    let receivable = accounts
        .create_account(create(
            "1200",
            "Accounts Receivable",
            AccountKind::Asset,
            Some(AccountRole::AccountsReceivable),
        ))
        .await
        .unwrap();
    let payable = accounts
        .create_account(create(
            "2100",
            "Accounts Payable",
            AccountKind::Liability,
            Some(AccountRole::AccountsPayable),
        ))
        .await
        .unwrap();
    let undeposited = accounts
        .create_account(create(
            "1100",
            "Undeposited Funds",
            AccountKind::Asset,
            Some(AccountRole::UndepositedFunds),
        ))
        .await
        .unwrap();
    let bank = accounts
        .create_account(create("1000", "Chequing", AccountKind::Asset, None))
        .await
        .unwrap();
    let revenue = accounts
        .create_account(create("4000", "Sales", AccountKind::Revenue, None))
        .await
        .unwrap();
    let expense = accounts
        .create_account(create("5000", "Office Supplies", AccountKind::Expense, None))
        .await
        .unwrap();
    let gst_payable = accounts
        .create_account(create("2310", "GST Payable", AccountKind::Liability, None))
        .await
        .unwrap();
    let pst_payable = accounts
        .create_account(create("2320", "PST Payable", AccountKind::Liability, None))
        .await
        .unwrap();

    let customer = contacts
        .create_contact(CreateContactInput {
            company_id: company,
            name: "Acme Ltd".to_string(),
            kind: ContactKind::Customer,
        })
        .await
        .unwrap();
    let vendor = contacts
        .create_contact(CreateContactInput {
            company_id: company,
            name: "Paper Co".to_string(),
            kind: ContactKind::Vendor,
        })
        .await
        .unwrap();

    let resolver = accounts.resolver_for(company).await.unwrap();

    Fixture {
        db,
        company,
        receivable: AccountId::from_uuid(receivable.id),
        payable: AccountId::from_uuid(payable.id),
        bank: AccountId::from_uuid(bank.id),
        undeposited: AccountId::from_uuid(undeposited.id),
        revenue: AccountId::from_uuid(revenue.id),
        expense: AccountId::from_uuid(expense.id),
        gst_payable: AccountId::from_uuid(gst_payable.id),
        pst_payable: AccountId::from_uuid(pst_payable.id),
        customer,
        vendor,
        resolver,
    }
}

impl Fixture {
    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.db.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.db.clone())
    }

    pub fn recalculation(&self) -> RecalculationService {
        RecalculationService::new(self.db.clone())
    }

    pub fn reversal(&self) -> ReversalEngine {
        ReversalEngine::new(self.db.clone())
    }

    pub fn sales_taxes(&self) -> SalesTaxRepository {
        SalesTaxRepository::new(self.db.clone())
    }

    pub fn draft(&self, transaction_type: TransactionType, amount: Decimal) -> TransactionDraft {
        TransactionDraft {
            transaction_type,
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            reference: None,
            contact_id: Some(self.customer),
            amount,
            sub_total: amount,
            tax: None,
            lines: vec![],
            deposit_to: None,
            paid_from: None,
            explicit_entries: vec![],
            description: None,
            source_transaction_id: None,
        }
    }

    pub fn item(amount: Decimal, account_id: Option<AccountId>) -> ItemLine {
        ItemLine {
            description: None,
            quantity: Decimal::ONE,
            unit_price: amount,
            amount,
            account_id,
            sales_tax_id: None,
            product_id: None,
            source_transaction_id: None,
        }
    }

    /// Builds entries with the posting engine and persists the draft.
    pub async fn post(&self, draft: &TransactionDraft) -> transactions::Model {
        let entries = PostingEngine::build_entries(draft, &self.resolver)
            .expect("posting engine rejected draft");
        self.transactions()
            .create_transaction(self.company, draft, &entries)
            .await
            .expect("failed to persist transaction")
    }

    /// An open invoice for the customer.
    pub async fn create_invoice(&self, amount: Decimal) -> transactions::Model {
        let mut draft = self.draft(TransactionType::Invoice, amount);
        draft.lines = vec![Self::item(amount, Some(self.revenue))];
        self.post(&draft).await
    }

    /// An open bill from the vendor.
    pub async fn create_bill(&self, amount: Decimal) -> transactions::Model {
        let mut draft = self.draft(TransactionType::Bill, amount);
        draft.contact_id = Some(self.vendor);
        draft.lines = vec![Self::item(amount, Some(self.expense))];
        self.post(&draft).await
    }

    /// A customer payment; `consumed` lists credits it draws on as
    /// negative line items.
    pub async fn create_payment(
        &self,
        amount: Decimal,
        consumed: &[(TransactionId, Decimal)],
    ) -> transactions::Model {
        let mut draft = self.draft(TransactionType::Payment, amount);
        draft.deposit_to = Some(self.bank);
        draft.lines = consumed
            .iter()
            .map(|&(credit_id, value)| ItemLine {
                source_transaction_id: Some(credit_id),
                ..Self::item(-value, None)
            })
            .collect();
        self.post(&draft).await
    }

    /// A customer deposit producing a usable credit (negative balance).
    pub async fn create_deposit_credit(&self, amount: Decimal) -> transactions::Model {
        let mut draft = self.draft(TransactionType::Deposit, amount);
        draft.deposit_to = Some(self.bank);
        self.post(&draft).await
    }

    /// A vendor cheque producing an unapplied credit (positive balance).
    pub async fn create_cheque(&self, amount: Decimal) -> transactions::Model {
        let mut draft = self.draft(TransactionType::Cheque, amount);
        draft.contact_id = Some(self.vendor);
        draft.paid_from = Some(self.bank);
        draft.lines = vec![Self::item(amount, Some(self.payable))];
        self.post(&draft).await
    }

    /// Reloads a transaction header.
    pub async fn reload(&self, id: TransactionId) -> transactions::Model {
        self.transactions()
            .get_transaction(self.company, id)
            .await
            .expect("transaction should exist")
    }
}

/// The id of a persisted transaction as a typed id.
pub fn id_of(model: &transactions::Model) -> TransactionId {
    TransactionId::from_uuid(model.id)
}
