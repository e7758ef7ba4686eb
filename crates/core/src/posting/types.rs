//! Posting domain types for transaction creation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, ContactId, ProductId, SalesTaxId, TransactionId};

use super::tax::TaxBreakdown;

/// Entry type: either Debit or Credit.
///
/// In double-entry bookkeeping:
/// - Debits increase asset/expense accounts, decrease liability/equity/revenue accounts
/// - Credits decrease asset/expense accounts, increase liability/equity/revenue accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry.
    Debit,
    /// Credit entry.
    Credit,
}

/// Transaction type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Sales invoice (obligation owed by a customer).
    Invoice,
    /// Vendor bill (obligation owed to a vendor).
    Bill,
    /// Expense paid directly from an account.
    Expense,
    /// Cheque written against a bank account.
    Cheque,
    /// Money deposited into a bank account.
    Deposit,
    /// Payment received from a customer.
    Payment,
    /// General journal entry.
    JournalEntry,
    /// Transfer between accounts.
    Transfer,
    /// Sale settled immediately.
    SalesReceipt,
    /// Credit memo owed back to a customer.
    CustomerCredit,
    /// Credit memo owed back by a vendor.
    VendorCredit,
}

impl TransactionType {
    /// Returns true for types that accumulate and reduce an owed balance.
    #[must_use]
    pub fn is_obligation(self) -> bool {
        matches!(self, Self::Invoice | Self::Bill)
    }

    /// Returns true for types that can supply value consumable by obligations.
    #[must_use]
    pub fn is_funding(self) -> bool {
        matches!(
            self,
            Self::Payment | Self::Deposit | Self::Cheque | Self::CustomerCredit | Self::VendorCredit
        )
    }

    /// Returns the snake_case name used for storage and display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Bill => "bill",
            Self::Expense => "expense",
            Self::Cheque => "cheque",
            Self::Deposit => "deposit",
            Self::Payment => "payment",
            Self::JournalEntry => "journal_entry",
            Self::Transfer => "transfer",
            Self::SalesReceipt => "sales_receipt",
            Self::CustomerCredit => "customer_credit",
            Self::VendorCredit => "vendor_credit",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice" => Ok(Self::Invoice),
            "bill" => Ok(Self::Bill),
            "expense" => Ok(Self::Expense),
            "cheque" => Ok(Self::Cheque),
            "deposit" => Ok(Self::Deposit),
            "payment" => Ok(Self::Payment),
            "journal_entry" => Ok(Self::JournalEntry),
            "transfer" => Ok(Self::Transfer),
            "sales_receipt" => Ok(Self::SalesReceipt),
            "customer_credit" => Ok(Self::CustomerCredit),
            "vendor_credit" => Ok(Self::VendorCredit),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Transaction settlement status.
///
/// `balance` and `status` are always derivable from the transaction amount
/// minus its net allocations; these values are what recalculation writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Obligation with its full balance outstanding.
    Open,
    /// Obligation partially settled.
    Partial,
    /// Obligation fully settled.
    Paid,
    /// Transaction fully consumed or settled at creation.
    Completed,
    /// Funding transaction with unconsumed value available.
    UnappliedCredit,
}

impl TransactionStatus {
    /// Returns true if the transaction still carries consumable value.
    #[must_use]
    pub fn has_open_value(self) -> bool {
        matches!(self, Self::Open | Self::Partial | Self::UnappliedCredit)
    }

    /// Returns the snake_case name used for storage and display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Completed => "completed",
            Self::UnappliedCredit => "unapplied_credit",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            "completed" => Ok(Self::Completed),
            "unapplied_credit" => Ok(Self::UnappliedCredit),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// A single balanced-posting leg against a chart-of-accounts account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLine {
    /// The account to post to.
    pub account_id: AccountId,
    /// Whether this is a debit or credit entry.
    pub entry_type: EntryType,
    /// The posted amount (always positive).
    pub amount: Decimal,
    /// Optional memo for this leg.
    pub memo: Option<String>,
}

impl PostingLine {
    /// Creates a debit leg.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            entry_type: EntryType::Debit,
            amount,
            memo: None,
        }
    }

    /// Creates a credit leg.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            entry_type: EntryType::Credit,
            amount,
            memo: None,
        }
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Debit => self.amount,
            EntryType::Credit => -self.amount,
        }
    }
}

/// A single line item on a transaction draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemLine {
    /// Line description.
    pub description: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Line amount (quantity * unit price, or explicit). Negative amounts
    /// tag a consumed credit via `source_transaction_id`.
    pub amount: Decimal,
    /// The revenue/expense account this line posts against.
    pub account_id: Option<AccountId>,
    /// Sales tax applied to this line.
    pub sales_tax_id: Option<SalesTaxId>,
    /// Product sold or purchased.
    pub product_id: Option<ProductId>,
    /// For negative lines: the credit transaction this line consumes.
    pub source_transaction_id: Option<TransactionId>,
}

impl ItemLine {
    /// Returns true if this line records consumption of an existing credit.
    #[must_use]
    pub fn is_credit_consumption(&self) -> bool {
        self.amount < Decimal::ZERO && self.source_transaction_id.is_some()
    }
}

/// Input for creating a new transaction.
///
/// The posting engine turns a draft into balanced ledger entries; the
/// transaction store persists header, line items, and entries atomically.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    /// The type of transaction.
    pub transaction_type: TransactionType,
    /// The transaction date.
    pub date: NaiveDate,
    /// Optional reference number (unique per company and type).
    pub reference: Option<String>,
    /// The customer or vendor, when the type requires one.
    pub contact_id: Option<ContactId>,
    /// Total amount of the transaction.
    pub amount: Decimal,
    /// Subtotal before tax.
    pub sub_total: Decimal,
    /// Tax charged, with its component breakdown.
    pub tax: Option<TaxBreakdown>,
    /// Line items.
    pub lines: Vec<ItemLine>,
    /// Bank or clearing account receiving funds (payments, deposits,
    /// sales receipts).
    pub deposit_to: Option<AccountId>,
    /// Bank account funds are paid from (expenses, cheques).
    pub paid_from: Option<AccountId>,
    /// Caller-supplied entries for journal entries and transfers.
    pub explicit_entries: Vec<PostingLine>,
    /// Free-form description.
    pub description: Option<String>,
    /// The transaction this one is a system-generated byproduct of (e.g.
    /// the deposit a payment creates). Such rows are deleted through their
    /// parent.
    pub source_transaction_id: Option<TransactionId>,
}

impl TransactionDraft {
    /// Sum of negative line amounts tagging consumed credits (as a positive
    /// number).
    #[must_use]
    pub fn consumed_credit_total(&self) -> Decimal {
        self.lines
            .iter()
            .filter(|l| l.is_credit_consumption())
            .map(|l| -l.amount)
            .sum()
    }

    /// Sum of positive line amounts.
    #[must_use]
    pub fn positive_line_total(&self) -> Decimal {
        self.lines
            .iter()
            .filter(|l| l.amount > Decimal::ZERO)
            .map(|l| l.amount)
            .sum()
    }
}
