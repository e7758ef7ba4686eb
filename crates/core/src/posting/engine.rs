//! Posting engine building balanced ledger entries per transaction type.
//!
//! The engine is a pure function from a typed transaction draft to a set of
//! balanced posting lines. Persistence, balance tracking, and payment
//! application live elsewhere; the engine only decides which accounts are
//! debited and credited for a given intent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{round2, AccountId};

use super::error::PostingError;
use super::tax::distribute_tax;
use super::types::{EntryType, PostingLine, TransactionDraft, TransactionType};
use super::validation::validate_lines;

/// A chart-of-accounts role the posting engine must be able to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// Accounts receivable control account.
    AccountsReceivable,
    /// Accounts payable control account.
    AccountsPayable,
    /// Holding account for funds received but not yet deposited.
    UndepositedFunds,
}

impl AccountRole {
    /// Returns the snake_case name used for storage and display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccountsReceivable => "accounts_receivable",
            Self::AccountsPayable => "accounts_payable",
            Self::UndepositedFunds => "undeposited_funds",
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accounts_receivable" => Ok(Self::AccountsReceivable),
            "accounts_payable" => Ok(Self::AccountsPayable),
            "undeposited_funds" => Ok(Self::UndepositedFunds),
            other => Err(format!("unknown account role: {other}")),
        }
    }
}

/// Resolved chart-of-accounts roles for a company.
///
/// Each field is the account currently configured for that role, if any.
/// The posting engine fails with a configuration error when it needs a role
/// that is not configured.
#[derive(Debug, Clone, Default)]
pub struct AccountResolver {
    /// Accounts receivable control account.
    pub accounts_receivable: Option<AccountId>,
    /// Accounts payable control account.
    pub accounts_payable: Option<AccountId>,
    /// Undeposited funds holding account.
    pub undeposited_funds: Option<AccountId>,
}

impl AccountResolver {
    /// Resolves a role, failing when it is not configured.
    ///
    /// # Errors
    ///
    /// Returns `MissingAccountRole` when no account is configured.
    pub fn require(&self, role: AccountRole) -> Result<AccountId, PostingError> {
        let configured = match role {
            AccountRole::AccountsReceivable => self.accounts_receivable,
            AccountRole::AccountsPayable => self.accounts_payable,
            AccountRole::UndepositedFunds => self.undeposited_funds,
        };
        configured.ok_or(PostingError::MissingAccountRole { role })
    }
}

/// Stateless engine building balanced posting lines from a draft.
pub struct PostingEngine;

impl PostingEngine {
    /// Builds balanced ledger entries for a transaction draft.
    ///
    /// Branches by transaction type:
    /// - Invoice: debit AR for the total, credit revenue per line, credit
    ///   tax-payable per component.
    /// - Sales receipt: like an invoice, but the debit goes to the deposit
    ///   account since the sale settles immediately.
    /// - Customer/vendor credit: mirror of invoice/bill with sides swapped.
    /// - Bill, expense, cheque: debit expense per line, debit tax, credit
    ///   the payable or payment account for the total.
    /// - Payment: debit bank for cash received, debit AR per consumed
    ///   credit, credit AR for the amount applied.
    /// - Deposit: tied to a contact it credits AR (producing a usable
    ///   credit); untied it is a plain account-to-account transfer.
    /// - Journal entry, transfer: caller-supplied entries pass through.
    ///
    /// Every branch ends in double-entry validation, so the returned lines
    /// always satisfy total debits == total credits.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unbalanced or malformed drafts and a
    /// configuration error when a required account role or tax account is
    /// missing.
    pub fn build_entries(
        draft: &TransactionDraft,
        accounts: &AccountResolver,
    ) -> Result<Vec<PostingLine>, PostingError> {
        let lines = match draft.transaction_type {
            TransactionType::Invoice => {
                Self::require_contact(draft)?;
                Self::sale_lines(draft, accounts.require(AccountRole::AccountsReceivable)?)?
            }
            TransactionType::SalesReceipt => {
                let target = Self::deposit_account(draft, accounts)?;
                Self::sale_lines(draft, target)?
            }
            TransactionType::CustomerCredit => {
                Self::require_contact(draft)?;
                Self::flipped(Self::sale_lines(
                    draft,
                    accounts.require(AccountRole::AccountsReceivable)?,
                )?)
            }
            TransactionType::Bill => {
                Self::require_contact(draft)?;
                Self::purchase_lines(draft, accounts.require(AccountRole::AccountsPayable)?)?
            }
            TransactionType::Expense | TransactionType::Cheque => {
                let paid_from = draft
                    .paid_from
                    .ok_or(PostingError::MissingPaymentAccount(draft.transaction_type))?;
                Self::purchase_lines(draft, paid_from)?
            }
            TransactionType::VendorCredit => {
                Self::require_contact(draft)?;
                Self::flipped(Self::purchase_lines(
                    draft,
                    accounts.require(AccountRole::AccountsPayable)?,
                )?)
            }
            TransactionType::Payment => Self::payment_lines(draft, accounts)?,
            TransactionType::Deposit => Self::deposit_lines(draft, accounts)?,
            TransactionType::JournalEntry | TransactionType::Transfer => {
                draft.explicit_entries.clone()
            }
        };

        validate_lines(&lines)?;
        Ok(lines)
    }

    /// Invoice-shaped posting: debit the target for the total, credit each
    /// line's account, credit tax components.
    fn sale_lines(
        draft: &TransactionDraft,
        debit_target: AccountId,
    ) -> Result<Vec<PostingLine>, PostingError> {
        let mut lines = vec![PostingLine::debit(debit_target, round2(draft.amount))];
        Self::push_item_lines(draft, EntryType::Credit, &mut lines)?;
        Self::push_tax_lines(draft, EntryType::Credit, &mut lines)?;
        Ok(lines)
    }

    /// Bill-shaped posting: debit each line's account, debit tax components,
    /// credit the payable or payment account for the total.
    fn purchase_lines(
        draft: &TransactionDraft,
        credit_target: AccountId,
    ) -> Result<Vec<PostingLine>, PostingError> {
        let mut lines = Vec::with_capacity(draft.lines.len() + 2);
        Self::push_item_lines(draft, EntryType::Debit, &mut lines)?;
        Self::push_tax_lines(draft, EntryType::Debit, &mut lines)?;
        lines.push(PostingLine::credit(credit_target, round2(draft.amount)));
        Ok(lines)
    }

    /// Payment posting. The draft amount is the total applied to invoices;
    /// the cash received is the amount minus any consumed credits, which
    /// appear as negative line items tagging the source credit.
    fn payment_lines(
        draft: &TransactionDraft,
        accounts: &AccountResolver,
    ) -> Result<Vec<PostingLine>, PostingError> {
        Self::require_contact(draft)?;
        let receivable = accounts.require(AccountRole::AccountsReceivable)?;

        let applied = round2(draft.amount);
        let consumed = round2(draft.consumed_credit_total());
        let cash = applied - consumed;
        if cash < Decimal::ZERO {
            return Err(PostingError::InvalidAmount);
        }

        let mut lines = Vec::new();
        if cash > Decimal::ZERO {
            let bank = match draft.deposit_to {
                Some(account) => account,
                None => accounts.require(AccountRole::UndepositedFunds)?,
            };
            lines.push(PostingLine::debit(bank, cash));
        }
        for item in draft.lines.iter().filter(|l| l.is_credit_consumption()) {
            let mut leg = PostingLine::debit(receivable, round2(-item.amount));
            leg.memo.clone_from(&item.description);
            lines.push(leg);
        }
        lines.push(PostingLine::credit(receivable, applied));
        Ok(lines)
    }

    /// Deposit posting. A contact-tied deposit credits AR, producing a
    /// credit that can later fund invoices; an untied deposit moves money
    /// between accounts using its line items.
    fn deposit_lines(
        draft: &TransactionDraft,
        accounts: &AccountResolver,
    ) -> Result<Vec<PostingLine>, PostingError> {
        let bank = Self::deposit_account(draft, accounts)?;
        let total = round2(draft.amount);
        let mut lines = vec![PostingLine::debit(bank, total)];

        if draft.contact_id.is_some() {
            lines.push(PostingLine::credit(
                accounts.require(AccountRole::AccountsReceivable)?,
                total,
            ));
        } else {
            Self::push_item_lines(draft, EntryType::Credit, &mut lines)?;
        }
        Ok(lines)
    }

    /// One leg per positive line item against that line's account.
    fn push_item_lines(
        draft: &TransactionDraft,
        entry_type: EntryType,
        lines: &mut Vec<PostingLine>,
    ) -> Result<(), PostingError> {
        for (index, item) in draft.lines.iter().enumerate() {
            if item.amount <= Decimal::ZERO {
                continue;
            }
            let account_id = item
                .account_id
                .ok_or(PostingError::MissingLineAccount { index })?;
            let mut leg = PostingLine {
                account_id,
                entry_type,
                amount: round2(item.amount),
                memo: None,
            };
            leg.memo.clone_from(&item.description);
            lines.push(leg);
        }
        Ok(())
    }

    /// One leg per tax component, distributed over the subtotal.
    fn push_tax_lines(
        draft: &TransactionDraft,
        entry_type: EntryType,
        lines: &mut Vec<PostingLine>,
    ) -> Result<(), PostingError> {
        let Some(tax) = &draft.tax else {
            return Ok(());
        };
        for share in distribute_tax(draft.sub_total, tax)? {
            if share.amount == Decimal::ZERO {
                continue;
            }
            lines.push(PostingLine {
                account_id: share.account_id,
                entry_type,
                amount: share.amount,
                memo: None,
            });
        }
        Ok(())
    }

    /// Swaps debit and credit on every leg.
    fn flipped(lines: Vec<PostingLine>) -> Vec<PostingLine> {
        lines
            .into_iter()
            .map(|line| PostingLine {
                entry_type: match line.entry_type {
                    EntryType::Debit => EntryType::Credit,
                    EntryType::Credit => EntryType::Debit,
                },
                ..line
            })
            .collect()
    }

    fn deposit_account(
        draft: &TransactionDraft,
        accounts: &AccountResolver,
    ) -> Result<AccountId, PostingError> {
        match draft.deposit_to {
            Some(account) => Ok(account),
            None => accounts
                .require(AccountRole::UndepositedFunds)
                .map_err(|_| PostingError::MissingPaymentAccount(draft.transaction_type)),
        }
    }

    fn require_contact(draft: &TransactionDraft) -> Result<(), PostingError> {
        if draft.contact_id.is_none() {
            return Err(PostingError::MissingContact(draft.transaction_type));
        }
        Ok(())
    }
}
